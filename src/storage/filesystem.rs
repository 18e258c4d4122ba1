//! JSON snapshot file store
//!
//! The whole state lives in one JSON document. Writers take an exclusive
//! `fs2` lock on a sibling `.lock` file, re-read the document, apply the batch
//! and replace the document through a temporary file and rename.

use crate::core::directory::UserDirectory;
use crate::core::model::{User, Username};
use crate::core::service::ServiceError;
use crate::storage::{ChangeBatch, CommitMode, NamespaceStore, Snapshot};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Releases the file lock when dropped
struct LockGuard(File);

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.unlock() {
            warn!("Failed to release file lock: {}", e);
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock_timeout: Duration::from_secs(30),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add or replace a user account in the snapshot file
    pub async fn upsert_user(&self, user: User) -> Result<(), ServiceError> {
        let store = self.clone();
        run_blocking(move || {
            store.with_locked_snapshot(|snapshot| {
                match snapshot
                    .users
                    .iter_mut()
                    .find(|existing| existing.username == user.username)
                {
                    Some(existing) => *existing = user,
                    None => snapshot.users.push(user),
                }
                Ok(())
            })
        })
        .await
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn acquire_lock(&self) -> Result<LockGuard, ServiceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?;

        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(LockGuard(file)),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() >= self.lock_timeout {
                        return Err(ServiceError::Storage(format!(
                            "Timeout waiting for lock on {} (exceeded {} seconds)",
                            self.path.display(),
                            self.lock_timeout.as_secs()
                        )));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => return Err(ServiceError::Io(e)),
            }
        }
    }

    fn read_snapshot(&self) -> Result<Snapshot, ServiceError> {
        if !self.path.exists() {
            return Ok(Snapshot::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| {
            ServiceError::Serialization(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), ServiceError> {
        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|e| ServiceError::Serialization(e.to_string()))?;
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            ServiceError::Io(e)
        })
    }

    fn with_locked_snapshot<T, F>(&self, update: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut Snapshot) -> Result<T, ServiceError>,
    {
        let _lock = self.acquire_lock()?;
        let mut snapshot = self.read_snapshot()?;
        let result = update(&mut snapshot)?;
        self.write_snapshot(&snapshot)?;
        Ok(result)
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, ServiceError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ServiceError::Storage(format!("Store task failed: {}", e)))?
}

#[async_trait]
impl NamespaceStore for JsonFileStore {
    async fn load_snapshot(&self) -> Result<Snapshot, ServiceError> {
        let store = self.clone();
        let snapshot = run_blocking(move || store.read_snapshot()).await?;
        debug!(
            "Read snapshot version {} from {}",
            snapshot.version,
            self.path.display()
        );
        Ok(snapshot)
    }

    async fn save_changes(
        &self,
        batch: ChangeBatch,
        mode: CommitMode,
    ) -> Result<u64, ServiceError> {
        let store = self.clone();
        let version = run_blocking(move || {
            store.with_locked_snapshot(|snapshot| snapshot.apply(&batch, mode))
        })
        .await?;
        info!("Wrote snapshot version {} to {}", version, self.path.display());
        Ok(version)
    }
}

#[async_trait]
impl UserDirectory for JsonFileStore {
    async fn find_user(&self, username: &str) -> Result<Option<User>, ServiceError> {
        let username = Username::new(username)?;
        let snapshot = self.load_snapshot().await?;
        Ok(snapshot
            .users
            .into_iter()
            .find(|user| user.username == username))
    }
}
