//! In-memory store, used by tests and embedders that persist elsewhere

use crate::core::service::ServiceError;
use crate::storage::{ChangeBatch, CommitMode, NamespaceStore, Snapshot};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Record of one successful commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub mode: CommitMode,
    pub changes: usize,
    pub version: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshot: Arc<RwLock<Snapshot>>,
    commits: Arc<RwLock<Vec<CommitRecord>>>,
}

impl InMemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            commits: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Copy of the stored state
    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    /// Successful commits, oldest first
    pub async fn commits(&self) -> Vec<CommitRecord> {
        self.commits.read().await.clone()
    }
}

#[async_trait]
impl NamespaceStore for InMemoryStore {
    async fn load_snapshot(&self) -> Result<Snapshot, ServiceError> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn save_changes(
        &self,
        batch: ChangeBatch,
        mode: CommitMode,
    ) -> Result<u64, ServiceError> {
        let mut snapshot = self.snapshot.write().await;
        let version = snapshot.apply(&batch, mode)?;
        debug!("Stored {} change(s) at version {}", batch.len(), version);

        self.commits.write().await.push(CommitRecord {
            mode,
            changes: batch.len(),
            version,
        });
        Ok(version)
    }
}
