//! Persistence collaborators for reserved namespace state
//!
//! The core never performs I/O. A [`NamespaceSession`](crate::core::session::NamespaceSession)
//! is built from a [`Snapshot`] and records every mutation as a [`Change`];
//! a [`NamespaceStore`] persists those changes when the caller commits.

use crate::core::model::{
    CuratedMembership, NamespacePrefix, PackageId, PackageRegistration, ReservedNamespace, User,
};
use crate::core::service::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub mod filesystem;
pub mod memory;

pub use filesystem::JsonFileStore;
pub use memory::InMemoryStore;

/// How a batch of changes is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// Apply entries one by one; entries that no longer apply are skipped
    #[default]
    Batch,
    /// Apply every entry or none of them
    Transaction,
}

/// A single persisted mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Change {
    UpsertNamespace(ReservedNamespace),
    DeleteNamespace { prefix: NamespacePrefix },
    SetVerified { package_id: PackageId, verified: bool },
    AddMembership(CuratedMembership),
    RemoveMembership(CuratedMembership),
}

/// Changes recorded by a session since the snapshot version it was loaded at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub base_version: u64,
    pub changes: Vec<Change>,
}

impl ChangeBatch {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

/// Persisted state handed to a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Incremented by every successful commit
    #[serde(default)]
    pub version: u64,

    #[serde(default)]
    pub namespaces: Vec<ReservedNamespace>,

    #[serde(default)]
    pub registrations: Vec<PackageRegistration>,

    #[serde(default)]
    pub memberships: Vec<CuratedMembership>,

    /// Accounts known to stores that also act as a user directory
    #[serde(default)]
    pub users: Vec<User>,
}

impl Snapshot {
    /// Apply a batch recorded against this snapshot's version
    ///
    /// Returns the new version. A batch built on an older version is rejected
    /// with [`ServiceError::Conflict`] so concurrent writers cannot overwrite
    /// each other.
    pub fn apply(&mut self, batch: &ChangeBatch, mode: CommitMode) -> Result<u64, ServiceError> {
        if batch.base_version != self.version {
            return Err(ServiceError::Conflict(format!(
                "Stored state is at version {} but changes were made against version {}",
                self.version, batch.base_version
            )));
        }

        match mode {
            CommitMode::Transaction => {
                let mut staged = self.clone();
                for change in &batch.changes {
                    staged.apply_change(change)?;
                }
                *self = staged;
            }
            CommitMode::Batch => {
                for change in &batch.changes {
                    if let Err(e) = self.apply_change(change) {
                        warn!("Skipping change that no longer applies: {}", e);
                    }
                }
            }
        }

        self.version += 1;
        Ok(self.version)
    }

    fn apply_change(&mut self, change: &Change) -> Result<(), ServiceError> {
        match change {
            Change::UpsertNamespace(namespace) => {
                match self
                    .namespaces
                    .iter_mut()
                    .find(|existing| existing.prefix == namespace.prefix)
                {
                    Some(existing) => *existing = namespace.clone(),
                    None => self.namespaces.push(namespace.clone()),
                }
                Ok(())
            }
            Change::DeleteNamespace { prefix } => {
                let before = self.namespaces.len();
                self.namespaces.retain(|existing| &existing.prefix != prefix);
                if self.namespaces.len() == before {
                    return Err(ServiceError::NotFound(format!(
                        "Reserved namespace '{}' is not stored",
                        prefix
                    )));
                }
                self.memberships.retain(|m| &m.prefix != prefix);
                Ok(())
            }
            Change::SetVerified {
                package_id,
                verified,
            } => {
                let registration = self
                    .registrations
                    .iter_mut()
                    .find(|r| &r.id == package_id)
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Package registration '{}' is not stored",
                            package_id
                        ))
                    })?;
                registration.verified = *verified;
                Ok(())
            }
            Change::AddMembership(membership) => {
                if !self
                    .namespaces
                    .iter()
                    .any(|ns| ns.prefix == membership.prefix)
                {
                    return Err(ServiceError::NotFound(format!(
                        "Reserved namespace '{}' is not stored",
                        membership.prefix
                    )));
                }
                if !self.memberships.contains(membership) {
                    self.memberships.push(membership.clone());
                }
                Ok(())
            }
            Change::RemoveMembership(membership) => {
                let before = self.memberships.len();
                self.memberships.retain(|m| m != membership);
                if self.memberships.len() == before {
                    return Err(ServiceError::NotFound(format!(
                        "'{}' is not a member of '{}'",
                        membership.package_id, membership.prefix
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Persistence / unit-of-work collaborator
#[async_trait]
pub trait NamespaceStore: Send + Sync {
    /// Load the current persisted state
    async fn load_snapshot(&self) -> Result<Snapshot, ServiceError>;

    /// Persist a batch of changes, returning the new stored version
    async fn save_changes(&self, batch: ChangeBatch, mode: CommitMode)
        -> Result<u64, ServiceError>;
}
