//! In-memory unit of work over reserved namespace state
//!
//! A session holds the three relations the engine reasons about (namespaces
//! with their owners, package registrations with their owners, and curated
//! memberships) plus every change made since it was loaded. Reads always see
//! pending changes; nothing is persisted until the caller commits.

use crate::core::model::{
    fold_case, CuratedMembership, PackageId, PackageRegistration, ReservedNamespace,
};
use crate::core::reconciler::VerifiedFlagReconciler;
use crate::core::registry::{NamespaceRegistry, NamespaceTable};
use crate::core::service::ServiceError;
use crate::storage::{Change, ChangeBatch, Snapshot};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Curated package ids keyed by case-folded namespace prefix
pub type MembershipTable = BTreeMap<String, BTreeSet<PackageId>>;

/// Session shared between the service facade and the lifecycle manager
pub type SharedSession = Arc<RwLock<NamespaceSession>>;

pub(crate) fn read_session(
    session: &SharedSession,
) -> Result<RwLockReadGuard<'_, NamespaceSession>, ServiceError> {
    session.read().map_err(|_| {
        ServiceError::Storage(
            "Session lock poisoned - another thread panicked while holding it".to_string(),
        )
    })
}

pub(crate) fn write_session(
    session: &SharedSession,
) -> Result<RwLockWriteGuard<'_, NamespaceSession>, ServiceError> {
    session.write().map_err(|_| {
        ServiceError::Storage(
            "Session lock poisoned - another thread panicked while holding it".to_string(),
        )
    })
}

#[derive(Debug, Default)]
pub struct NamespaceSession {
    base_version: u64,
    namespaces: NamespaceTable,
    registrations: BTreeMap<String, PackageRegistration>,
    memberships: MembershipTable,
    pending: Vec<Change>,
}

impl NamespaceSession {
    /// Build a session from persisted state
    ///
    /// Fails if the snapshot holds two namespaces or registrations that differ
    /// only by case.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, ServiceError> {
        let mut namespaces = NamespaceTable::new();
        for namespace in snapshot.namespaces {
            let key = namespace.prefix.folded().to_string();
            if namespaces.insert(key, namespace.clone()).is_some() {
                return Err(ServiceError::Storage(format!(
                    "Duplicate reserved namespace '{}' in stored state",
                    namespace.prefix
                )));
            }
        }

        let mut registrations = BTreeMap::new();
        for registration in snapshot.registrations {
            let key = registration.id.folded().to_string();
            if let Some(existing) = registrations.insert(key, registration) {
                return Err(ServiceError::Storage(format!(
                    "Duplicate package registration '{}' in stored state",
                    existing.id
                )));
            }
        }

        let mut memberships = MembershipTable::new();
        for membership in snapshot.memberships {
            memberships
                .entry(membership.prefix.folded().to_string())
                .or_default()
                .insert(membership.package_id);
        }

        Ok(Self {
            base_version: snapshot.version,
            namespaces,
            registrations,
            memberships,
            pending: Vec::new(),
        })
    }

    /// Stored version this session was loaded at
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    pub fn registry(&self) -> NamespaceRegistry<'_> {
        NamespaceRegistry::new(&self.namespaces)
    }

    pub fn registration(&self, id: &str) -> Option<&PackageRegistration> {
        self.registrations.get(&fold_case(id))
    }

    pub fn registrations(&self) -> impl Iterator<Item = &PackageRegistration> {
        self.registrations.values()
    }

    /// True if `id` is a curated member of the namespace `prefix`
    pub fn is_member(&self, prefix: &str, id: &PackageId) -> bool {
        self.memberships
            .get(&fold_case(prefix))
            .is_some_and(|members| members.contains(id))
    }

    pub fn memberships(&self) -> &MembershipTable {
        &self.memberships
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_changes(&self) -> &[Change] {
        &self.pending
    }

    /// Copy of the pending changes, tagged with the base version
    pub fn pending_batch(&self) -> ChangeBatch {
        ChangeBatch {
            base_version: self.base_version,
            changes: self.pending.clone(),
        }
    }

    /// Drop the first `committed` pending changes after a successful commit
    pub fn mark_committed(&mut self, committed: usize, new_version: u64) {
        let committed = committed.min(self.pending.len());
        self.pending.drain(..committed);
        self.base_version = new_version;
    }

    pub(crate) fn insert_namespace(&mut self, namespace: ReservedNamespace) {
        self.namespaces
            .insert(namespace.prefix.folded().to_string(), namespace.clone());
        self.pending.push(Change::UpsertNamespace(namespace));
    }

    /// Apply `update` to a namespace and record the new version of it
    pub(crate) fn update_namespace<F>(&mut self, prefix: &str, update: F) -> Option<()>
    where
        F: FnOnce(&mut ReservedNamespace),
    {
        let namespace = self.namespaces.get_mut(&fold_case(prefix))?;
        update(namespace);
        self.pending.push(Change::UpsertNamespace(namespace.clone()));
        Some(())
    }

    /// Remove a namespace and its curated memberships
    ///
    /// Returns the namespace and the ids that were curated into it.
    pub(crate) fn remove_namespace(
        &mut self,
        prefix: &str,
    ) -> Option<(ReservedNamespace, Vec<PackageId>)> {
        let key = fold_case(prefix);
        let namespace = self.namespaces.remove(&key)?;
        let curated = self
            .memberships
            .remove(&key)
            .map(|members| members.into_iter().collect())
            .unwrap_or_default();
        self.pending.push(Change::DeleteNamespace {
            prefix: namespace.prefix.clone(),
        });
        Some((namespace, curated))
    }

    pub(crate) fn add_membership(&mut self, membership: CuratedMembership) -> bool {
        let inserted = self
            .memberships
            .entry(membership.prefix.folded().to_string())
            .or_default()
            .insert(membership.package_id.clone());
        if inserted {
            self.pending.push(Change::AddMembership(membership));
        }
        inserted
    }

    pub(crate) fn remove_membership(&mut self, membership: &CuratedMembership) -> bool {
        let key = membership.prefix.folded();
        let removed = self
            .memberships
            .get_mut(key)
            .is_some_and(|members| members.remove(&membership.package_id));
        if removed {
            if self.memberships.get(key).is_some_and(BTreeSet::is_empty) {
                self.memberships.remove(key);
            }
            self.pending.push(Change::RemoveMembership(membership.clone()));
        }
        removed
    }

    /// Recompute the verified flag of every registration selected by `affected`
    ///
    /// Registrations are visited in place; only those whose flag changes are
    /// recorded. Returns the number of flags changed.
    pub(crate) fn reconcile_where<F>(&mut self, mut affected: F) -> usize
    where
        F: FnMut(&PackageRegistration) -> bool,
    {
        let Self {
            namespaces,
            registrations,
            memberships,
            pending,
            ..
        } = self;
        let registry = NamespaceRegistry::new(namespaces);

        let mut changed = 0;
        for registration in registrations.values_mut().filter(|r| affected(&**r)) {
            let verified = VerifiedFlagReconciler::is_verified(registry, memberships, registration);
            if registration.verified != verified {
                registration.verified = verified;
                pending.push(Change::SetVerified {
                    package_id: registration.id.clone(),
                    verified,
                });
                changed += 1;
            }
        }
        changed
    }
}
