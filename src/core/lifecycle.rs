//! Namespace lifecycle: creation, deletion, ownership and curated membership
//!
//! Every operation validates first, then mutates the shared session, then
//! reconciles verified flags, so a failed call leaves the session untouched.
//! Namespace and owner operations are async because they resolve users and
//! may persist through the store; membership operations only touch the
//! session and leave the commit to the caller.

use crate::core::config::ServiceConfig;
use crate::core::directory::UserDirectory;
use crate::core::model::{CuratedMembership, ReservedNamespace, Username};
use crate::core::reconciler::VerifiedFlagReconciler;
use crate::core::service::ServiceError;
use crate::core::session::{read_session, write_session, NamespaceSession, SharedSession};
use crate::storage::{CommitMode, NamespaceStore};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

static PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\w+([.-]\w+)*[.-]?$").expect("Invalid namespace prefix regex")
});

/// Check that `value` can be reserved as a namespace prefix
pub fn validate_prefix(value: &str, max_length: usize) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidArgument(
            "Namespace prefix cannot be empty".to_string(),
        ));
    }
    if value.chars().count() > max_length {
        return Err(ServiceError::InvalidArgument(format!(
            "Namespace prefix '{}' is too long (max {} characters)",
            value, max_length
        )));
    }
    if !PREFIX_REGEX.is_match(value) {
        return Err(ServiceError::InvalidArgument(format!(
            "Namespace prefix '{}' must be a package id optionally ending in '.' or '-'",
            value
        )));
    }
    Ok(())
}

pub struct NamespaceLifecycleManager {
    config: ServiceConfig,
    store: Arc<dyn NamespaceStore>,
    directory: Arc<dyn UserDirectory>,
    session: SharedSession,
    /// Held from reading the pending batch until it is marked committed
    commit_lock: Mutex<()>,
}

impl NamespaceLifecycleManager {
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn NamespaceStore>,
        directory: Arc<dyn UserDirectory>,
        session: SharedSession,
    ) -> Self {
        Self {
            config,
            store,
            directory,
            session,
            commit_lock: Mutex::new(()),
        }
    }

    /// Reserve a new namespace and commit
    ///
    /// Owners already listed on `namespace` must exist in the directory; their
    /// matching registrations become verified.
    pub async fn add_namespace(&self, namespace: ReservedNamespace) -> Result<(), ServiceError> {
        validate_prefix(namespace.prefix.as_str(), self.config.max_prefix_length)?;
        for owner in &namespace.owners {
            self.require_user(owner.as_str()).await?;
        }

        {
            let mut session = write_session(&self.session)?;
            if session
                .registry()
                .find_exact(namespace.prefix.as_str())
                .is_some()
            {
                return Err(ServiceError::AlreadyExists(format!(
                    "Reserved namespace '{}' already exists",
                    namespace.prefix
                )));
            }

            session.insert_namespace(namespace.clone());
            VerifiedFlagReconciler::on_namespace_added(&mut session, &namespace);
        }
        info!("Reserved namespace '{}'", namespace.prefix);

        self.commit(self.config.default_commit_mode).await
    }

    /// Delete a namespace and commit
    ///
    /// Registrations that only this namespace verified lose the flag.
    pub async fn delete_namespace(&self, prefix: &str) -> Result<(), ServiceError> {
        require_non_empty(prefix, "Namespace prefix")?;

        {
            let mut session = write_session(&self.session)?;
            let (deleted, curated) = session
                .remove_namespace(prefix)
                .ok_or_else(|| not_found(prefix))?;
            let changed =
                VerifiedFlagReconciler::on_namespace_deleted(&mut session, &deleted, &curated);
            info!(
                "Deleted reserved namespace '{}' ({} registration(s) changed)",
                deleted.prefix, changed
            );
        }

        self.commit(self.config.default_commit_mode).await
    }

    /// Make `username` an owner of the namespace and commit
    ///
    /// Adding an existing owner changes nothing.
    pub async fn add_owner(&self, prefix: &str, username: &str) -> Result<(), ServiceError> {
        require_non_empty(prefix, "Namespace prefix")?;
        let owner = self.require_user(username).await?;

        {
            let mut session = write_session(&self.session)?;
            let namespace = session
                .registry()
                .find_exact(prefix)
                .cloned()
                .ok_or_else(|| not_found(prefix))?;
            if namespace.is_owned_by(&owner) {
                debug!("'{}' already owns '{}'", owner, namespace.prefix);
                return Ok(());
            }

            let mut updated = namespace;
            updated.owners.insert(owner.clone());
            session.update_namespace(prefix, |ns| {
                ns.owners.insert(owner.clone());
            });
            let changed = VerifiedFlagReconciler::on_owner_added(&mut session, &updated, &owner);
            info!(
                "Added owner '{}' to '{}' ({} registration(s) verified)",
                owner, updated.prefix, changed
            );
        }

        self.commit(self.config.default_commit_mode).await
    }

    /// Remove `username` from the namespace owners
    ///
    /// With `commit_as_transaction` the removal and every dependent flag
    /// change are persisted as one atomic unit. Otherwise they stay pending so
    /// bulk callers can commit many removals at once.
    pub async fn delete_owner(
        &self,
        prefix: &str,
        username: &str,
        commit_as_transaction: bool,
    ) -> Result<(), ServiceError> {
        require_non_empty(prefix, "Namespace prefix")?;
        // Former users may have left the directory but still own namespaces
        let owner = Username::new(username)?;

        {
            let mut session = write_session(&self.session)?;
            let namespace = session
                .registry()
                .find_exact(prefix)
                .cloned()
                .ok_or_else(|| not_found(prefix))?;
            if !namespace.is_owned_by(&owner) {
                return Err(ServiceError::Conflict(format!(
                    "'{}' is not an owner of '{}'",
                    owner, namespace.prefix
                )));
            }

            session.update_namespace(prefix, |ns| {
                ns.owners.remove(&owner);
            });
            let changed = VerifiedFlagReconciler::on_owner_removed(&mut session, &namespace, &owner);
            info!(
                "Removed owner '{}' from '{}' ({} registration(s) changed)",
                owner, namespace.prefix, changed
            );
        }

        if commit_as_transaction {
            self.commit(CommitMode::Transaction).await
        } else {
            debug!("Owner removal left pending for caller commit");
            Ok(())
        }
    }

    /// Curate a registration into a namespace; the caller commits
    pub fn add_package_registration(&self, prefix: &str, package_id: &str) -> Result<(), ServiceError> {
        let mut session = write_session(&self.session)?;
        let membership = self.membership(&session, prefix, package_id)?;
        let id = membership.package_id.clone();

        if session.add_membership(membership) {
            VerifiedFlagReconciler::on_membership_changed(&mut session, &id);
            info!("Added '{}' to namespace '{}'", id, prefix);
        }
        Ok(())
    }

    /// Remove a curated registration from a namespace; the caller commits
    pub fn remove_package_registration(
        &self,
        prefix: &str,
        package_id: &str,
    ) -> Result<(), ServiceError> {
        let mut session = write_session(&self.session)?;
        let membership = self.membership(&session, prefix, package_id)?;

        if !session.remove_membership(&membership) {
            return Err(ServiceError::Conflict(format!(
                "'{}' is not a member of '{}'",
                membership.package_id, membership.prefix
            )));
        }
        VerifiedFlagReconciler::on_membership_changed(&mut session, &membership.package_id);
        info!(
            "Removed '{}' from namespace '{}'",
            membership.package_id, membership.prefix
        );
        Ok(())
    }

    /// Persist every pending change of the session
    ///
    /// Commits are serialized; a commit that starts while another is in
    /// flight sees only what that one left pending.
    pub async fn commit(&self, mode: CommitMode) -> Result<(), ServiceError> {
        let _guard = self.commit_lock.lock().await;
        let batch = read_session(&self.session)?.pending_batch();
        if batch.is_empty() {
            return Ok(());
        }

        let committed = batch.len();
        let new_version = match self.store.save_changes(batch, mode).await {
            Ok(version) => version,
            Err(e) => {
                warn!("Commit of {} change(s) failed: {}", committed, e);
                return Err(e);
            }
        };

        write_session(&self.session)?.mark_committed(committed, new_version);
        info!(
            "Committed {} change(s) as {:?} (version {})",
            committed, mode, new_version
        );
        Ok(())
    }

    async fn require_user(&self, username: &str) -> Result<Username, ServiceError> {
        require_non_empty(username, "Username")?;
        match self.directory.find_user(username).await? {
            Some(user) => Ok(user.username),
            None => Err(ServiceError::InvalidArgument(format!(
                "User '{}' not found",
                username
            ))),
        }
    }

    fn membership(
        &self,
        session: &NamespaceSession,
        prefix: &str,
        package_id: &str,
    ) -> Result<CuratedMembership, ServiceError> {
        require_non_empty(prefix, "Namespace prefix")?;
        require_non_empty(package_id, "Package id")?;

        let namespace = session
            .registry()
            .find_exact(prefix)
            .ok_or_else(|| not_found(prefix))?;
        let registration = session.registration(package_id).ok_or_else(|| {
            ServiceError::NotFound(format!("Package registration '{}' not found", package_id))
        })?;

        Ok(CuratedMembership {
            prefix: namespace.prefix.clone(),
            package_id: registration.id.clone(),
        })
    }
}

fn require_non_empty(value: &str, what: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidArgument(format!("{} cannot be empty", what)));
    }
    Ok(())
}

fn not_found(prefix: &str) -> ServiceError {
    ServiceError::NotFound(format!("Reserved namespace '{}' not found", prefix))
}
