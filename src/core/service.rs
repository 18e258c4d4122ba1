//! Main reserved namespace service implementation

use crate::core::authorization::{AuthorizationEvaluator, PushDecision};
use crate::core::config::ServiceConfig;
use crate::core::directory::UserDirectory;
use crate::core::lifecycle::NamespaceLifecycleManager;
use crate::core::model::{PackageId, PackageRegistration, ReservedNamespace, Username};
use crate::core::reconciler::VerifiedFlagReconciler;
use crate::core::session::{read_session, write_session, NamespaceSession, SharedSession};
use crate::storage::NamespaceStore;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Main service error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Main reserved namespace service
///
/// Owns the session loaded from the store and exposes lookups, push
/// authorization and the lifecycle manager over it.
pub struct NamespaceService {
    /// Service configuration
    config: ServiceConfig,

    /// Persistence collaborator
    store: Arc<dyn NamespaceStore>,

    /// User/organization collaborator
    directory: Arc<dyn UserDirectory>,

    /// In-memory state and pending changes
    session: SharedSession,

    /// Mutating operations
    lifecycle: NamespaceLifecycleManager,
}

impl NamespaceService {
    /// Create a service over the current contents of `store`
    pub async fn new(
        config: ServiceConfig,
        store: Arc<dyn NamespaceStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Result<Self, ServiceError> {
        crate::init_logging();

        let snapshot = store.load_snapshot().await?;
        info!(
            "Loaded {} reserved namespace(s) and {} registration(s) at version {}",
            snapshot.namespaces.len(),
            snapshot.registrations.len(),
            snapshot.version
        );
        let session: SharedSession =
            Arc::new(RwLock::new(NamespaceSession::from_snapshot(snapshot)?));

        let lifecycle = NamespaceLifecycleManager::new(
            config.clone(),
            store.clone(),
            directory.clone(),
            session.clone(),
        );

        Ok(Self {
            config,
            store,
            directory,
            session,
            lifecycle,
        })
    }

    /// Get the lifecycle manager
    pub fn lifecycle(&self) -> &NamespaceLifecycleManager {
        &self.lifecycle
    }

    /// Get service configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Namespace whose prefix equals `prefix`, ignoring case
    pub fn find_exact(&self, prefix: &str) -> Result<Option<ReservedNamespace>, ServiceError> {
        let session = read_session(&self.session)?;
        Ok(session.registry().find_exact(prefix).cloned())
    }

    /// Namespaces matching `id`; see [`NamespaceRegistry::find_all_matching`](crate::core::registry::NamespaceRegistry::find_all_matching)
    pub fn find_all_matching(
        &self,
        id: &str,
        exact_only: bool,
    ) -> Result<Vec<ReservedNamespace>, ServiceError> {
        let session = read_session(&self.session)?;
        Ok(session
            .registry()
            .find_all_matching(id, exact_only)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Batch exact lookup; unknown prefixes are skipped
    pub fn find_for_prefixes<I, S>(&self, prefixes: I) -> Result<Vec<ReservedNamespace>, ServiceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let session = read_session(&self.session)?;
        Ok(session
            .registry()
            .find_for_prefixes(prefixes)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Namespaces governing a package id
    pub fn namespaces_for_id(&self, id: &str) -> Result<Vec<ReservedNamespace>, ServiceError> {
        self.find_all_matching(id, false)
    }

    /// All reserved namespaces, ordered by prefix
    pub fn list_namespaces(&self) -> Result<Vec<ReservedNamespace>, ServiceError> {
        let session = read_session(&self.session)?;
        Ok(session.registry().iter().cloned().collect())
    }

    /// Current in-session view of a package registration
    pub fn package_registration(
        &self,
        id: &str,
    ) -> Result<Option<PackageRegistration>, ServiceError> {
        Ok(read_session(&self.session)?.registration(id).cloned())
    }

    /// Every registration in the session, ordered by id
    pub fn list_registrations(&self) -> Result<Vec<PackageRegistration>, ServiceError> {
        Ok(read_session(&self.session)?.registrations().cloned().collect())
    }

    /// Ids whose `verified` flag disagrees with the namespaces and memberships
    ///
    /// Empty unless the stored state was edited outside the service.
    pub fn unreconciled_registrations(&self) -> Result<Vec<PackageId>, ServiceError> {
        let session = read_session(&self.session)?;
        let registry = session.registry();
        Ok(session
            .registrations()
            .filter(|r| {
                r.verified != VerifiedFlagReconciler::is_verified(registry, session.memberships(), r)
            })
            .map(|r| r.id.clone())
            .collect())
    }

    /// May `user` push `id` as a direct namespace owner
    pub fn is_push_allowed(&self, id: &str, user: &Username) -> Result<PushDecision, ServiceError> {
        let session = read_session(&self.session)?;
        self.evaluator(&session).is_push_allowed(id, user)
    }

    /// May `user` push `id` as an owner or on behalf of an account that owns it
    pub async fn is_push_allowed_on_behalf_of_owners(
        &self,
        id: &str,
        user: &Username,
    ) -> Result<PushDecision, ServiceError> {
        let delegates = self.directory.delegates_of(user).await?;
        let session = read_session(&self.session)?;
        self.evaluator(&session)
            .is_push_allowed_on_behalf_of_owners(id, user, &delegates)
    }

    pub fn has_pending_changes(&self) -> Result<bool, ServiceError> {
        Ok(read_session(&self.session)?.has_pending_changes())
    }

    /// Discard pending changes and reload the stored state
    pub async fn reload(&self) -> Result<(), ServiceError> {
        let snapshot = self.store.load_snapshot().await?;
        let fresh = NamespaceSession::from_snapshot(snapshot)?;
        *write_session(&self.session)? = fresh;
        info!("Session reloaded; pending changes discarded");
        Ok(())
    }

    fn evaluator<'a>(&self, session: &'a NamespaceSession) -> AuthorizationEvaluator<'a> {
        AuthorizationEvaluator::new(session.registry())
            .with_shared_namespace_pushes(self.config.allow_push_to_shared_namespaces)
    }
}
