//! # Reserved Namespaces
//!
//! Ownership and authorization for reserved package-id namespaces:
//! administrator-registered prefixes such as `Contoso.` that restrict who may
//! push packages whose ids fall under them, and that mark package
//! registrations as verified when an owner of the registration also owns a
//! matching namespace.
//!
//! ## Architecture
//!
//! - [`NamespaceRegistry`] - read-only lookups over the reserved namespaces
//! - [`PrefixMatcher`] - case-insensitive prefix matching of package ids
//! - [`AuthorizationEvaluator`] - push permission, directly or on behalf of others
//! - [`VerifiedFlagReconciler`] - keeps the derived `verified` flag consistent
//! - [`NamespaceLifecycleManager`] - namespace and owner changes, commit timing
//!
//! Persistence and user lookup are collaborators behind the
//! [`NamespaceStore`](storage::NamespaceStore) and [`UserDirectory`] traits.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use reserved_namespaces::storage::InMemoryStore;
//! use reserved_namespaces::{
//!     InMemoryUserDirectory, NamespacePrefix, NamespaceService, ReservedNamespace, ServiceConfig,
//!     User, Username,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let alice = Username::new("alice")?;
//!     let directory = InMemoryUserDirectory::with_users([User::new(alice.clone())]);
//!     let service = NamespaceService::new(
//!         ServiceConfig::default(),
//!         Arc::new(InMemoryStore::default()),
//!         Arc::new(directory),
//!     )
//!     .await?;
//!
//!     let contoso = ReservedNamespace::new(NamespacePrefix::new("Contoso.")?);
//!     service.lifecycle().add_namespace(contoso).await?;
//!     service.lifecycle().add_owner("Contoso.", "alice").await?;
//!
//!     let decision = service.is_push_allowed("Contoso.Tools", &alice)?;
//!     println!("allowed: {}", decision.allowed);
//!
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod storage;

pub use crate::core::authorization::{AuthorizationEvaluator, GrantSource, PushDecision};
pub use crate::core::config::ServiceConfig;
pub use crate::core::directory::{InMemoryUserDirectory, UserDirectory};
pub use crate::core::lifecycle::NamespaceLifecycleManager;
pub use crate::core::matching::PrefixMatcher;
pub use crate::core::model::{
    CuratedMembership, NamespacePrefix, PackageId, PackageRegistration, ReservedNamespace, User,
    Username,
};
pub use crate::core::reconciler::VerifiedFlagReconciler;
pub use crate::core::registry::NamespaceRegistry;
pub use crate::core::service::{NamespaceService, ServiceError};
pub use storage::{CommitMode, NamespaceStore};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging (safe for testing)
pub fn init_logging() {
    // Only initialize logging once
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "reserved_namespaces=warn".into());

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();

        // This will fail silently if already initialized
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
