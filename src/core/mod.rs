//! Core reserved namespace engine

pub mod authorization;
pub mod config;
pub mod directory;
pub mod lifecycle;
pub mod matching;
pub mod model;
pub mod reconciler;
pub mod registry;
pub mod service;
pub mod session;

// Re-export main types for convenience
pub use authorization::{AuthorizationEvaluator, GrantSource, PushDecision};
pub use config::ServiceConfig;
pub use directory::{InMemoryUserDirectory, UserDirectory};
pub use lifecycle::{validate_prefix, NamespaceLifecycleManager};
pub use matching::{MatchMode, PrefixMatcher};
pub use model::{
    CuratedMembership, NamespacePrefix, PackageId, PackageRegistration, ReservedNamespace, User,
    Username,
};
pub use reconciler::VerifiedFlagReconciler;
pub use registry::NamespaceRegistry;
pub use service::{NamespaceService, ServiceError};
pub use session::NamespaceSession;
