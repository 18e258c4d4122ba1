//! Push authorization for package ids governed by reserved namespaces

use crate::core::model::{ReservedNamespace, Username};
use crate::core::registry::NamespaceRegistry;
use crate::core::service::ServiceError;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Which identity granted (or failed to grant) a push
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "owners", rename_all = "snake_case")]
pub enum GrantSource {
    /// No reserved namespace governs the id
    Unreserved,
    /// The pushing user owns a matching namespace
    DirectOwner,
    /// Only accounts the user pushes on behalf of own a matching namespace
    OnBehalfOf(BTreeSet<Username>),
    /// Every matching namespace is shared and shared pushes are enabled
    SharedNamespace,
    Denied,
}

/// Result of a push authorization check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushDecision {
    pub allowed: bool,

    /// Matching namespaces owned by the user (or the accounts they act for)
    pub owned_matching_namespaces: Vec<ReservedNamespace>,

    pub grant: GrantSource,
}

impl PushDecision {
    fn unreserved() -> Self {
        Self {
            allowed: true,
            owned_matching_namespaces: Vec::new(),
            grant: GrantSource::Unreserved,
        }
    }
}

/// Answers "may this user push this package id"
///
/// Permissive by default: an id no reserved namespace governs may always be
/// pushed. Otherwise ownership of any one matching namespace is sufficient.
pub struct AuthorizationEvaluator<'a> {
    registry: NamespaceRegistry<'a>,
    allow_push_to_shared_namespaces: bool,
}

impl<'a> AuthorizationEvaluator<'a> {
    pub fn new(registry: NamespaceRegistry<'a>) -> Self {
        Self {
            registry,
            allow_push_to_shared_namespaces: false,
        }
    }

    /// Also allow pushes when every matching namespace is shared
    pub fn with_shared_namespace_pushes(mut self, allow: bool) -> Self {
        self.allow_push_to_shared_namespaces = allow;
        self
    }

    /// Check whether `user` directly owns a namespace governing `id`
    pub fn is_push_allowed(&self, id: &str, user: &Username) -> Result<PushDecision, ServiceError> {
        self.is_push_allowed_on_behalf_of_owners(id, user, &BTreeSet::new())
    }

    /// Check whether `user`, or any account in `delegates` that `user` may
    /// push on behalf of, owns a namespace governing `id`
    pub fn is_push_allowed_on_behalf_of_owners(
        &self,
        id: &str,
        user: &Username,
        delegates: &BTreeSet<Username>,
    ) -> Result<PushDecision, ServiceError> {
        if id.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Package id cannot be empty".to_string(),
            ));
        }

        let matches = self.registry.find_all_matching(id, false);
        if matches.is_empty() {
            debug!("'{}' is not reserved; push allowed for '{}'", id, user);
            return Ok(PushDecision::unreserved());
        }

        let mut identities = delegates.clone();
        identities.insert(user.clone());

        let owned: Vec<ReservedNamespace> = matches
            .iter()
            .filter(|namespace| namespace.is_owned_by_any(&identities))
            .map(|namespace| (*namespace).clone())
            .collect();

        let decision = if owned.iter().any(|namespace| namespace.is_owned_by(user)) {
            PushDecision {
                allowed: true,
                owned_matching_namespaces: owned,
                grant: GrantSource::DirectOwner,
            }
        } else if !owned.is_empty() {
            let granting: BTreeSet<Username> = owned
                .iter()
                .flat_map(|namespace| namespace.owners.iter())
                .filter(|owner| delegates.contains(*owner))
                .cloned()
                .collect();
            PushDecision {
                allowed: true,
                owned_matching_namespaces: owned,
                grant: GrantSource::OnBehalfOf(granting),
            }
        } else if self.allow_push_to_shared_namespaces
            && matches.iter().all(|namespace| namespace.is_shared_namespace)
        {
            PushDecision {
                allowed: true,
                owned_matching_namespaces: Vec::new(),
                grant: GrantSource::SharedNamespace,
            }
        } else {
            PushDecision {
                allowed: false,
                owned_matching_namespaces: Vec::new(),
                grant: GrantSource::Denied,
            }
        };

        debug!(
            "Push of '{}' by '{}': allowed={} ({} matching, {} owned)",
            id,
            user,
            decision.allowed,
            matches.len(),
            decision.owned_matching_namespaces.len()
        );
        Ok(decision)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::core::model::NamespacePrefix;
    use crate::core::registry::NamespaceTable;

    fn user(name: &str) -> Username {
        Username::new(name).unwrap()
    }

    fn table(entries: Vec<ReservedNamespace>) -> NamespaceTable {
        entries
            .into_iter()
            .map(|ns| (ns.prefix.folded().to_string(), ns))
            .collect()
    }

    fn ns(prefix: &str) -> ReservedNamespace {
        ReservedNamespace::new(NamespacePrefix::new(prefix).unwrap())
    }

    #[test]
    fn test_unreserved_id_is_allowed_with_empty_match_set() {
        let t = table(vec![ns("Contoso.").with_owner(user("alice"))]);
        let evaluator = AuthorizationEvaluator::new(NamespaceRegistry::new(&t));
        let decision = evaluator.is_push_allowed("Fabrikam.Tools", &user("bob")).unwrap();
        assert!(decision.allowed);
        assert!(decision.owned_matching_namespaces.is_empty());
        assert_eq!(decision.grant, GrantSource::Unreserved);
    }

    #[test]
    fn test_owner_of_any_matching_namespace_may_push() {
        let t = table(vec![
            ns("Foo.").with_owner(user("alice")),
            ns("Foo.Bar.").with_owner(user("bob")),
        ]);
        let evaluator = AuthorizationEvaluator::new(NamespaceRegistry::new(&t));

        let decision = evaluator.is_push_allowed("Foo.Bar.Baz", &user("bob")).unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.owned_matching_namespaces.len(), 1);
        assert_eq!(decision.owned_matching_namespaces[0].prefix.as_str(), "Foo.Bar.");
        assert_eq!(decision.grant, GrantSource::DirectOwner);

        let denied = evaluator.is_push_allowed("Foo.Bar.Baz", &user("carol")).unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.grant, GrantSource::Denied);
    }

    #[test]
    fn test_on_behalf_of_reports_granting_accounts() {
        let t = table(vec![ns("Contoso.").with_owner(user("alice"))]);
        let evaluator = AuthorizationEvaluator::new(NamespaceRegistry::new(&t));
        let delegates: BTreeSet<Username> = [user("alice")].into_iter().collect();

        let direct = evaluator.is_push_allowed("Contoso.Tools", &user("bob")).unwrap();
        assert!(!direct.allowed);

        let delegated = evaluator
            .is_push_allowed_on_behalf_of_owners("Contoso.Tools", &user("bob"), &delegates)
            .unwrap();
        assert!(delegated.allowed);
        assert_eq!(delegated.grant, GrantSource::OnBehalfOf(delegates.clone()));
    }

    #[test]
    fn test_no_delegates_behaves_like_direct_check() {
        let t = table(vec![ns("Contoso.").with_owner(user("alice"))]);
        let evaluator = AuthorizationEvaluator::new(NamespaceRegistry::new(&t));
        for name in ["alice", "bob"] {
            let direct = evaluator.is_push_allowed("Contoso.X", &user(name)).unwrap();
            let delegated = evaluator
                .is_push_allowed_on_behalf_of_owners("Contoso.X", &user(name), &BTreeSet::new())
                .unwrap();
            assert_eq!(direct, delegated);
        }
    }

    #[test]
    fn test_shared_namespace_push_requires_opt_in() {
        let t = table(vec![ns("Shared.").shared(true).with_owner(user("alice"))]);
        let strict = AuthorizationEvaluator::new(NamespaceRegistry::new(&t));
        assert!(!strict.is_push_allowed("Shared.Thing", &user("bob")).unwrap().allowed);

        let lenient = AuthorizationEvaluator::new(NamespaceRegistry::new(&t))
            .with_shared_namespace_pushes(true);
        let decision = lenient.is_push_allowed("Shared.Thing", &user("bob")).unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.grant, GrantSource::SharedNamespace);
    }

    #[test]
    fn test_empty_id_is_invalid() {
        let t = NamespaceTable::new();
        let evaluator = AuthorizationEvaluator::new(NamespaceRegistry::new(&t));
        assert!(matches!(
            evaluator.is_push_allowed(" ", &user("alice")),
            Err(ServiceError::InvalidArgument(_))
        ));
    }
}
