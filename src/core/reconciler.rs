//! Maintenance of the derived `verified` flag on package registrations
//!
//! A registration is verified iff one of its owners also owns a reserved
//! namespace that governs its id, or it has been curated into a namespace
//! explicitly. Every event recomputes the flag from that rule for the
//! registrations the event can affect; no deltas are patched.

use crate::core::matching::PrefixMatcher;
use crate::core::model::{PackageId, PackageRegistration, ReservedNamespace, Username};
use crate::core::registry::NamespaceRegistry;
use crate::core::session::{MembershipTable, NamespaceSession};
use tracing::debug;

pub struct VerifiedFlagReconciler;

impl VerifiedFlagReconciler {
    /// Evaluate the verified rule for one registration
    pub fn is_verified(
        registry: NamespaceRegistry<'_>,
        memberships: &MembershipTable,
        registration: &PackageRegistration,
    ) -> bool {
        let co_owned = registry
            .namespaces_for_id(registration.id.as_str())
            .into_iter()
            .any(|namespace| namespace.is_owned_by_any(&registration.owners));

        co_owned
            || memberships
                .values()
                .any(|members| members.contains(&registration.id))
    }

    /// A namespace was created; it can only verify registrations it governs
    pub fn on_namespace_added(session: &mut NamespaceSession, namespace: &ReservedNamespace) -> usize {
        let changed = session.reconcile_where(|registration| {
            PrefixMatcher::matches_folded(namespace, registration.id.folded())
        });
        debug!(
            "Namespace '{}' added: {} verified flag(s) changed",
            namespace.prefix, changed
        );
        changed
    }

    /// A namespace was removed from the session along with its curated members
    ///
    /// Registrations it governed or curated keep their flag only if another
    /// surviving namespace still justifies it.
    pub fn on_namespace_deleted(
        session: &mut NamespaceSession,
        deleted: &ReservedNamespace,
        curated: &[PackageId],
    ) -> usize {
        let changed = session.reconcile_where(|registration| {
            PrefixMatcher::matches_folded(deleted, registration.id.folded())
                || curated.contains(&registration.id)
        });
        debug!(
            "Namespace '{}' deleted: {} verified flag(s) changed",
            deleted.prefix, changed
        );
        changed
    }

    /// `owner` now owns `namespace`; their matching registrations become verified
    pub fn on_owner_added(
        session: &mut NamespaceSession,
        namespace: &ReservedNamespace,
        owner: &Username,
    ) -> usize {
        let changed = Self::reconcile_owned_matches(session, namespace, owner);
        debug!(
            "Owner '{}' added to '{}': {} verified flag(s) changed",
            owner, namespace.prefix, changed
        );
        changed
    }

    /// `owner` no longer owns `namespace`
    ///
    /// Their matching registrations are recomputed against the full current
    /// match set, so another namespace or co-owner can keep them verified.
    pub fn on_owner_removed(
        session: &mut NamespaceSession,
        namespace: &ReservedNamespace,
        owner: &Username,
    ) -> usize {
        let changed = Self::reconcile_owned_matches(session, namespace, owner);
        debug!(
            "Owner '{}' removed from '{}': {} verified flag(s) changed",
            owner, namespace.prefix, changed
        );
        changed
    }

    /// A curated membership of `package_id` was added or removed
    pub fn on_membership_changed(session: &mut NamespaceSession, package_id: &PackageId) -> usize {
        session.reconcile_where(|registration| &registration.id == package_id)
    }

    fn reconcile_owned_matches(
        session: &mut NamespaceSession,
        namespace: &ReservedNamespace,
        owner: &Username,
    ) -> usize {
        session.reconcile_where(|registration| {
            registration.is_owned_by(owner)
                && PrefixMatcher::matches_folded(namespace, registration.id.folded())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::core::model::NamespacePrefix;
    use crate::storage::Snapshot;

    fn user(name: &str) -> Username {
        Username::new(name).unwrap()
    }

    fn namespace(prefix: &str, owners: &[&str]) -> ReservedNamespace {
        owners.iter().fold(
            ReservedNamespace::new(NamespacePrefix::new(prefix).unwrap()),
            |ns, o| ns.with_owner(user(o)),
        )
    }

    fn registration(id: &str, owners: &[&str], verified: bool) -> PackageRegistration {
        let mut r = owners.iter().fold(
            PackageRegistration::new(PackageId::new(id).unwrap()),
            |r, o| r.with_owner(user(o)),
        );
        r.verified = verified;
        r
    }

    #[test]
    fn test_is_verified_requires_co_owned_match() {
        let session = NamespaceSession::from_snapshot(Snapshot {
            namespaces: vec![namespace("Contoso.", &["alice"])],
            ..Default::default()
        })
        .unwrap();
        let registry = session.registry();
        let memberships = session.memberships();

        let owned = registration("Contoso.Tools", &["alice"], false);
        let foreign = registration("Contoso.Tools", &["bob"], false);
        let unmatched = registration("Fabrikam.Tools", &["alice"], false);

        assert!(VerifiedFlagReconciler::is_verified(registry, memberships, &owned));
        assert!(!VerifiedFlagReconciler::is_verified(registry, memberships, &foreign));
        assert!(!VerifiedFlagReconciler::is_verified(registry, memberships, &unmatched));
    }

    #[test]
    fn test_owner_added_only_touches_that_owners_registrations() {
        let mut session = NamespaceSession::from_snapshot(Snapshot {
            namespaces: vec![namespace("Contoso.", &["alice", "bob"])],
            registrations: vec![
                registration("Contoso.A", &["alice"], false),
                registration("Contoso.B", &["bob"], false),
            ],
            ..Default::default()
        })
        .unwrap();
        let ns = session.registry().find_exact("Contoso.").unwrap().clone();

        let changed = VerifiedFlagReconciler::on_owner_added(&mut session, &ns, &user("alice"));
        assert_eq!(changed, 1);
        assert!(session.registration("Contoso.A").unwrap().verified);
        assert!(!session.registration("Contoso.B").unwrap().verified);
    }

    #[test]
    fn test_unchanged_flags_are_not_recorded() {
        let mut session = NamespaceSession::from_snapshot(Snapshot {
            namespaces: vec![namespace("Contoso.", &["alice"])],
            registrations: vec![registration("Contoso.A", &["alice"], true)],
            ..Default::default()
        })
        .unwrap();
        let ns = session.registry().find_exact("Contoso.").unwrap().clone();

        assert_eq!(
            VerifiedFlagReconciler::on_owner_added(&mut session, &ns, &user("alice")),
            0
        );
        assert!(!session.has_pending_changes());
    }

    #[test]
    fn test_membership_counts_without_prefix_match() {
        let mut session = NamespaceSession::from_snapshot(Snapshot {
            namespaces: vec![namespace("Contoso.", &[])],
            registrations: vec![registration("Legacy.Package", &["carol"], false)],
            ..Default::default()
        })
        .unwrap();
        let id = PackageId::new("Legacy.Package").unwrap();
        session.add_membership(crate::core::model::CuratedMembership {
            prefix: NamespacePrefix::new("Contoso.").unwrap(),
            package_id: id.clone(),
        });

        assert_eq!(VerifiedFlagReconciler::on_membership_changed(&mut session, &id), 1);
        assert!(session.registration("Legacy.Package").unwrap().verified);
    }
}
