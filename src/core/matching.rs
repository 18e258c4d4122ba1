//! Prefix matching between package ids and reserved namespace prefixes
//!
//! A prefix `P` matches an id `I` when `I` starts with `P` under case-folded
//! ordinal comparison. No separator is implied: `Foo.` matches `Foo.Bar` but
//! not `Foobar`, because the `.` is part of the stored prefix. Every matching
//! namespace is reported; callers decide what the full match set means.

use crate::core::model::{fold_case, ReservedNamespace};

/// How a lookup compares the query against stored prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Prefix must equal the query
    Exact,
    /// Prefix must be a leading part of (or equal to) the query
    Prefix,
}

impl MatchMode {
    pub fn from_exact_only(exact_only: bool) -> Self {
        if exact_only {
            MatchMode::Exact
        } else {
            MatchMode::Prefix
        }
    }
}

pub struct PrefixMatcher;

impl PrefixMatcher {
    /// True if `id` starts with `prefix`, ignoring case
    pub fn matches(prefix: &str, id: &str) -> bool {
        if prefix.is_empty() || id.is_empty() {
            return false;
        }
        fold_case(id).starts_with(&fold_case(prefix))
    }

    /// True if `id` equals `prefix`, ignoring case
    pub fn is_exact(prefix: &str, id: &str) -> bool {
        !prefix.is_empty() && fold_case(prefix) == fold_case(id)
    }

    /// True if `namespace` governs `id`
    ///
    /// Exact namespaces (`is_prefix == false`) only govern an equal id.
    pub fn matches_namespace(namespace: &ReservedNamespace, id: &str) -> bool {
        if namespace.is_prefix {
            Self::matches(namespace.prefix.as_str(), id)
        } else {
            Self::is_exact(namespace.prefix.as_str(), id)
        }
    }

    /// Same as [`PrefixMatcher::matches_namespace`] for an already folded id
    pub(crate) fn matches_folded(namespace: &ReservedNamespace, folded_id: &str) -> bool {
        if folded_id.is_empty() {
            return false;
        }
        if namespace.is_prefix {
            folded_id.starts_with(namespace.prefix.folded())
        } else {
            folded_id == namespace.prefix.folded()
        }
    }

    /// Every leading slice of a folded id, shortest first
    ///
    /// These are the only stored keys that can match the id, so registry
    /// lookups probe them instead of scanning every namespace.
    pub(crate) fn candidate_keys(folded_id: &str) -> impl Iterator<Item = &str> {
        folded_id
            .char_indices()
            .map(|(start, c)| start + c.len_utf8())
            .map(move |end| &folded_id[..end])
    }
}
