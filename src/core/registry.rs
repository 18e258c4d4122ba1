//! Read-only lookups over the reserved namespaces of a session

use crate::core::matching::{MatchMode, PrefixMatcher};
use crate::core::model::{fold_case, ReservedNamespace};
use std::collections::BTreeMap;
use tracing::debug;

/// Namespaces keyed by case-folded prefix
pub type NamespaceTable = BTreeMap<String, ReservedNamespace>;

/// Query view over a namespace table
///
/// Borrowed from the owning session; it never mutates and never performs I/O.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceRegistry<'a> {
    namespaces: &'a NamespaceTable,
}

impl<'a> NamespaceRegistry<'a> {
    pub fn new(namespaces: &'a NamespaceTable) -> Self {
        Self { namespaces }
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a ReservedNamespace> {
        self.namespaces.values()
    }

    /// Namespace whose prefix equals `prefix`, ignoring case
    pub fn find_exact(&self, prefix: &str) -> Option<&'a ReservedNamespace> {
        self.namespaces.get(&fold_case(prefix))
    }

    /// Namespaces whose prefix matches `id`
    ///
    /// With `exact_only` only a prefix equal to `id` qualifies. Otherwise every
    /// stored prefix that `id` starts with is returned, shortest first. An
    /// exact namespace (`is_prefix == false`) is only returned for an equal id.
    pub fn find_all_matching(&self, id: &str, exact_only: bool) -> Vec<&'a ReservedNamespace> {
        let folded = fold_case(id);
        let matches: Vec<&'a ReservedNamespace> = match MatchMode::from_exact_only(exact_only) {
            MatchMode::Exact => self.namespaces.get(&folded).into_iter().collect(),
            MatchMode::Prefix => PrefixMatcher::candidate_keys(&folded)
                .filter_map(|key| self.namespaces.get(key))
                .filter(|namespace| PrefixMatcher::matches_folded(namespace, &folded))
                .collect(),
        };
        debug!(
            "{} reserved namespace(s) match '{}' (exact_only={})",
            matches.len(),
            id,
            exact_only
        );
        matches
    }

    /// Namespaces that govern a package id
    pub fn namespaces_for_id(&self, id: &str) -> Vec<&'a ReservedNamespace> {
        self.find_all_matching(id, false)
    }

    /// Batch exact lookup; unknown prefixes are skipped
    pub fn find_for_prefixes<I, S>(&self, prefixes: I) -> Vec<&'a ReservedNamespace>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut found: BTreeMap<&'a str, &'a ReservedNamespace> = BTreeMap::new();
        for prefix in prefixes {
            if let Some((key, namespace)) = self.namespaces.get_key_value(&fold_case(prefix.as_ref()))
            {
                found.insert(key.as_str(), namespace);
            }
        }
        found.into_values().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::core::model::NamespacePrefix;

    fn table(prefixes: &[&str]) -> NamespaceTable {
        prefixes
            .iter()
            .map(|p| {
                let ns = ReservedNamespace::new(NamespacePrefix::new(*p).unwrap());
                (ns.prefix.folded().to_string(), ns)
            })
            .collect()
    }

    fn prefixes(found: Vec<&ReservedNamespace>) -> Vec<String> {
        found.iter().map(|ns| ns.prefix.to_string()).collect()
    }

    #[test]
    fn test_find_exact_ignores_case() {
        let t = table(&["Contoso."]);
        let registry = NamespaceRegistry::new(&t);
        assert!(registry.find_exact("CONTOSO.").is_some());
        assert!(registry.find_exact("Contoso").is_none());
    }

    #[test]
    fn test_find_all_matching_returns_every_prefix() {
        let t = table(&["Foo.", "Foo.Bar.", "Foo.Baz.", "Other."]);
        let registry = NamespaceRegistry::new(&t);
        assert_eq!(
            prefixes(registry.find_all_matching("Foo.Bar.Baz", false)),
            vec!["Foo.", "Foo.Bar."]
        );
    }

    #[test]
    fn test_find_all_matching_folds_each_character() {
        let t = table(&["ΑΣ."]);
        let registry = NamespaceRegistry::new(&t);
        assert_eq!(
            prefixes(registry.find_all_matching("ΑΣ.Β", false)),
            vec!["ΑΣ."]
        );
        assert!(registry.find_exact("ασ.").is_some());
    }

    #[test]
    fn test_find_all_matching_is_reflexive() {
        let t = table(&["Foo.", "Foo.Bar"]);
        let registry = NamespaceRegistry::new(&t);
        for ns in registry.iter() {
            let found = registry.find_all_matching(ns.prefix.as_str(), false);
            assert!(found.iter().any(|m| m.prefix == ns.prefix));
            let exact = registry.find_all_matching(ns.prefix.as_str(), true);
            assert_eq!(exact.len(), 1);
        }
    }

    #[test]
    fn test_find_all_matching_agrees_with_linear_scan() {
        let t = table(&["A", "Ab.", "ab.c", "B.", "Ab.Cd.", "x"]);
        let registry = NamespaceRegistry::new(&t);
        for id in ["ab.cd.e", "AB.C", "b.", "Bx", "", "xyz", "a"] {
            let mut expected: Vec<String> = registry
                .iter()
                .filter(|ns| PrefixMatcher::matches(ns.prefix.as_str(), id))
                .map(|ns| ns.prefix.to_string())
                .collect();
            let mut actual = prefixes(registry.find_all_matching(id, false));
            expected.sort();
            actual.sort();
            assert_eq!(actual, expected, "id {id}");
        }
    }

    #[test]
    fn test_exact_namespace_not_returned_for_longer_id() {
        let mut t = table(&["Foo."]);
        let exact = ReservedNamespace::new(NamespacePrefix::new("Foo.Bar").unwrap()).exact();
        t.insert(exact.prefix.folded().to_string(), exact);
        let registry = NamespaceRegistry::new(&t);
        assert_eq!(prefixes(registry.namespaces_for_id("Foo.Bar.Baz")), vec!["Foo."]);
        assert_eq!(
            prefixes(registry.namespaces_for_id("foo.bar")),
            vec!["Foo.", "Foo.Bar"]
        );
    }

    #[test]
    fn test_find_for_prefixes_skips_unknown_and_duplicates() {
        let t = table(&["Foo.", "Bar."]);
        let registry = NamespaceRegistry::new(&t);
        let found = registry.find_for_prefixes(["foo.", "Missing.", "FOO.", "Bar."]);
        assert_eq!(prefixes(found), vec!["Bar.", "Foo."]);
        assert!(registry.find_for_prefixes(Vec::<String>::new()).is_empty());
    }
}
