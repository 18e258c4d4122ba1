//! Reserved namespace, package registration and user types
//!
//! Prefixes and package ids compare case-insensitively. Both newtypes keep the
//! value as written and a case-folded key used for equality, ordering and
//! matching.

use crate::core::service::ServiceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Case-fold a prefix, package id or username for comparison
///
/// Characters are folded one at a time so that folding a prefix and folding
/// the id it starts with agree (no context rules such as Greek final sigma).
pub(crate) fn fold_case(value: &str) -> String {
    value.chars().flat_map(char::to_lowercase).collect()
}

macro_rules! case_insensitive_name {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            value: String,
            folded: String,
        }

        impl $name {
            /// Create a new value, rejecting empty or whitespace-only input
            pub fn new(value: impl Into<String>) -> Result<Self, ServiceError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(ServiceError::InvalidArgument(format!(
                        "{} cannot be empty",
                        $what
                    )));
                }
                let folded = fold_case(&value);
                Ok(Self { value, folded })
            }

            /// Get the value as originally written
            pub fn as_str(&self) -> &str {
                &self.value
            }

            /// Case-folded comparison key
            pub fn folded(&self) -> &str {
                &self.folded
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.folded == other.folded
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.folded.hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.folded.cmp(&other.folded)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.value
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ServiceError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

case_insensitive_name!(
    /// Reserved namespace prefix, e.g. `Contoso.`
    ///
    /// The trailing separator is part of the prefix; no normalization other
    /// than case folding is applied.
    NamespacePrefix,
    "Namespace prefix"
);

case_insensitive_name!(
    /// Package identifier, e.g. `Contoso.Tools`
    PackageId,
    "Package id"
);

case_insensitive_name!(
    /// Account name of a user or organization
    ///
    /// Compared case-insensitively, like prefixes and package ids, so
    /// `Alice` and `alice` are the same account.
    Username,
    "Username"
);

impl TryFrom<String> for Username {
    type Error = ServiceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Username::new(s)
    }
}

impl From<Username> for String {
    fn from(name: Username) -> String {
        name.value
    }
}

fn default_true() -> bool {
    true
}

/// An administrator-registered prefix and the users who own it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedNamespace {
    pub prefix: NamespacePrefix,

    /// Other users may push under a shared namespace without being verified
    #[serde(default)]
    pub is_shared_namespace: bool,

    /// Listed publicly by the gallery
    #[serde(default)]
    pub is_public: bool,

    /// When false, only a package id equal to the prefix is governed
    #[serde(default = "default_true")]
    pub is_prefix: bool,

    #[serde(default)]
    pub owners: BTreeSet<Username>,
}

impl ReservedNamespace {
    /// Create a prefix namespace with no owners
    pub fn new(prefix: NamespacePrefix) -> Self {
        Self {
            prefix,
            is_shared_namespace: false,
            is_public: false,
            is_prefix: true,
            owners: BTreeSet::new(),
        }
    }

    pub fn shared(mut self, is_shared_namespace: bool) -> Self {
        self.is_shared_namespace = is_shared_namespace;
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn exact(mut self) -> Self {
        self.is_prefix = false;
        self
    }

    pub fn with_owner(mut self, owner: Username) -> Self {
        self.owners.insert(owner);
        self
    }

    pub fn is_owned_by(&self, user: &Username) -> bool {
        self.owners.contains(user)
    }

    /// True if any of `users` owns this namespace
    pub fn is_owned_by_any(&self, users: &BTreeSet<Username>) -> bool {
        self.owners.iter().any(|owner| users.contains(owner))
    }
}

/// The slice of a package registration governed by reserved namespaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRegistration {
    pub id: PackageId,

    #[serde(default)]
    pub verified: bool,

    #[serde(default)]
    pub owners: BTreeSet<Username>,
}

impl PackageRegistration {
    pub fn new(id: PackageId) -> Self {
        Self {
            id,
            verified: false,
            owners: BTreeSet::new(),
        }
    }

    pub fn with_owner(mut self, owner: Username) -> Self {
        self.owners.insert(owner);
        self
    }

    pub fn is_owned_by(&self, user: &Username) -> bool {
        self.owners.contains(user)
    }
}

/// A user account and the accounts it may push on behalf of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: Username,

    #[serde(default)]
    pub push_on_behalf_of: BTreeSet<Username>,
}

impl User {
    pub fn new(username: Username) -> Self {
        Self {
            username,
            push_on_behalf_of: BTreeSet::new(),
        }
    }

    pub fn on_behalf_of(mut self, other: Username) -> Self {
        self.push_on_behalf_of.insert(other);
        self
    }
}

/// Explicit association of a package registration with a namespace
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CuratedMembership {
    pub prefix: NamespacePrefix,
    pub package_id: PackageId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_compares_case_insensitively() {
        let a = NamespacePrefix::new("Contoso.").unwrap();
        let b = NamespacePrefix::new("contoso.").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "Contoso.");
        assert_eq!(b.folded(), "contoso.");
    }

    #[test]
    fn test_empty_names_are_rejected() {
        assert!(NamespacePrefix::new("").is_err());
        assert!(NamespacePrefix::new("   ").is_err());
        assert!(PackageId::new("").is_err());
        assert!(Username::new("").is_err());
    }

    #[test]
    fn test_prefix_serializes_as_plain_string() {
        let prefix = NamespacePrefix::new("Contoso.").unwrap();
        assert_eq!(serde_json::to_string(&prefix).unwrap(), "\"Contoso.\"");
        let back: NamespacePrefix = serde_json::from_str("\"CONTOSO.\"").unwrap();
        assert_eq!(back, prefix);
        assert!(serde_json::from_str::<NamespacePrefix>("\"\"").is_err());
    }

    #[test]
    fn test_namespace_defaults_when_deserialized() {
        let ns: ReservedNamespace = serde_json::from_str(r#"{"prefix":"Foo."}"#).unwrap();
        assert!(ns.is_prefix);
        assert!(!ns.is_shared_namespace);
        assert!(ns.owners.is_empty());
    }

    #[test]
    fn test_owner_set_has_no_duplicates() {
        let alice = Username::new("alice").unwrap();
        let ns = ReservedNamespace::new(NamespacePrefix::new("Foo.").unwrap())
            .with_owner(alice.clone())
            .with_owner(alice.clone());
        assert_eq!(ns.owners.len(), 1);
        assert!(ns.is_owned_by(&alice));
    }

    #[test]
    fn test_fold_case_ignores_word_position() {
        assert_eq!(fold_case("ΑΣ."), "ασ.");
        assert!(fold_case("ΑΣ.Β").starts_with(&fold_case("ΑΣ.")));
    }

    #[test]
    fn test_usernames_compare_case_insensitively() {
        let alice = Username::new("Alice").unwrap();
        assert_eq!(alice, Username::new("alice").unwrap());
        assert_eq!(alice.as_str(), "Alice");

        let registration = PackageRegistration::new(PackageId::new("Foo.Bar").unwrap())
            .with_owner(Username::new("ALICE").unwrap());
        assert!(registration.is_owned_by(&alice));

        let back: Username = serde_json::from_str("\"Alice\"").unwrap();
        assert_eq!(serde_json::to_string(&back).unwrap(), "\"Alice\"");
    }
}
