//! Space-delimited OAuth scope sets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered, de-duplicated set of scope tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(Vec<String>);

impl ScopeSet {
    /// Parse a space-delimited scope string, keeping first occurrences in order.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::from_iter(raw.split_whitespace())
    }

    /// Whether `scope` is present.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.0.iter().any(|s| s == scope)
    }

    /// Whether every scope here is in `allowed`.
    #[must_use]
    pub fn is_subset_of<S: AsRef<str>>(&self, allowed: &[S]) -> bool {
        self.0
            .iter()
            .all(|s| allowed.iter().any(|a| a.as_ref() == s))
    }

    /// Scopes in request order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consume into the scope list.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut scopes: Vec<String> = Vec::new();
        for scope in iter {
            let scope = scope.as_ref();
            if !scope.is_empty() && !scopes.iter().any(|s| s == scope) {
                scopes.push(scope.to_string());
            }
        }
        Self(scopes)
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_dedups_in_order() {
        let scopes = ScopeSet::parse("  openid profile openid  email ");
        assert_eq!(scopes.as_slice(), &["openid", "profile", "email"]);
        assert_eq!(scopes.to_string(), "openid profile email");
    }

    #[test]
    fn test_subset() {
        let scopes = ScopeSet::parse("openid email");
        assert!(scopes.is_subset_of(&["openid", "profile", "email"]));
        assert!(!scopes.is_subset_of(&["openid"]));
        assert!(ScopeSet::parse("").is_subset_of::<&str>(&[]));
    }

    proptest! {
        #[test]
        fn prop_render_parse_is_stable(words in prop::collection::vec("[a-z_]{1,8}", 0..6)) {
            let scopes = ScopeSet::parse(&words.join(" "));
            prop_assert_eq!(ScopeSet::parse(&scopes.to_string()), scopes.clone());
            for word in &words {
                prop_assert!(scopes.contains(word));
            }
        }
    }
}
