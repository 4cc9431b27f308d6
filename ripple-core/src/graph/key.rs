//! Rule Keys
//!
//! This module defines the identifier type for nodes in the rule graph.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Unique identifier for a rule in the dependency graph.
///
/// Keys are cheap to clone (the string is shared) and can be looked up by
/// `&str` in any map keyed by `RuleKey`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleKey(Arc<str>);

impl RuleKey {
    /// Create a key from any string-like value.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RuleKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RuleKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RuleKey {
    fn from(name: &str) -> Self {
        Self(Arc::from(name))
    }
}

impl From<String> for RuleKey {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl PartialEq<str> for RuleKey {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for RuleKey {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RuleKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn keys_compare_by_name() {
        let k1 = RuleKey::from("sum");
        let k2 = RuleKey::new(String::from("sum"));
        let k3 = RuleKey::from("total");

        assert_eq!(k1, k2);
        assert_ne!(k1, k3);
        assert_eq!(k1, "sum");
    }

    #[test]
    fn keys_can_be_looked_up_by_str() {
        let mut map = HashMap::new();
        map.insert(RuleKey::from("a"), 1);

        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.get("b"), None);
    }

    #[test]
    fn key_displays_and_serializes_as_plain_string() {
        let key = RuleKey::from("doubleSum");
        assert_eq!(key.to_string(), "doubleSum");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"doubleSum\"");
    }
}
