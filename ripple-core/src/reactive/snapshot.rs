//! Snapshots
//!
//! A snapshot is a point-in-time copy of every stored value, in rule
//! registration order. Because propagation is synchronous, a snapshot taken
//! through the engine never shows a cascade half-finished.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::error::Result;
use crate::graph::RuleKey;

/// Immutable copy of the engine's values.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<V> {
    values: IndexMap<RuleKey, V>,
}

impl<V> Snapshot<V> {
    pub(crate) fn new(values: IndexMap<RuleKey, V>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RuleKey> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RuleKey, &V)> {
        self.values.iter()
    }

    pub fn into_inner(self) -> IndexMap<RuleKey, V> {
        self.values
    }
}

impl<V: Serialize> Snapshot<V> {
    /// Encode as a JSON object keyed by rule name.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode as a MessagePack map keyed by rule name.
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }
}

impl<V: Serialize> Serialize for Snapshot<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.values.iter())
    }
}

impl<'a, V> IntoIterator for &'a Snapshot<V> {
    type Item = (&'a RuleKey, &'a V);
    type IntoIter = indexmap::map::Iter<'a, RuleKey, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
