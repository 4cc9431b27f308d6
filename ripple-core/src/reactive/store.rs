//! Value Store
//!
//! Current value of every rule, plus the record of values that were set
//! manually. An entry is created the first time a rule produces a value (or is
//! set) and is never removed.

use indexmap::IndexMap;

use crate::graph::RuleKey;

#[derive(Debug)]
pub(crate) struct ValueStore<V> {
    values: IndexMap<RuleKey, V>,

    /// Last value set through the facade, per key. Kept separately so the
    /// primary store can mix computed and overridden values.
    overrides: IndexMap<RuleKey, V>,
}

impl<V> Default for ValueStore<V> {
    fn default() -> Self {
        Self {
            values: IndexMap::new(),
            overrides: IndexMap::new(),
        }
    }
}

impl<V: Clone + PartialEq> ValueStore<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.values.get(key)
    }

    /// Store a computed value.
    ///
    /// Returns `true` if the key had no value or held a different one.
    pub fn commit(&mut self, key: &RuleKey, value: V) -> bool {
        match self.values.get_mut(key) {
            Some(current) if *current == value => false,
            Some(current) => {
                *current = value;
                true
            }
            None => {
                self.values.insert(key.clone(), value);
                true
            }
        }
    }

    /// Overwrite a value unconditionally and record it as a manual override.
    pub fn set_override(&mut self, key: &RuleKey, value: V) {
        self.overrides.insert(key.clone(), value.clone());
        self.values.insert(key.clone(), value);
    }

    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    pub fn override_value(&self, key: &str) -> Option<&V> {
        self.overrides.get(key)
    }

    /// Drop the override record for `key`. The stored value is left alone.
    pub fn clear_override(&mut self, key: &str) -> Option<V> {
        self.overrides.shift_remove(key)
    }
}

impl<V> ValueStore<V> {
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_reports_changes() {
        let mut store = ValueStore::default();
        let key = RuleKey::from("sum");

        assert!(store.commit(&key, 5));
        assert!(!store.commit(&key, 5));
        assert!(store.commit(&key, 6));
        assert_eq!(store.get("sum"), Some(&6));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn overrides_are_recorded_separately() {
        let mut store = ValueStore::default();
        let key = RuleKey::from("a");

        store.commit(&key, 2);
        assert!(!store.is_overridden("a"));

        store.set_override(&key, 10);
        assert!(store.is_overridden("a"));
        assert_eq!(store.get("a"), Some(&10));
        assert_eq!(store.override_value("a"), Some(&10));

        // A later computed value replaces the current value, not the record
        store.commit(&key, 3);
        assert_eq!(store.get("a"), Some(&3));
        assert_eq!(store.override_value("a"), Some(&10));

        assert_eq!(store.clear_override("a"), Some(10));
        assert!(!store.is_overridden("a"));
        assert_eq!(store.get("a"), Some(&3));
    }
}
