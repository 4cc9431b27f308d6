//! Rules
//!
//! A rule is a named compute function. Rules do not declare what they read;
//! the engine learns that from the [`Deps`] view each time the rule runs.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::context::Deps;
use crate::error::BoxError;
use crate::graph::RuleKey;

/// The compute function behind a rule.
pub type ComputeFn<V> = Rc<dyn Fn(&Deps<'_, V>) -> Result<V, BoxError>>;

/// A registered rule: its compute function.
pub struct Rule<V> {
    compute: ComputeFn<V>,
}

impl<V> Rule<V> {
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn(&Deps<'_, V>) -> Result<V, BoxError> + 'static,
    {
        Self {
            compute: Rc::new(compute),
        }
    }

    /// Run the compute function against the given dependency view.
    pub fn compute(&self, deps: &Deps<'_, V>) -> Result<V, BoxError> {
        (self.compute)(deps)
    }
}

impl<V> Clone for Rule<V> {
    fn clone(&self) -> Self {
        Self {
            compute: Rc::clone(&self.compute),
        }
    }
}

/// An ordered set of rules, consumed by [`Engine::new`](crate::Engine::new).
///
/// Construction evaluates rules in insertion order. Inserting a key that is
/// already present replaces its compute function but keeps its position.
///
/// # Example
///
/// ```rust,ignore
/// let rules = RuleSet::new()
///     .constant("a", 2)
///     .constant("b", 3)
///     .rule("sum", |deps| Ok(deps.require("a")? + deps.require("b")?));
/// ```
pub struct RuleSet<V> {
    rules: IndexMap<RuleKey, Rule<V>>,
}

impl<V> RuleSet<V> {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self {
            rules: IndexMap::new(),
        }
    }

    /// Add a rule and return the set, for chaining.
    pub fn rule<F>(mut self, key: impl Into<RuleKey>, compute: F) -> Self
    where
        F: Fn(&Deps<'_, V>) -> Result<V, BoxError> + 'static,
    {
        self.insert(key, compute);
        self
    }

    /// Add a rule in place.
    pub fn insert<F>(&mut self, key: impl Into<RuleKey>, compute: F)
    where
        F: Fn(&Deps<'_, V>) -> Result<V, BoxError> + 'static,
    {
        self.rules.insert(key.into(), Rule::new(compute));
    }

    /// Get the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over rule keys in evaluation order.
    pub fn keys(&self) -> impl Iterator<Item = &RuleKey> {
        self.rules.keys()
    }

    pub(crate) fn into_inner(self) -> IndexMap<RuleKey, Rule<V>> {
        self.rules
    }
}

impl<V: Clone + 'static> RuleSet<V> {
    /// Add a rule with no dependencies that always produces `value`.
    pub fn constant(self, key: impl Into<RuleKey>, value: V) -> Self {
        self.rule(key, move |_| Ok(value.clone()))
    }
}

impl<V> Default for RuleSet<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for RuleSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("keys", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_keep_insertion_order() {
        let rules: RuleSet<i64> = RuleSet::new()
            .constant("b", 1)
            .constant("a", 2)
            .rule("c", |_| Ok(3));

        let keys: Vec<_> = rules.keys().map(RuleKey::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn reinserting_replaces_in_place() {
        let mut rules: RuleSet<i64> = RuleSet::new().constant("a", 1).constant("b", 2);
        rules.insert("a", |_| Ok(10));

        let keys: Vec<_> = rules.keys().map(RuleKey::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn empty_rule_set() {
        let rules: RuleSet<i64> = RuleSet::default();
        assert!(rules.is_empty());
    }
}
