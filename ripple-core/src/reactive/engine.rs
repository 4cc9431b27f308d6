//! Rule Engine
//!
//! The engine is the central coordinator that connects rules, their values,
//! the dependency graph, and external listeners.
//!
//! # How It Works
//!
//! 1. Construction evaluates every rule once, in registration order.
//!
//! 2. Evaluating a rule runs its compute function with a [`Deps`] view. Every
//!    registered key read through that view becomes an edge in the graph,
//!    once the change the evaluation caused has finished propagating.
//!
//! 3. When a rule's value changes (by recomputation or a manual `set`), the
//!    engine:
//!    a. Invokes the key's listeners, in registration order
//!    b. Re-evaluates every recorded dependent, in edge discovery order
//!    c. Each dependent whose value changed repeats from (a), depth-first
//!
//! Propagation is synchronous: a change has fully settled before the call
//! that caused it returns.
//!
//! A rule reached again while its own cascade is still running is evaluated
//! again, nested. With cycle detection on, that fails with [`Error::Cycle`]
//! only if the rules' latest reads lead from the rule back to itself.
//!
//! # Threading
//!
//! An engine is single-threaded (`!Send`). Its state lives behind `RefCell`s
//! and no borrow is held while user code runs, so compute functions and
//! listeners may call back into the engine.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::context::{Deps, EvalStack};
use super::listener::Listener;
use super::rule::{Rule, RuleSet};
use super::snapshot::Snapshot;
use super::store::ValueStore;
use crate::config::{EngineConfig, OverridePolicy};
use crate::error::{BoxError, Error, Result};
use crate::graph::{DependencyGraph, RuleKey};

/// A reactive rule engine.
///
/// `Engine` is a handle: cloning it is cheap and the clones share one set of
/// rules, values, and listeners. Separately constructed engines share nothing.
///
/// # Example
///
/// ```rust,ignore
/// let engine = Engine::new(
///     RuleSet::new()
///         .constant("a", 2)
///         .constant("b", 3)
///         .rule("sum", |deps| Ok(deps.require("a")? + deps.require("b")?)),
/// )?;
///
/// engine.on_change("sum", |sum| println!("sum is now {sum}"))?;
/// engine.set("a", 10)?; // prints "sum is now 13"
/// ```
pub struct Engine<V> {
    inner: Rc<Inner<V>>,
}

struct Inner<V> {
    config: EngineConfig,

    /// Fixed at construction.
    rules: IndexMap<RuleKey, Rule<V>>,

    store: RefCell<ValueStore<V>>,
    graph: RefCell<DependencyGraph>,
    listeners: RefCell<IndexMap<RuleKey, Vec<Listener<V>>>>,
    stack: EvalStack,
}

impl<V> Engine<V>
where
    V: Clone + PartialEq + 'static,
{
    /// Build an engine with the default configuration and evaluate every rule.
    pub fn new(rules: RuleSet<V>) -> Result<Self> {
        Self::with_config(rules, EngineConfig::default())
    }

    /// Build an engine and evaluate every rule once, in registration order.
    ///
    /// Fails with the first error raised during that pass.
    pub fn with_config(rules: RuleSet<V>, config: EngineConfig) -> Result<Self> {
        let engine = Self {
            inner: Rc::new(Inner {
                config,
                rules: rules.into_inner(),
                store: RefCell::new(ValueStore::default()),
                graph: RefCell::new(DependencyGraph::new()),
                listeners: RefCell::new(IndexMap::new()),
                stack: EvalStack::default(),
            }),
        };

        tracing::debug!(rules = engine.inner.rules.len(), "constructing engine");

        for key in engine.inner.rules.keys() {
            engine.evaluate_rule(key)?;
        }

        tracing::debug!(
            rules = engine.inner.rules.len(),
            edges = engine.inner.graph.borrow().edge_count(),
            "engine ready"
        );

        Ok(engine)
    }

    /// Get the current value of a rule.
    ///
    /// Never recomputes. Fails if `key` was never registered.
    pub fn get(&self, key: &str) -> Result<V> {
        let key = self.resolve(key)?;
        self.stored(key.as_str())
            .ok_or_else(|| Error::NoValue(key.clone()))
    }

    /// Overwrite a rule's value and notify its listeners and dependents.
    ///
    /// Unlike recomputation, a manual set always notifies, even if the value
    /// is unchanged.
    pub fn set(&self, key: &str, value: V) -> Result<()> {
        let key = self.resolve(key)?;
        tracing::debug!(rule = %key, "manual override");

        let _scope = self.inner.stack.detach();
        self.inner.store.borrow_mut().set_override(key, value);
        self.notify(key)
    }

    /// Set a rule's value from its current one.
    pub fn update<F>(&self, key: &str, f: F) -> Result<()>
    where
        F: FnOnce(&V) -> V,
    {
        let current = self.get(key)?;
        self.set(key, f(&current))
    }

    /// Register a listener for changes to `key`.
    ///
    /// Listeners accumulate and fire in registration order. There is no way
    /// to unregister one.
    pub fn on_change<F>(&self, key: &str, callback: F) -> Result<()>
    where
        F: Fn(&V) + 'static,
    {
        self.add_listener(key, Listener::infallible(callback))
    }

    /// Register a listener that may fail.
    ///
    /// A failure aborts the notification that invoked it: later listeners on
    /// the key and its dependents are not run.
    pub fn try_on_change<F>(&self, key: &str, callback: F) -> Result<()>
    where
        F: Fn(&V) -> std::result::Result<(), BoxError> + 'static,
    {
        self.add_listener(key, Listener::new(callback))
    }

    /// Copy every current value.
    pub fn snapshot(&self) -> Snapshot<V> {
        let store = self.inner.store.borrow();
        let values = self
            .inner
            .rules
            .keys()
            .filter_map(|key| store.get(key.as_str()).map(|value| (key.clone(), value.clone())))
            .collect();
        Snapshot::new(values)
    }

    /// Re-run one rule.
    ///
    /// Listeners and dependents are notified only if the value changed.
    pub fn evaluate(&self, key: &str) -> Result<()> {
        let key = self.resolve(key)?;
        let _scope = self.inner.stack.detach();
        self.evaluate_rule(key)
    }

    /// The value last set manually for `key`, if any.
    pub fn override_value(&self, key: &str) -> Result<Option<V>> {
        self.resolve(key)?;
        Ok(self.inner.store.borrow().override_value(key).cloned())
    }

    /// Whether `key` has a manual override on record.
    pub fn is_overridden(&self, key: &str) -> Result<bool> {
        self.resolve(key)?;
        Ok(self.inner.store.borrow().is_overridden(key))
    }

    /// Forget the manual override for `key` and re-run its rule.
    ///
    /// Returns whether an override was recorded.
    pub fn clear_override(&self, key: &str) -> Result<bool> {
        let key = self.resolve(key)?;
        let cleared = self.inner.store.borrow_mut().clear_override(key.as_str()).is_some();

        if cleared {
            tracing::debug!(rule = %key, "override cleared");
            let _scope = self.inner.stack.detach();
            self.evaluate_rule(key)?;
        }
        Ok(cleared)
    }

    /// Rules that read `key`, in discovery order.
    pub fn dependents(&self, key: &str) -> Result<Vec<RuleKey>> {
        self.resolve(key)?;
        Ok(self.inner.graph.borrow().dependents_of(key))
    }

    /// Rules that `key` read, in discovery order.
    pub fn dependencies(&self, key: &str) -> Result<Vec<RuleKey>> {
        self.resolve(key)?;
        Ok(self.inner.graph.borrow().dependencies_of(key))
    }

    /// Registered rule keys, in evaluation order.
    pub fn keys(&self) -> impl Iterator<Item = &RuleKey> {
        self.inner.rules.keys()
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.inner.rules.len()
    }

    /// Whether no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.rules.is_empty()
    }

    /// Whether `key` is a registered rule.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.rules.contains_key(key)
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Run one rule, record what it read, and propagate if its value changed.
    fn evaluate_rule(&self, key: &RuleKey) -> Result<()> {
        let inner = &*self.inner;

        if inner.config.override_policy == OverridePolicy::Pin
            && inner.store.borrow().is_overridden(key.as_str())
        {
            tracing::trace!(rule = %key, "skipping pinned rule");
            return Ok(());
        }

        let rule = inner
            .rules
            .get(key)
            .ok_or_else(|| Error::UnknownRule(key.clone()))?;

        if inner.config.detect_cycles && inner.stack.contains(key) {
            if let Some(path) = inner.graph.borrow().cycle_through(key.as_str()) {
                tracing::debug!(rule = %key, len = path.len(), "dependency cycle detected");
                return Err(Error::Cycle { path });
            }
            tracing::trace!(rule = %key, "re-entering rule through a stale edge");
        }

        let parent = inner.stack.current();
        let _frame = inner.stack.enter(key);

        tracing::trace!(
            rule = %key,
            parent = ?parent,
            depth = inner.stack.depth(),
            "evaluating rule"
        );

        let deps = Deps::new(self, key);
        let value = rule.compute(&deps).map_err(|source| Error::Compute {
            rule: key.clone(),
            source,
        })?;
        inner.graph.borrow_mut().set_reads(key, &deps.into_reads());

        let changed = inner.store.borrow_mut().commit(key, value);
        let notified = if changed { self.notify(key) } else { Ok(()) };

        // Edges are added once the cascade is over, so it only reaches
        // dependents known before this evaluation.
        let added = inner.graph.borrow_mut().record(key, inner.config.edge_policy);
        if added > 0 {
            tracing::trace!(rule = %key, added, "recorded dependency edges");
        }

        notified
    }

    /// Fire listeners for `key`, then re-run its dependents.
    fn notify(&self, key: &RuleKey) -> Result<()> {
        // Snapshot both lists so callbacks can register listeners or discover
        // edges without holding a borrow.
        let listeners = self
            .inner
            .listeners
            .borrow()
            .get(key)
            .cloned()
            .unwrap_or_default();

        tracing::debug!(rule = %key, listeners = listeners.len(), "value changed");

        for listener in &listeners {
            let value = self
                .stored(key.as_str())
                .ok_or_else(|| Error::NoValue(key.clone()))?;
            listener.notify(&value).map_err(|source| Error::Listener {
                rule: key.clone(),
                source,
            })?;
        }

        let dependents = self.inner.graph.borrow().dependents_of(key.as_str());
        for dependent in &dependents {
            self.evaluate_rule(dependent)?;
        }

        Ok(())
    }

    fn add_listener(&self, key: &str, listener: Listener<V>) -> Result<()> {
        let key = self.resolve(key)?.clone();
        self.inner
            .listeners
            .borrow_mut()
            .entry(key)
            .or_default()
            .push(listener);
        Ok(())
    }

    fn resolve(&self, key: &str) -> Result<&RuleKey> {
        self.lookup(key)
            .ok_or_else(|| Error::UnknownRule(RuleKey::from(key)))
    }

    /// The registered key matching `key`, if any.
    pub(crate) fn lookup(&self, key: &str) -> Option<&RuleKey> {
        self.inner.rules.get_key_value(key).map(|(key, _)| key)
    }

    /// The stored value for `key`, if it has one.
    pub(crate) fn stored(&self, key: &str) -> Option<V> {
        self.inner.store.borrow().get(key).cloned()
    }
}

impl<V> Clone for Engine<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for Engine<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("rules", &self.inner.rules.len())
            .field("values", &self.inner.store.borrow().len())
            .field("edges", &self.inner.graph.borrow().edge_count())
            .field("config", &self.inner.config)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
