//! Reactive Rules
//!
//! This module implements the propagation half of the engine: rules, the
//! tracking context that discovers their dependencies, and the engine that
//! re-runs them when something they read changes.
//!
//! # Concepts
//!
//! ## Rules
//!
//! A rule is a named compute function. It reads other rules through a
//! [`Deps`] view and returns a value. It does not declare its dependencies;
//! whatever it reads while running is what it depends on.
//!
//! ## Cascades
//!
//! When a rule's value changes, its listeners fire and every rule that read
//! it runs again. A rule whose value changes as a result starts its own
//! notification before control returns, so one change propagates depth-first
//! until nothing else changes.
//!
//! ## Overrides
//!
//! Any rule's value can be set from outside with [`Engine::set`]. A manual set
//! always notifies, even when the value is the same. Whether a later cascade
//! may overwrite the override is governed by
//! [`OverridePolicy`](crate::config::OverridePolicy).

mod context;
mod engine;
mod listener;
mod rule;
mod snapshot;
mod store;

pub use context::Deps;
pub use engine::Engine;
pub use listener::Listener;
pub use rule::{ComputeFn, Rule, RuleSet};
pub use snapshot::Snapshot;
