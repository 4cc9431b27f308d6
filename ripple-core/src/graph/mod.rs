//! Dependency Graph
//!
//! This module holds the structural half of the engine: rule identifiers and
//! the graph of edges discovered between them.
//!
//! # Overview
//!
//! - Nodes are rules, identified by [`RuleKey`]
//! - Edges record reads: if rule B read rule A during evaluation, there is an
//!   edge from A to B, and a change to A re-runs B
//!
//! Edges are not declared up front. They appear as rules execute, so a
//! dependency that is only exercised under values never observed is never
//! recorded.

mod dependency;
mod key;

pub use dependency::DependencyGraph;
pub use key::RuleKey;
