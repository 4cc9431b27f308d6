//! Ripple Core
//!
//! This crate provides a reactive rule engine: a set of named rules whose
//! values are recomputed automatically when a rule they read changes, with
//! listeners that observe changes on individual keys.
//!
//! - Dependencies are discovered while rules run, not declared up front
//! - Propagation is synchronous and depth-first
//! - A rule notifies only when its value actually changes
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Rule keys and the dependency graph
//! - `reactive`: Rules, dependency tracking, and the engine itself
//! - `config`: Edge, override, and cycle handling policies
//! - `error`: The crate error type
//!
//! # Example
//!
//! ```rust,ignore
//! use ripple_core::{Engine, RuleSet};
//!
//! let engine = Engine::new(
//!     RuleSet::new()
//!         .constant("a", 2)
//!         .constant("b", 3)
//!         .rule("sum", |deps| Ok(deps.require("a")? + deps.require("b")?))
//!         .rule("doubleSum", |deps| Ok(deps.require("sum")? * 2)),
//! )?;
//!
//! engine.on_change("doubleSum", |v| println!("doubleSum changed to {v}"))?;
//!
//! engine.set("a", 10)?;
//! // Prints: "doubleSum changed to 26"
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;

pub use config::{EdgePolicy, EngineConfig, OverridePolicy};
pub use error::{BoxError, Error, Result};
pub use graph::RuleKey;
pub use reactive::{Deps, Engine, RuleSet, Snapshot};
