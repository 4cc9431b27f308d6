//! Engine Configuration
//!
//! Knobs that change how the engine maintains its dependency graph and how
//! manual overrides interact with recomputation. The defaults reproduce the
//! plain additive behavior: edges are only ever added, and a cascade may
//! overwrite a manually set value.

use serde::{Deserialize, Serialize};

/// How a rule's incoming edges are maintained across evaluations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Edges are only ever added. A dependency read once stays recorded even
    /// if later executions stop reading it.
    #[default]
    Accumulate,

    /// After each successful evaluation, the rule's incoming edges are exactly
    /// the keys it read during that evaluation.
    Refresh,
}

/// What a cascade does to a rule whose value was set manually.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverridePolicy {
    /// The rule is recomputed like any other and may overwrite the override.
    #[default]
    Recompute,

    /// The rule keeps its manual value until the override is cleared.
    Pin,
}

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub edge_policy: EdgePolicy,
    pub override_policy: OverridePolicy,
    /// Fail with [`Error::Cycle`](crate::Error::Cycle) when a rule's change
    /// propagates back into its own evaluation and the rules' latest reads
    /// form a loop. When disabled, cycles recurse until their values settle
    /// or the stack overflows.
    pub detect_cycles: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            edge_policy: EdgePolicy::default(),
            override_policy: OverridePolicy::default(),
            detect_cycles: true,
        }
    }
}

impl EngineConfig {
    pub fn with_edge_policy(mut self, policy: EdgePolicy) -> Self {
        self.edge_policy = policy;
        self
    }

    pub fn with_override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = policy;
        self
    }

    pub fn with_cycle_detection(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }
}
