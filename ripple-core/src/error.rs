//! Engine errors

use thiserror::Error;

use crate::graph::RuleKey;

/// Boxed error returned by compute functions and fallible listeners.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Engine result type
pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown rule: {0}")]
    UnknownRule(RuleKey),

    #[error("rule {0} has no value yet")]
    NoValue(RuleKey),

    #[error("rule {rule} failed: {source}")]
    Compute {
        rule: RuleKey,
        #[source]
        source: BoxError,
    },

    #[error("listener on {rule} failed: {source}")]
    Listener {
        rule: RuleKey,
        #[source]
        source: BoxError,
    },

    #[error("dependency cycle detected: {}", render_path(.path))]
    Cycle { path: Vec<RuleKey> },

    #[error("failed to encode snapshot as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode snapshot as MessagePack: {0}")]
    MsgPack(#[from] rmp_serde::encode::Error),
}

fn render_path(path: &[RuleKey]) -> String {
    path.iter()
        .map(RuleKey::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
