//! Execution limits for sandboxed snippets.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wall-clock budget for one execution. Memory and CPU-time caps are not
/// represented: the embedded VM exposes no accounting for them, and a
/// limit that cannot be enforced would only be decoration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLimits {
    pub max_duration: Duration,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(30),
        }
    }
}

impl ExecutionLimits {
    /// Tight budget for untrusted callers.
    pub fn strict() -> Self {
        Self {
            max_duration: Duration::from_secs(5),
        }
    }

    pub fn with_max_duration(max_duration: Duration) -> Self {
        Self { max_duration }
    }
}
