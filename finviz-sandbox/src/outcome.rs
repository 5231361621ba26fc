//! Tagged result of one execution attempt.

use std::time::Duration;
use thiserror::Error;

/// The value the snippet bound to `result`, captured at the VM boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedValue {
    /// JSON-representable value (primitives, sequences, string-keyed
    /// mappings).
    Json(serde_json::Value),
    /// Fallback display form for values JSON cannot carry.
    Repr(String),
}

/// Outcome of one execution; produced once, consumed by the serializer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(CapturedValue),
    Failure(ExecutionError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// Everything that can go wrong while running a snippet. All variants are
/// converted into a text response at the gateway; none propagate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("{message}")]
    Syntax { message: String },

    #[error("module '{module}' is not allowed")]
    CapabilityDenied { module: String },

    #[error("{message}")]
    Runtime { message: String },

    #[error("code did not bind a value to the 'result' variable")]
    MissingResult,

    #[error("execution exceeded the wall-clock budget of {budget:?}")]
    Timeout { budget: Duration },
}

impl ExecutionError {
    /// Stable kind tag surfaced to callers ahead of the message.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::Syntax { .. } => "SyntaxError",
            ExecutionError::CapabilityDenied { .. } => "CapabilityDeniedError",
            ExecutionError::Runtime { .. } => "RuntimeExecutionError",
            ExecutionError::MissingResult => "MissingResultError",
            ExecutionError::Timeout { .. } => "TimeoutError",
        }
    }
}
