//! Snippet executor: one fresh interpreter per call, off the event loop.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::allowlist::ModulePolicy;
use crate::limits::ExecutionLimits;
use crate::namespace::CapabilityNamespace;
use crate::outcome::{ExecutionError, Outcome};
use crate::vm;

/// The variable a snippet must bind its output to.
pub const RESULT_VAR: &str = "result";

/// Seam between the protocol gateway and the execution engine.
#[async_trait]
pub trait CodeRunner: Send + Sync {
    async fn run(&self, code: &str) -> Outcome;
}

/// Executes snippets against an immutable capability namespace under a
/// deny-by-default module policy and a wall-clock budget.
///
/// The VM work is synchronous and CPU-bound; each execution runs on its
/// own worker thread so a long or hung snippet never stalls the
/// cooperative loop handling other requests.
pub struct SnippetExecutor {
    namespace: Arc<CapabilityNamespace>,
    policy: Arc<ModulePolicy>,
    limits: ExecutionLimits,
}

impl SnippetExecutor {
    /// The effective policy is `policy` extended with the namespace
    /// aliases, so bound capabilities are always importable.
    pub fn new(
        namespace: CapabilityNamespace,
        policy: ModulePolicy,
        limits: ExecutionLimits,
    ) -> Self {
        let policy = policy.allowing(namespace.aliases().map(str::to_owned));
        Self {
            namespace: Arc::new(namespace),
            policy: Arc::new(policy),
            limits,
        }
    }

    pub fn limits(&self) -> &ExecutionLimits {
        &self.limits
    }

    /// Run one snippet to an [`Outcome`]. Never panics the host; every
    /// failure mode, including a VM panic on the worker, is converted
    /// into a `Failure`.
    pub async fn execute(&self, code: &str) -> Outcome {
        let execution_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::debug!(
            execution_id = %execution_id,
            code_len = code.len(),
            "executing snippet"
        );

        let code = code.to_owned();
        let namespace = Arc::clone(&self.namespace);
        let policy = Arc::clone(&self.policy);
        let (tx, rx) = oneshot::channel();

        let spawned = std::thread::Builder::new()
            .name(format!("snippet-{execution_id}"))
            .spawn(move || {
                let _ = tx.send(vm::run_snippet(&code, &namespace, &policy));
            });
        if let Err(e) = spawned {
            return Outcome::Failure(ExecutionError::Runtime {
                message: format!("failed to start execution worker: {e}"),
            });
        }

        let outcome = match tokio::time::timeout(self.limits.max_duration, rx).await {
            Ok(Ok(outcome)) => outcome,
            // The worker died without reporting (a VM panic).
            Ok(Err(_)) => Outcome::Failure(ExecutionError::Runtime {
                message: "execution worker terminated unexpectedly".to_owned(),
            }),
            // Budget exceeded: the worker is abandoned and whatever it
            // eventually produces is discarded with the closed channel.
            Err(_) => Outcome::Failure(ExecutionError::Timeout {
                budget: self.limits.max_duration,
            }),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Outcome::Success(_) => {
                tracing::debug!(execution_id = %execution_id, elapsed_ms, "snippet succeeded")
            }
            Outcome::Failure(err) => {
                tracing::debug!(
                    execution_id = %execution_id,
                    elapsed_ms,
                    kind = err.kind(),
                    "snippet failed"
                )
            }
        }
        outcome
    }
}

#[async_trait]
impl CodeRunner for SnippetExecutor {
    async fn run(&self, code: &str) -> Outcome {
        self.execute(code).await
    }
}
