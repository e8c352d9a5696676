use std::time::Duration;
use std::time::Instant;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::handler::HandlerResult;

/// Default per-handler deadline.
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(1000);

/// Terminal state of one handler invocation, pattern-matched by the
/// dispatcher instead of blanket exception suppression.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    /// Handler finished in time; `None` means nothing to report.
    Completed(Option<Value>),
    /// Deadline exceeded; the result, if any ever arrives, is disregarded.
    TimedOut,
    /// Handler returned an error or panicked.
    Failed(String),
}

/// One handler's invocation record: exactly one per handler per dispatch.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub handler: String,
    pub outcome: InvocationOutcome,
    pub elapsed: Duration,
}

impl DispatchResult {
    pub fn success(&self) -> bool {
        matches!(self.outcome, InvocationOutcome::Completed(_))
    }
}

/// Bounds handler latency with a deadline.
///
/// The guard exists purely to cap the visible wait: handlers for one event
/// still run sequentially, one at a time. A handler that overruns its
/// deadline is abandoned, not aborted: the spawned task may run to
/// completion in the background and its result is dropped.
#[derive(Debug, Clone)]
pub struct ExecutionGuard {
    deadline: Duration,
    profile: bool,
}

impl ExecutionGuard {
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            profile: false,
        }
    }

    pub fn with_profiling(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run one handler future under the deadline.
    ///
    /// Every invocation produces a [`DispatchResult`] with wall-clock
    /// elapsed time, whatever the outcome.
    pub async fn run(
        &self,
        name: &str,
        tool: Option<&str>,
        fut: BoxFuture<'static, HandlerResult>,
    ) -> DispatchResult {
        let started = Instant::now();
        let join = tokio::spawn(fut);

        let outcome = match tokio::time::timeout(self.deadline, join).await {
            Err(_) => {
                warn!(
                    handler = name,
                    timeout_ms = self.deadline.as_millis() as u64,
                    "handler exceeded deadline"
                );
                InvocationOutcome::TimedOut
            }
            Ok(Err(join_error)) => {
                warn!(handler = name, error = %join_error, "handler panicked");
                InvocationOutcome::Failed(join_error.to_string())
            }
            Ok(Ok(Ok(value))) => InvocationOutcome::Completed(value),
            Ok(Ok(Err(e))) => {
                warn!(handler = name, error = %e, "handler failed");
                InvocationOutcome::Failed(e.to_string())
            }
        };

        let elapsed = started.elapsed();
        debug!(
            handler = name,
            tool = tool.unwrap_or(""),
            elapsed_ms = elapsed.as_millis() as u64,
            success = matches!(outcome, InvocationOutcome::Completed(_)),
            "handler invocation finished"
        );
        if self.profile {
            eprintln!(
                "hookline: {name} tool={} {:.1}ms",
                tool.unwrap_or("-"),
                elapsed.as_secs_f64() * 1000.0
            );
        }

        DispatchResult {
            handler: name.to_string(),
            outcome,
            elapsed,
        }
    }
}
