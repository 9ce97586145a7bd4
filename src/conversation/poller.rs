//! Run status polling.
//!
//! The poller sleeps for a fixed interval before every status check and
//! hands `requires_action` runs to the [`ToolDispatcher`]. The whole wait is
//! bounded by an optional deadline and aborted by a cancellation token.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::assistants::{AssistantsApi, Run, RunStatus};
use crate::error::{AppError, Result};
use crate::tools::ToolDispatcher;

/// Default pause between two status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default bound on the whole wait.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(600);

/// Polling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause before every status check.
    pub interval: Duration,
    /// Bound on the whole wait; `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_RUN_TIMEOUT),
        }
    }
}

/// Waits for a run to complete, answering its tool calls along the way.
#[derive(Clone, Copy)]
pub struct RunPoller<'a> {
    api: &'a dyn AssistantsApi,
    policy: PollPolicy,
}

impl std::fmt::Debug for RunPoller<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunPoller")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<'a> RunPoller<'a> {
    pub fn new(api: &'a dyn AssistantsApi, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    /// Poll `run_id` until it completes.
    ///
    /// Returns the completed run. Fails when the run reaches a failure
    /// status, a tool call cannot be answered, the deadline passes or
    /// `cancel` fires.
    pub async fn wait(
        &self,
        thread_id: &str,
        run_id: &str,
        dispatcher: &ToolDispatcher<'_>,
        cancel: &CancellationToken,
    ) -> Result<Run> {
        let deadline = async {
            match self.policy.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::warn!(name: "run.wait.cancelled", run_id = %run_id, "Wait for run cancelled");
                Err(AppError::Cancelled { run_id: run_id.to_string() })
            }
            () = deadline => {
                let timeout = self.policy.timeout.unwrap_or_default();
                tracing::error!(name: "run.wait.timeout", run_id = %run_id, ?timeout, "Run did not complete in time");
                Err(AppError::RunTimedOut { run_id: run_id.to_string(), timeout })
            }
            result = self.poll(thread_id, run_id, dispatcher) => result,
        }
    }

    async fn poll(
        &self,
        thread_id: &str,
        run_id: &str,
        dispatcher: &ToolDispatcher<'_>,
    ) -> Result<Run> {
        let mut checks: u32 = 0;

        loop {
            tokio::time::sleep(self.policy.interval).await;
            checks += 1;

            let run = self.api.retrieve_run(thread_id, run_id).await?;
            tracing::info!(name: "run.status", run_id = %run_id, status = %run.status, checks, "Run status");

            let status = run.status.clone();
            match &status {
                RunStatus::Completed => {
                    tracing::info!(
                        name: "run.completed",
                        run_id = %run_id,
                        elapsed_secs = ?run.elapsed_secs(),
                        checks,
                        "Run completed"
                    );
                    return Ok(run);
                }
                RunStatus::RequiresAction => {
                    let calls = run.pending_tool_calls();
                    tracing::info!(name: "run.requires_action", run_id = %run_id, tool_call_count = calls.len(), "Function calling");
                    dispatcher.dispatch(thread_id, run_id, calls).await?;
                }
                RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling => {
                    tracing::debug!(run_id = %run_id, "Waiting for the assistant to process");
                }
                status if status.is_failure() => {
                    let message = run.last_error.as_ref().map(|e| e.message.clone());
                    tracing::error!(name: "run.failed", run_id = %run_id, status = %status, error = ?message, "Run failed");
                    return Err(AppError::RunFailed {
                        run_id: run_id.to_string(),
                        status: status.to_string(),
                        message,
                    });
                }
                status => {
                    tracing::warn!(name: "run.status.unknown", run_id = %run_id, status = %status, "Unrecognized run status, polling again");
                }
            }
        }
    }
}
