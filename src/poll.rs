//! Long-running operation poller.
//!
//! The provider exposes no numeric progress for video jobs, only a handle
//! that can be exchanged for "still running" / "done" / "errored". This
//! drives that exchange on a fixed interval, bounded by a caller-supplied
//! wait budget and a cancellation token. Neither the budget nor the token
//! aborts the provider-side job; they only abandon the wait.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{Result, StudioError};

/// Provider-recommended status-check interval.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    /// Total wait budget across all ticks.
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_wait: Duration::from_secs(600),
        }
    }
}

/// Status reported by one handle exchange.
#[derive(Debug, Clone)]
pub enum OperationStatus {
    Running,
    /// Fetchable location of the finished video.
    Succeeded(String),
    Failed(String),
}

/// Submitted -> Polling -> terminal. Completion and failure are terminal and
/// leave the loop through the return value.
#[derive(Debug, PartialEq, Eq)]
enum PollState {
    Submitted,
    Polling,
}

/// Wait for a submitted operation to finish, emitting a human-readable
/// status line on submission and at every tick. Returns the result URI on
/// success; a job-side error surfaces as a generation failure, an exhausted
/// budget as `PollTimeout`, a fired token as `Cancelled`.
pub async fn await_operation<C, Fut, S>(
    config: &PollConfig,
    cancel: &CancellationToken,
    mut check: C,
    mut on_status: S,
) -> Result<String>
where
    C: FnMut() -> Fut,
    Fut: Future<Output = Result<OperationStatus>>,
    S: FnMut(&str),
{
    let mut state = PollState::Submitted;
    let mut waited = Duration::ZERO;

    loop {
        match state {
            PollState::Submitted => {
                on_status("Video job submitted, preparing the render...");
                state = PollState::Polling;
            }
            PollState::Polling => {
                if waited >= config.max_wait {
                    return Err(StudioError::PollTimeout(config.max_wait));
                }
                tokio::select! {
                    _ = cancel.cancelled() => return Err(StudioError::Cancelled),
                    _ = tokio::time::sleep(config.interval) => {}
                }
                waited += config.interval;

                match check().await? {
                    OperationStatus::Running => {
                        on_status("Rendering in progress (typically 30-60 seconds)...");
                    }
                    OperationStatus::Succeeded(uri) => return Ok(uri),
                    OperationStatus::Failed(message) => {
                        return Err(StudioError::Generation(message));
                    }
                }
            }
        }
    }
}
