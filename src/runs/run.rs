//! # Flow run records.
//!
//! A [`FlowRun`] is one scheduled or ad-hoc execution instance of a
//! deployment's flow. Runs move through a strict state machine:
//!
//! ```text
//! Pending ──► Running ──► Completed   (all tasks succeeded)
//!                   └───► Failed      (a task exhausted retries, or the run
//!                   │                  was cancelled; remaining tasks skipped)
//!                   └───► Crashed     (executor died / heartbeat went stale)
//! ```
//!
//! Terminal records are retained for audit; [`RunView`] is the external
//! status snapshot returned by run-status queries.

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::flows::Flow;
use crate::pools::WorkPool;
use std::sync::Arc;

/// Unique identifier of one flow run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u64);

impl RunId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a flow run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Created, waiting for pool capacity.
    Pending,
    /// Holding one unit of pool capacity, executing tasks in order.
    Running,
    /// All tasks ran without error.
    Completed,
    /// A task failed past its retry budget, or the run was cancelled.
    Failed,
    /// The executor terminated mid-run (heartbeat timeout or panic).
    Crashed,
}

impl RunStatus {
    /// True for `Completed`, `Failed`, and `Crashed`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Crashed
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Crashed => "crashed",
        };
        f.write_str(s)
    }
}

/// External status snapshot of one run.
#[derive(Clone, Debug)]
pub struct RunView {
    /// Run identifier.
    pub id: RunId,
    /// Name of the owning deployment.
    pub deployment: String,
    /// Current status.
    pub status: RunStatus,
    /// Fire time the run was scheduled for (creation time for ad-hoc runs).
    pub scheduled_for: DateTime<Utc>,
    /// When the run entered RUNNING.
    pub started_at: Option<DateTime<Utc>>,
    /// When the run reached a terminal state.
    pub ended_at: Option<DateTime<Utc>>,
    /// Failure or crash detail, if any.
    pub error: Option<String>,
}

/// Internal run record owned by the run store.
pub(crate) struct FlowRun {
    pub(crate) id: RunId,
    pub(crate) deployment: Arc<str>,
    pub(crate) flow: Flow,
    pub(crate) pool: Arc<WorkPool>,
    pub(crate) scheduled_for: DateTime<Utc>,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) ended_at: Option<DateTime<Utc>>,
    pub(crate) status: RunStatus,
    pub(crate) error: Option<String>,
    /// Refreshed while RUNNING; stale beats mean the executor died.
    pub(crate) last_beat: Option<Instant>,
    /// Cooperative cancellation handle (child of the runtime token).
    pub(crate) cancel: CancellationToken,
}

impl FlowRun {
    pub(crate) fn view(&self) -> RunView {
        RunView {
            id: self.id,
            deployment: self.deployment.to_string(),
            status: self.status,
            scheduled_for: self.scheduled_for,
            started_at: self.started_at,
            ended_at: self.ended_at,
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Crashed.is_terminal());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(RunStatus::Running.to_string(), "running");
        assert_eq!(RunStatus::Crashed.to_string(), "crashed");
    }
}
