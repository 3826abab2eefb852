//! Error types used by the flowvisor runtime and tasks.
//!
//! This module defines two main error enums:
//!
//! - [`OrchestratorError`] — errors raised by registration, deployment, and
//!   query operations on the orchestration core.
//! - [`TaskError`] — errors raised by individual task executions inside a
//!   flow run.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics and additional utilities such as [`TaskError::is_retryable`].
//!
//! Registration and deployment errors are surfaced synchronously to the
//! caller and never partially apply. Task execution errors are recorded on
//! the owning flow run and never bring down the scheduler or pool manager.

use std::time::Duration;
use thiserror::Error;

use crate::pools::PoolKind;
use crate::runs::RunId;

/// # Errors produced by the orchestration core.
///
/// These represent failures of synchronous operations: registering tasks,
/// building flows, resolving pools, parsing schedules, deploying, and
/// querying runs.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// A task with the same name is already registered in the given scope.
    #[error("duplicate task name {name:?} in {scope:?}")]
    DuplicateName {
        /// Registry or flow the name collided in.
        scope: String,
        /// The colliding task name.
        name: String,
    },

    /// No task with this name is registered.
    #[error("task {name:?} not found")]
    TaskNotFound {
        /// The requested task name.
        name: String,
    },

    /// No work pool with this name exists and creation was not requested.
    #[error("work pool {name:?} not found")]
    PoolNotFound {
        /// The requested pool name.
        name: String,
    },

    /// A work pool with this name exists but has a different type.
    #[error("work pool {name:?} is of type {existing}, requested {requested}")]
    PoolTypeMismatch {
        /// The pool name.
        name: String,
        /// Type the existing pool was created with.
        existing: PoolKind,
        /// Type requested by the caller.
        requested: PoolKind,
    },

    /// A cron expression failed to parse or can never fire.
    #[error("invalid schedule {expr:?}: {reason}")]
    InvalidSchedule {
        /// The offending expression.
        expr: String,
        /// Parser or validation detail.
        reason: String,
    },

    /// No deployment with this name exists.
    #[error("deployment {name:?} not found")]
    DeploymentNotFound {
        /// The requested deployment name.
        name: String,
    },

    /// No flow run with this id exists.
    #[error("run {id} not found")]
    RunNotFound {
        /// The requested run id.
        id: RunId,
    },

    /// The run queue is closed; the orchestrator has shut down.
    #[error("run queue closed; orchestrator is shut down")]
    QueueClosed,

    /// Shutdown grace period was exceeded; some runs were still in flight.
    #[error("shutdown timeout {grace:?} exceeded; still running: {running:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Runs that did not finish in time.
        running: Vec<RunId>,
    },
}

impl OrchestratorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            OrchestratorError::DuplicateName { .. } => "duplicate_name",
            OrchestratorError::TaskNotFound { .. } => "task_not_found",
            OrchestratorError::PoolNotFound { .. } => "pool_not_found",
            OrchestratorError::PoolTypeMismatch { .. } => "pool_type_mismatch",
            OrchestratorError::InvalidSchedule { .. } => "invalid_schedule",
            OrchestratorError::DeploymentNotFound { .. } => "deployment_not_found",
            OrchestratorError::RunNotFound { .. } => "run_not_found",
            OrchestratorError::QueueClosed => "queue_closed",
            OrchestratorError::GraceExceeded { .. } => "grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors produced by task execution.
///
/// These represent failures of individual task attempts inside a flow run.
/// Some errors are retryable (`Fail`, `Timeout`), others are terminal for
/// the attempt loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task attempt exceeded its timeout duration.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable fatal error (the run fails without further attempts).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Task attempt failed but may succeed if re-invoked.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task was cancelled due to run or runtime shutdown.
    #[error("run cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use flowvisor::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Canceled => "run cancelled".to_string(),
        }
    }

    /// Indicates whether the attempt is safe to re-invoke.
    ///
    /// Returns `true` for [`TaskError::Fail`] and [`TaskError::Timeout`],
    /// `false` otherwise.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. } | TaskError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TaskError::Fail { error: "boom".into() }.is_retryable());
        assert!(TaskError::Timeout { timeout: Duration::from_secs(1) }.is_retryable());
        assert!(!TaskError::Fatal { error: "nope".into() }.is_retryable());
        assert!(!TaskError::Canceled.is_retryable());
    }

    #[test]
    fn test_labels_are_stable() {
        let err = OrchestratorError::PoolNotFound { name: "local-pool".into() };
        assert_eq!(err.as_label(), "pool_not_found");
        assert!(err.as_message().contains("local-pool"));
    }
}
