//! # Task specification for supervised execution.
//!
//! Defines [`TaskSpec`] a configuration bundle that describes how one task
//! executes inside a flow run (retry budget, per-attempt timeout).
//!
//! A spec can be created:
//! - **Explicitly** with [`TaskSpec::new`] plus `with_*` overrides
//! - **From config** with [`TaskSpec::with_defaults`] (inherit defaults)
//!
//! Specs are registered in a [`TaskRegistry`](crate::TaskRegistry) and/or
//! appended to a [`FlowBuilder`](crate::FlowBuilder).

use std::fmt;
use std::time::Duration;

use crate::{config::Config, policies::RetryPolicy, tasks::task::TaskRef};

/// Specification for running one task inside a flow run.
///
/// Bundles together:
/// - The task itself ([`TaskRef`])
/// - Retry policy ([`RetryPolicy`], default: no retries)
/// - Optional per-attempt timeout
#[derive(Clone)]
pub struct TaskSpec {
    task: TaskRef,
    retry: RetryPolicy,
    timeout: Option<Duration>,
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("task", &self.task.name())
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TaskSpec {
    /// Creates a new task specification with no retries and no timeout.
    pub fn new(task: TaskRef) -> Self {
        Self {
            task,
            retry: RetryPolicy::default(),
            timeout: None,
        }
    }

    /// Creates a task specification inheriting defaults from global config.
    ///
    /// Uses `Config::default_task_timeout()` so that `0s` in config is
    /// treated as `None`.
    pub fn with_defaults(task: TaskRef, cfg: &Config) -> Self {
        Self {
            task,
            retry: cfg.retry,
            timeout: cfg.default_task_timeout(),
        }
    }

    /// Returns a reference to the task.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Convenience: returns the task name.
    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Returns the retry policy.
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Returns the per-attempt timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns a new spec with the given retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a new spec with the given per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
