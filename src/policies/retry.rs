//! # Retry policy for tasks within a flow run.
//!
//! [`RetryPolicy`] bounds how many times a failing task is re-invoked inside
//! the same run, and which backoff schedule spaces the attempts. Retries are
//! strictly per task: a task that exhausts its budget fails the whole run and
//! the remaining tasks are skipped. The run itself is never restarted.

use crate::policies::BackoffPolicy;

/// Per-task retry budget with an attempt-spacing backoff.
///
/// A task runs `retries + 1` times at most. Only retryable errors
/// ([`TaskError::is_retryable`](crate::TaskError::is_retryable)) consume the
/// budget; a fatal error or cancellation ends the attempt loop immediately.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Number of re-invocations allowed after the first failed attempt.
    pub retries: u32,
    /// Delay schedule between attempts.
    pub backoff: BackoffPolicy,
}

impl RetryPolicy {
    /// Policy with the given retry count and default backoff.
    pub fn retries(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    /// Returns a copy with the given backoff schedule.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for RetryPolicy {
    /// Returns a policy with no retries (single attempt).
    fn default() -> Self {
        Self {
            retries: 0,
            backoff: BackoffPolicy::default(),
        }
    }
}
