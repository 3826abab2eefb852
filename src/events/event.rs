//! # Runtime events emitted by the orchestrator, scheduler, and run actors.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Run lifecycle**: flow-run transitions (scheduled, starting, terminal)
//! - **Task lifecycle**: per-attempt flow (starting, stopped, failed, retry)
//! - **Registrar events**: deployment and pool changes
//! - **Runtime events**: shutdown sequence and subscriber faults
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! deployment/run/task identity, attempt counters, and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use flowvisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::TaskFailed)
//!     .with_task("greet")
//!     .with_reason("boom")
//!     .with_attempt(3);
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("greet"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};

use crate::runs::RunId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Run lifecycle events ===
    /// A flow run was created (by the scheduler at a due fire time, or ad hoc).
    ///
    /// Sets: `deployment`, `run`, `fire_time`.
    RunScheduled,

    /// A run acquired pool capacity and entered RUNNING.
    ///
    /// Sets: `deployment`, `run`.
    RunStarting,

    /// All tasks of a run finished without error.
    ///
    /// Sets: `deployment`, `run`.
    RunCompleted,

    /// A task exhausted its retries or the run was cancelled; remaining
    /// tasks were skipped.
    ///
    /// Sets: `deployment`, `run`, `reason`.
    RunFailed,

    /// The run's executor died mid-run or its heartbeat went stale.
    ///
    /// Sets: `deployment`, `run`, `reason`.
    RunCrashed,

    // === Task lifecycle events ===
    /// Task is starting an attempt.
    ///
    /// Sets: `run`, `task`, `attempt` (1-based, per run).
    TaskStarting,

    /// Task attempt finished successfully (or exited on cancellation).
    ///
    /// Sets: `run`, `task`, `attempt`.
    TaskStopped,

    /// Task attempt failed.
    ///
    /// Sets: `run`, `task`, `attempt`, `reason`.
    TaskFailed,

    /// Task attempt exceeded its configured timeout.
    ///
    /// Sets: `run`, `task`, `attempt`, `timeout_ms`.
    /// Always followed by `TaskFailed` for the same attempt.
    TaskTimedOut,

    /// A failed task will be re-invoked after a backoff delay.
    ///
    /// Sets: `run`, `task`, `attempt` (the failed one), `delay_ms`, `reason`.
    RetryScheduled,

    // === Registrar events ===
    /// A new deployment was registered.
    ///
    /// Sets: `deployment`.
    DeploymentCreated,

    /// An existing deployment was overwritten (schedule rebound atomically).
    ///
    /// Sets: `deployment`.
    DeploymentUpdated,

    /// A deployment was removed; its schedule stops firing.
    ///
    /// Sets: `deployment`.
    DeploymentRemoved,

    /// A work pool was created on first reference.
    ///
    /// Sets: `reason` (pool name and kind).
    PoolCreated,

    // === Subscriber faults ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `task` (subscriber name), `reason`.
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `reason`.
    SubscriberOverflow,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed or explicit teardown).
    ShutdownRequested,

    /// All runs drained within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some runs did not finish in time.
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Deployment name, if applicable.
    pub deployment: Option<Arc<str>>,
    /// Flow run id, if applicable.
    pub run: Option<RunId>,
    /// Task (or subscriber) name, if applicable.
    pub task: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Backoff delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Attempt timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Cron fire time the run was scheduled for.
    pub fire_time: Option<DateTime<Utc>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next global sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            deployment: None,
            run: None,
            task: None,
            attempt: None,
            delay_ms: None,
            timeout_ms: None,
            fire_time: None,
            reason: None,
        }
    }

    /// Attaches a deployment name.
    #[inline]
    pub fn with_deployment(mut self, deployment: impl Into<Arc<str>>) -> Self {
        self.deployment = Some(deployment.into());
        self
    }

    /// Attaches a run id.
    #[inline]
    pub fn with_run(mut self, run: RunId) -> Self {
        self.run = Some(run);
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches the cron fire time.
    #[inline]
    pub fn with_fire_time(mut self, at: DateTime<Utc>) -> Self {
        self.fire_time = Some(at);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// True for events reporting a subscriber fault (overflow/panic).
    ///
    /// Used to avoid publishing fault events about fault events.
    #[inline]
    pub fn is_subscriber_fault(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::now(EventKind::RunScheduled);
        let b = Event::now(EventKind::RunStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builders_attach_metadata() {
        let ev = Event::now(EventKind::RetryScheduled)
            .with_deployment("hello-world")
            .with_run(RunId::from_raw(7))
            .with_task("greet")
            .with_attempt(2)
            .with_delay(Duration::from_millis(250));

        assert_eq!(ev.deployment.as_deref(), Some("hello-world"));
        assert_eq!(ev.run, Some(RunId::from_raw(7)));
        assert_eq!(ev.task.as_deref(), Some("greet"));
        assert_eq!(ev.attempt, Some(2));
        assert_eq!(ev.delay_ms, Some(250));
    }

    #[test]
    fn test_fault_detection() {
        assert!(Event::subscriber_overflow("log", "full").is_subscriber_fault());
        assert!(!Event::now(EventKind::TaskFailed).is_subscriber_fault());
    }
}
