//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and the demos.
//!
//! ## Output format
//! ```text
//! [run-scheduled] deployment=hello-world run=1 fire=2026-08-07T12:01:00Z
//! [run-starting] deployment=hello-world run=1
//! [task-starting] run=1 task=greet attempt=1
//! [task-failed] run=1 task=greet attempt=1 err="boom"
//! [retry] run=1 task=greet after_attempt=1 delay=100ms
//! [run-completed] deployment=hello-world run=1
//! [shutdown-requested]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Not intended for production use;
/// implement a custom [`Subscribe`] for structured logging or metrics
/// collection.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::RunScheduled => {
                let fire = e
                    .fire_time
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "ad-hoc".to_string());
                println!(
                    "[run-scheduled] deployment={:?} run={:?} fire={fire}",
                    e.deployment, e.run
                );
            }
            EventKind::RunStarting => {
                println!("[run-starting] deployment={:?} run={:?}", e.deployment, e.run);
            }
            EventKind::RunCompleted => {
                println!("[run-completed] deployment={:?} run={:?}", e.deployment, e.run);
            }
            EventKind::RunFailed => {
                println!(
                    "[run-failed] deployment={:?} run={:?} err={:?}",
                    e.deployment, e.run, e.reason
                );
            }
            EventKind::RunCrashed => {
                println!(
                    "[run-crashed] deployment={:?} run={:?} err={:?}",
                    e.deployment, e.run, e.reason
                );
            }
            EventKind::TaskStarting => {
                if let (Some(task), Some(att)) = (&e.task, e.attempt) {
                    println!("[task-starting] run={:?} task={task} attempt={att}", e.run);
                }
            }
            EventKind::TaskStopped => {
                println!("[task-stopped] run={:?} task={:?}", e.run, e.task);
            }
            EventKind::TaskFailed => {
                println!(
                    "[task-failed] run={:?} task={:?} attempt={:?} err={:?}",
                    e.run, e.task, e.attempt, e.reason
                );
            }
            EventKind::TaskTimedOut => {
                println!(
                    "[task-timeout] run={:?} task={:?} timeout_ms={:?}",
                    e.run, e.task, e.timeout_ms
                );
            }
            EventKind::RetryScheduled => {
                println!(
                    "[retry] run={:?} task={:?} after_attempt={:?} delay_ms={:?}",
                    e.run, e.task, e.attempt, e.delay_ms
                );
            }
            EventKind::DeploymentCreated => {
                println!("[deployment-created] deployment={:?}", e.deployment);
            }
            EventKind::DeploymentUpdated => {
                println!("[deployment-updated] deployment={:?}", e.deployment);
            }
            EventKind::DeploymentRemoved => {
                println!("[deployment-removed] deployment={:?}", e.deployment);
            }
            EventKind::PoolCreated => {
                println!("[pool-created] {:?}", e.reason);
            }
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {
                println!("[subscriber-fault] subscriber={:?} reason={:?}", e.task, e.reason);
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllStoppedWithin => {
                println!("[all-stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
