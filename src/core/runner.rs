//! # Run a single attempt of one task.
//!
//! Executes one attempt of a flow step with an optional timeout and
//! publishes the attempt's lifecycle events to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! Success:
//!   task.run() → Ok(()) → publish TaskStopped
//!
//! Cancellation:
//!   task.run() → Err(Canceled) → publish TaskStopped (graceful exit)
//!
//! Failure:
//!   task.run() → Err(Fail/Fatal) → publish TaskFailed
//!
//! Timeout:
//!   timeout exceeded → cancel child → publish TaskTimedOut
//!                                   → publish TaskFailed (timeout)
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event: `TaskStopped` or
//!   `TaskFailed`.
//! - `Canceled` is treated as a graceful exit → `TaskStopped`.
//! - `TaskTimedOut` is published **in addition to** `TaskFailed` on timeout.
//! - Each attempt derives a **child token**, so a timeout cancels only this
//!   attempt, never the whole run.

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::runs::RunId;
use crate::tasks::TaskSpec;

/// Executes a single attempt of `spec`'s task, publishing lifecycle events.
pub(crate) async fn run_task_once(
    spec: &TaskSpec,
    parent: &CancellationToken,
    attempt: u32,
    run: RunId,
    bus: &Bus,
) -> Result<(), TaskError> {
    let child = parent.child_token();
    let name = spec.name().to_string();

    let res = match spec.timeout() {
        Some(dur) if dur > std::time::Duration::ZERO => {
            match time::timeout(dur, spec.task().run(child.clone())).await {
                Ok(r) => r,
                Err(_elapsed) => {
                    child.cancel();
                    bus.publish(
                        Event::now(EventKind::TaskTimedOut)
                            .with_run(run)
                            .with_task(name.as_str())
                            .with_attempt(attempt)
                            .with_timeout(dur),
                    );
                    Err(TaskError::Timeout { timeout: dur })
                }
            }
        }
        _ => spec.task().run(child.clone()).await,
    };

    match res {
        Ok(()) => {
            publish_stopped(bus, run, &name, attempt);
            Ok(())
        }
        Err(TaskError::Canceled) => {
            publish_stopped(bus, run, &name, attempt);
            Err(TaskError::Canceled)
        }
        Err(e) => {
            bus.publish(
                Event::now(EventKind::TaskFailed)
                    .with_run(run)
                    .with_task(name.as_str())
                    .with_attempt(attempt)
                    .with_reason(e.to_string()),
            );
            Err(e)
        }
    }
}

/// Publishes `TaskStopped` (success or graceful cancellation).
fn publish_stopped(bus: &Bus, run: RunId, name: &str, attempt: u32) {
    bus.publish(
        Event::now(EventKind::TaskStopped)
            .with_run(run)
            .with_task(name)
            .with_attempt(attempt),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskFn;
    use std::time::Duration;

    #[tokio::test]
    async fn test_success_publishes_stopped() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let spec = TaskSpec::new(TaskFn::arc("ok", |_ctx: CancellationToken| async {
            Ok::<(), TaskError>(())
        }));

        let res = run_task_once(
            &spec,
            &CancellationToken::new(),
            1,
            RunId::from_raw(1),
            &bus,
        )
        .await;
        assert!(res.is_ok());

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TaskStopped);
        assert_eq!(ev.task.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_timeout_cancels_attempt_and_fails() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let spec = TaskSpec::new(TaskFn::arc("slow", |ctx: CancellationToken| async move {
            // Honors cancellation; without it the attempt would linger.
            ctx.cancelled().await;
            Err::<(), _>(TaskError::Canceled)
        }))
        .with_timeout(Some(Duration::from_millis(20)));

        let res = run_task_once(
            &spec,
            &CancellationToken::new(),
            1,
            RunId::from_raw(2),
            &bus,
        )
        .await;
        assert!(matches!(res, Err(TaskError::Timeout { .. })));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, EventKind::TaskTimedOut);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, EventKind::TaskFailed);
    }

    #[tokio::test]
    async fn test_failure_publishes_failed_with_reason() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let spec = TaskSpec::new(TaskFn::arc("broken", |_ctx: CancellationToken| async {
            Err::<(), _>(TaskError::Fail { error: "boom".into() })
        }));

        let res = run_task_once(
            &spec,
            &CancellationToken::new(),
            3,
            RunId::from_raw(3),
            &bus,
        )
        .await;
        assert!(res.is_err());

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TaskFailed);
        assert_eq!(ev.attempt, Some(3));
        assert!(ev.reason.as_deref().unwrap().contains("boom"));
    }
}
