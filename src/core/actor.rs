//! # RunActor: single-run supervisor.
//!
//! Drives one [`FlowRun`](crate::runs::RunView) from PENDING to a terminal
//! state:
//! - acquires one unit of pool capacity (cancellable wait),
//! - executes the flow's steps **strictly in declared order**,
//! - re-invokes a failing task per its [`RetryPolicy`](crate::RetryPolicy),
//! - refreshes the run heartbeat while RUNNING,
//! - publishes lifecycle events to the bus.
//!
//! ## Flow
//! ```text
//! RunActor::run()
//!   ├─► acquire pool permit (select: permit / cancellation)
//!   ├─► mark RUNNING, publish RunStarting, start beat guard
//!   ├─► for each step, in order:
//!   │     loop {
//!   │       attempt += 1
//!   │       publish TaskStarting
//!   │       run_task_once()
//!   │         ├─ Ok        → next step
//!   │         ├─ Canceled  → run FAILED ("run cancelled"), skip the rest
//!   │         ├─ retryable && attempt <= retries
//!   │         │            → publish RetryScheduled, sleep backoff, retry
//!   │         └─ otherwise → run FAILED, skip the rest
//!   │     }
//!   └─► all steps done → run COMPLETED
//! ```
//!
//! ## Rules
//! - A step never starts before the previous one finished.
//! - Attempts of one step run sequentially; the counter is 1-based and
//!   never resets within a step.
//! - Cancellation is checked at safe points (permit wait, step boundary,
//!   backoff sleep); a task already in progress is never interrupted.
//! - The pool permit is held until the terminal mark, so capacity releases
//!   on completion, failure, and cancellation alike.

use std::sync::Arc;
use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::core::runner::run_task_once;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::runs::{RunContext, RunId, RunStore};
use crate::tasks::TaskSpec;

/// What the step loop decided about the whole run.
enum RunOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

/// Keeps the run's heartbeat fresh; stops beating when dropped.
///
/// Dropping on panic unwind is what lets the heartbeat monitor notice a
/// dead executor.
struct BeatGuard {
    token: CancellationToken,
}

impl BeatGuard {
    fn spawn(store: Arc<RunStore>, id: RunId, every: Duration) -> Self {
        let token = CancellationToken::new();
        let t = token.clone();
        let every = every.max(Duration::from_millis(10));
        tokio::spawn(async move {
            let mut ticker = time::interval(every);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
            loop {
                select! {
                    _ = t.cancelled() => break,
                    _ = ticker.tick() => store.beat(id).await,
                }
            }
        });
        Self { token }
    }
}

impl Drop for BeatGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Supervises execution of a single flow run.
pub(crate) struct RunActor {
    pub(crate) ctx: RunContext,
    pub(crate) store: Arc<RunStore>,
    pub(crate) bus: Bus,
    pub(crate) heartbeat_interval: Duration,
}

impl RunActor {
    /// Runs the actor until the run reaches a terminal state.
    pub(crate) async fn run(self) {
        let id = self.ctx.id;

        let _permit = select! {
            res = self.ctx.pool.acquire() => match res {
                Ok(permit) => permit,
                Err(_closed) => {
                    self.finish_failed(id, "work pool closed").await;
                    return;
                }
            },
            _ = self.ctx.cancel.cancelled() => {
                self.finish_failed(id, "run cancelled").await;
                return;
            }
        };

        // Lost a race with the heartbeat monitor or an explicit terminal
        // mark; nothing to execute.
        if !self.store.mark_running(id).await {
            return;
        }
        self.bus.publish(
            Event::now(EventKind::RunStarting)
                .with_deployment(Arc::clone(&self.ctx.deployment))
                .with_run(id),
        );

        let beat = BeatGuard::spawn(Arc::clone(&self.store), id, self.heartbeat_interval);
        let outcome = self.execute_steps(id).await;
        drop(beat);

        match outcome {
            RunOutcome::Completed => {
                self.store.mark_completed(id).await;
                self.bus.publish(
                    Event::now(EventKind::RunCompleted)
                        .with_deployment(Arc::clone(&self.ctx.deployment))
                        .with_run(id),
                );
            }
            RunOutcome::Cancelled => self.finish_failed(id, "run cancelled").await,
            RunOutcome::Failed(reason) => self.finish_failed(id, &reason).await,
        }
    }

    /// Executes the flow's steps in order, honoring per-task retry budgets.
    async fn execute_steps(&self, id: RunId) -> RunOutcome {
        for spec in self.ctx.flow.steps() {
            if self.ctx.cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            match self.run_step(spec, id).await {
                Ok(()) => {}
                Err(outcome) => return outcome,
            }
        }
        RunOutcome::Completed
    }

    /// Runs one step to success or a run-terminating failure.
    async fn run_step(&self, spec: &TaskSpec, id: RunId) -> Result<(), RunOutcome> {
        let retry = spec.retry();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.bus.publish(
                Event::now(EventKind::TaskStarting)
                    .with_run(id)
                    .with_task(spec.name())
                    .with_attempt(attempt),
            );

            match run_task_once(spec, &self.ctx.cancel, attempt, id, &self.bus).await {
                Ok(()) => return Ok(()),
                Err(TaskError::Canceled) => return Err(RunOutcome::Cancelled),
                Err(e) if e.is_retryable() && attempt <= retry.retries => {
                    let delay = retry.backoff.next(attempt - 1);
                    self.bus.publish(
                        Event::now(EventKind::RetryScheduled)
                            .with_run(id)
                            .with_task(spec.name())
                            .with_attempt(attempt)
                            .with_delay(delay)
                            .with_reason(e.to_string()),
                    );

                    let sleep = time::sleep(delay);
                    tokio::pin!(sleep);
                    select! {
                        _ = &mut sleep => {}
                        _ = self.ctx.cancel.cancelled() => return Err(RunOutcome::Cancelled),
                    }
                }
                Err(e) => {
                    return Err(RunOutcome::Failed(format!(
                        "task {:?} failed after {attempt} attempt(s): {e}",
                        spec.name()
                    )))
                }
            }
        }
    }

    async fn finish_failed(&self, id: RunId, reason: &str) {
        if self.store.mark_failed(id, reason).await {
            self.bus.publish(
                Event::now(EventKind::RunFailed)
                    .with_deployment(Arc::clone(&self.ctx.deployment))
                    .with_run(id)
                    .with_reason(reason),
            );
        }
    }
}
