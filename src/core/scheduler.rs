//! # Scheduler loop - single cooperative timer over all deployments.
//!
//! Evaluates every scheduled deployment's cron expression, emits one PENDING
//! flow run per due fire time, and sleeps until the earliest upcoming fire.
//! There is exactly one timer; the loop never busy-polls.
//!
//! ## Wakeups
//! ```text
//! loop {
//!   arm change-notification (latched)
//!   snapshot deployments
//!   emit all due fires (watermark dedup) ──► RunStore + run queue
//!   compute earliest upcoming fire
//!   select {
//!     runtime cancelled  → exit
//!     store changed      → re-snapshot immediately
//!     sleep(next fire)   → re-snapshot
//!   }
//! }
//! ```
//!
//! ## Rules
//! - **At-least-once with dedup**: a loop stall emits every missed fire of
//!   an unchanged deployment on catch-up; the per-deployment watermark
//!   (last emitted fire time) dedups by (deployment, fire_time).
//! - **Re-deploy resets the basis**: a new generation starts firing from
//!   "now" and never catches up fires of the replaced schedule; the
//!   watermark carries across generations so the same boundary cannot fire
//!   twice.
//! - **Cancellation before next fire**: upsert/remove signal the latched
//!   notifier inside the store's critical section, so the loop re-snapshots
//!   before its old sleep target can fire.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::deployments::{Deployment, DeploymentStore};
use crate::events::{Bus, Event, EventKind};
use crate::runs::{RunId, RunStore};

/// Sleep horizon when nothing is scheduled; change notifications cut it short.
const IDLE_SLEEP: Duration = Duration::from_secs(300);

/// Per-deployment emission watermark.
#[derive(Clone, Copy)]
struct Watermark {
    generation: u64,
    fire: DateTime<Utc>,
}

/// The scheduler's half of the orchestrator runtime.
pub(crate) struct SchedulerLoop {
    pub(crate) deployments: Arc<DeploymentStore>,
    pub(crate) runs: Arc<RunStore>,
    pub(crate) bus: Bus,
    pub(crate) run_tx: mpsc::Sender<RunId>,
}

impl SchedulerLoop {
    /// Spawns the loop; it exits on runtime cancellation or a closed queue.
    pub(crate) fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(token))
    }

    async fn run(self, token: CancellationToken) {
        let mut watermarks: HashMap<String, Watermark> = HashMap::new();

        loop {
            // Armed before the snapshot: a change landing in between is
            // latched and completes the select immediately.
            let changed = self.deployments.changed();
            tokio::pin!(changed);

            let snapshot = self.deployments.snapshot().await;
            let now = Utc::now();
            let mut next_wake: Option<DateTime<Utc>> = None;

            for deployment in &snapshot {
                match self
                    .emit_due_fires(deployment, now, &mut watermarks)
                    .await
                {
                    Ok(upcoming) => {
                        next_wake = match (next_wake, upcoming) {
                            (Some(a), Some(b)) => Some(a.min(b)),
                            (a, b) => a.or(b),
                        };
                    }
                    // Queue closed: the executor is gone, nothing to do.
                    Err(()) => return,
                }
            }

            // Forget watermarks of removed deployments so a re-created name
            // starts fresh.
            watermarks.retain(|name, _| snapshot.iter().any(|d| d.name() == name.as_str()));

            let sleep_for = match next_wake {
                Some(wake) => (wake - Utc::now()).to_std().unwrap_or(Duration::ZERO),
                None => IDLE_SLEEP,
            };

            tokio::select! {
                _ = token.cancelled() => return,
                _ = &mut changed => continue,
                _ = tokio::time::sleep(sleep_for) => continue,
            }
        }
    }

    /// Emits every due fire of one deployment; returns its next upcoming
    /// fire time (if any) for the sleep computation.
    async fn emit_due_fires(
        &self,
        deployment: &Deployment,
        now: DateTime<Utc>,
        watermarks: &mut HashMap<String, Watermark>,
    ) -> Result<Option<DateTime<Utc>>, ()> {
        let Some(schedule) = deployment.schedule() else {
            return Ok(None);
        };

        let wm = watermarks.get(deployment.name()).copied();

        // Same generation: continue one second past the last emission
        // (cron's finest granularity). New or replaced binding: start from
        // now; a fresh schedule never backfills its predecessor's fires.
        let mut basis = match wm {
            Some(w) if w.generation == deployment.generation() => {
                w.fire + ChronoDuration::seconds(1)
            }
            _ => now,
        };

        loop {
            let Some(fire) = schedule.next_fire_time(basis) else {
                return Ok(None);
            };
            if fire > now {
                return Ok(Some(fire));
            }

            // Dedup across generations: the boundary the old binding already
            // fired must not fire again under the new one.
            if wm.map_or(true, |w| fire > w.fire) {
                self.emit(deployment, fire).await?;
            }
            watermarks.insert(
                deployment.name().to_string(),
                Watermark {
                    generation: deployment.generation(),
                    fire,
                },
            );
            basis = fire + ChronoDuration::seconds(1);
        }
    }

    /// Creates a PENDING run for the fire time and hands it to the executor.
    async fn emit(&self, deployment: &Deployment, fire: DateTime<Utc>) -> Result<(), ()> {
        let id = self.runs.create(deployment, fire).await;
        self.bus.publish(
            Event::now(EventKind::RunScheduled)
                .with_deployment(deployment.name_arc())
                .with_run(id)
                .with_fire_time(fire),
        );
        self.run_tx.send(id).await.map_err(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::FlowBuilder;
    use crate::pools::{PoolKind, PoolSpec, WorkPool};
    use crate::schedules::CronSchedule;
    use crate::tasks::{TaskFn, TaskSpec};
    use crate::TaskError;

    #[tokio::test]
    async fn test_due_fires_are_emitted_and_deduplicated() {
        let deployments = Arc::new(DeploymentStore::new());
        let token = CancellationToken::new();
        let runs = Arc::new(RunStore::new(token.clone()));
        let bus = Bus::new(64);
        let (tx, mut rx) = mpsc::channel(16);

        let flow = FlowBuilder::new("tick")
            .step(TaskSpec::new(TaskFn::arc(
                "noop",
                |_ctx: tokio_util::sync::CancellationToken| async { Ok::<(), TaskError>(()) },
            )))
            .unwrap()
            .build()
            .unwrap();
        let pool = WorkPool::from_spec(PoolSpec::new("local-pool", PoolKind::Process), 1);
        let schedule = CronSchedule::parse("* * * * * *").unwrap();
        deployments
            .upsert("tick".into(), flow, pool, Some(schedule), vec![])
            .await;

        let loop_handle = SchedulerLoop {
            deployments: Arc::clone(&deployments),
            runs: Arc::clone(&runs),
            bus,
            run_tx: tx,
        }
        .spawn(token.clone());

        // An every-second schedule must fire at least once in 1.5s.
        let first = tokio::time::timeout(Duration::from_millis(1500), rx.recv())
            .await
            .expect("a fire within 1.5s")
            .expect("queue open");
        let view = runs.view(first).await.unwrap();
        assert_eq!(view.deployment, "tick");

        // No duplicate (deployment, fire_time) emissions.
        tokio::time::sleep(Duration::from_millis(1200)).await;
        let all = runs.list().await;
        let mut fire_times: Vec<_> = all.iter().map(|v| v.scheduled_for).collect();
        fire_times.sort();
        fire_times.dedup();
        assert_eq!(fire_times.len(), all.len(), "duplicate fire emitted");

        token.cancel();
        let _ = loop_handle.await;
    }

    #[tokio::test]
    async fn test_redeploy_cancels_prior_schedule() {
        let deployments = Arc::new(DeploymentStore::new());
        let token = CancellationToken::new();
        let runs = Arc::new(RunStore::new(token.clone()));
        let bus = Bus::new(64);
        let (tx, mut rx) = mpsc::channel(64);

        let flow = FlowBuilder::new("tick").build().unwrap();
        let pool = WorkPool::from_spec(PoolSpec::new("local-pool", PoolKind::Process), 1);
        deployments
            .upsert(
                "tick".into(),
                flow.clone(),
                Arc::clone(&pool),
                Some(CronSchedule::parse("* * * * * *").unwrap()),
                vec![],
            )
            .await;

        let loop_handle = SchedulerLoop {
            deployments: Arc::clone(&deployments),
            runs: Arc::clone(&runs),
            bus,
            run_tx: tx,
        }
        .spawn(token.clone());

        tokio::time::timeout(Duration::from_millis(1500), rx.recv())
            .await
            .expect("a fire within 1.5s");

        // Rebind the name to a schedule that cannot fire during this test.
        deployments
            .upsert(
                "tick".into(),
                flow,
                pool,
                Some(CronSchedule::parse("0 0 1 1 *").unwrap()),
                vec![],
            )
            .await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        while rx.try_recv().is_ok() {}

        // The every-second schedule was replaced: nothing may fire now.
        let late = tokio::time::timeout(Duration::from_millis(1300), rx.recv()).await;
        assert!(late.is_err(), "old schedule fired after re-deploy");

        token.cancel();
        let _ = loop_handle.await;
    }

    #[tokio::test]
    async fn test_removed_deployment_stops_firing() {
        let deployments = Arc::new(DeploymentStore::new());
        let token = CancellationToken::new();
        let runs = Arc::new(RunStore::new(token.clone()));
        let bus = Bus::new(64);
        let (tx, mut rx) = mpsc::channel(64);

        let flow = FlowBuilder::new("tick").build().unwrap();
        let pool = WorkPool::from_spec(PoolSpec::new("local-pool", PoolKind::Process), 1);
        let schedule = CronSchedule::parse("* * * * * *").unwrap();
        deployments
            .upsert("tick".into(), flow, pool, Some(schedule), vec![])
            .await;

        let loop_handle = SchedulerLoop {
            deployments: Arc::clone(&deployments),
            runs: Arc::clone(&runs),
            bus,
            run_tx: tx,
        }
        .spawn(token.clone());

        // Wait for the first fire, then remove the deployment.
        tokio::time::timeout(Duration::from_millis(1500), rx.recv())
            .await
            .expect("a fire within 1.5s");
        deployments.remove("tick").await.unwrap();
        // Drain anything emitted before the removal was observed.
        tokio::time::sleep(Duration::from_millis(100)).await;
        while rx.try_recv().is_ok() {}

        // No fire may arrive after cancellation took effect.
        let late = tokio::time::timeout(Duration::from_millis(1300), rx.recv()).await;
        assert!(late.is_err(), "schedule fired after removal");

        token.cancel();
        let _ = loop_handle.await;
    }
}
