//! # Run executor - queue consumer and crash detection.
//!
//! [`RunExecutor`] consumes run ids from the scheduler queue and spawns one
//! [`RunActor`] per run. Each actor runs inside its own spawned task watched
//! by the executor: a panic that kills the actor mid-run is reported as a
//! CRASHED run instead of silently losing it.
//!
//! [`HeartbeatMonitor`] is the second crash detector: it periodically scans
//! RUNNING runs and marks those with stale heartbeats CRASHED. Crashed runs
//! are **not** retried automatically.
//!
//! ## Shutdown
//! On runtime cancellation the executor stops consuming and drains its
//! in-flight actors; run cancel tokens are children of the runtime token,
//! so cooperative tasks exit promptly and the orchestrator bounds the drain
//! with its grace period.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::core::actor::RunActor;
use crate::events::{Bus, Event, EventKind};
use crate::runs::{RunId, RunStore};

/// Consumes scheduled runs and supervises their actors.
pub(crate) struct RunExecutor {
    pub(crate) store: Arc<RunStore>,
    pub(crate) bus: Bus,
    pub(crate) heartbeat_interval: Duration,
}

impl RunExecutor {
    /// Spawns the consumer loop.
    pub(crate) fn spawn(
        self,
        rx: mpsc::Receiver<RunId>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(rx, token))
    }

    async fn run(self, mut rx: mpsc::Receiver<RunId>, token: CancellationToken) {
        let mut actors: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                next = rx.recv() => match next {
                    Some(id) => self.launch(id, &mut actors).await,
                    None => break,
                },
                Some(_) = actors.join_next(), if !actors.is_empty() => {}
            }
        }

        // Drain in-flight runs; cooperative tasks see the runtime token.
        while actors.join_next().await.is_some() {}
    }

    /// Spawns the actor for one run plus a watcher that reports panics.
    async fn launch(&self, id: RunId, actors: &mut JoinSet<()>) {
        // Gone or already terminal (e.g. cancelled while queued as far as
        // the monitor is concerned): nothing to execute.
        let Some(ctx) = self.store.context(id).await else {
            return;
        };
        let deployment = Arc::clone(&ctx.deployment);
        let actor = RunActor {
            ctx,
            store: Arc::clone(&self.store),
            bus: self.bus.clone(),
            heartbeat_interval: self.heartbeat_interval,
        };

        let store = Arc::clone(&self.store);
        let bus = self.bus.clone();
        actors.spawn(async move {
            let handle = tokio::spawn(actor.run());
            if handle.await.is_err() {
                let reason = "executor panicked mid-run";
                if store.mark_crashed(id, reason).await {
                    bus.publish(
                        Event::now(EventKind::RunCrashed)
                            .with_deployment(deployment)
                            .with_run(id)
                            .with_reason(reason),
                    );
                }
            }
        });
    }
}

/// Marks RUNNING runs with stale heartbeats as CRASHED.
pub(crate) struct HeartbeatMonitor {
    pub(crate) store: Arc<RunStore>,
    pub(crate) bus: Bus,
    pub(crate) interval: Duration,
    pub(crate) timeout: Duration,
}

impl HeartbeatMonitor {
    /// Spawns the scan loop.
    pub(crate) fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval.max(Duration::from_millis(10)));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => self.scan().await,
                }
            }
        })
    }

    async fn scan(&self) {
        for id in self.store.stale_running(self.timeout).await {
            if self.store.mark_crashed(id, "heartbeat timeout").await {
                let deployment = self
                    .store
                    .view(id)
                    .await
                    .map(|v| v.deployment)
                    .unwrap_or_default();
                self.bus.publish(
                    Event::now(EventKind::RunCrashed)
                        .with_deployment(deployment.as_str())
                        .with_run(id)
                        .with_reason("heartbeat timeout"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployments::Deployment;
    use crate::flows::FlowBuilder;
    use crate::pools::{PoolKind, PoolSpec, WorkPool};
    use crate::runs::RunStatus;
    use chrono::Utc;

    fn deployment() -> Deployment {
        let flow = FlowBuilder::new("demo").build().unwrap();
        let pool = WorkPool::from_spec(PoolSpec::new("local-pool", PoolKind::Process), 1);
        Deployment::new_for_tests("demo", flow, pool)
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_marks_stale_runs_crashed() {
        let token = CancellationToken::new();
        let store = Arc::new(RunStore::new(token.clone()));
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();

        // A run that went RUNNING but has no actor beating for it.
        let d = deployment();
        let id = store.create(&d, Utc::now()).await;
        store.mark_running(id).await;

        let monitor = HeartbeatMonitor {
            store: Arc::clone(&store),
            bus,
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
        .spawn(token.clone());

        // Paused clock: sleeping auto-advances time and lets the monitor tick.
        let mut crashed = false;
        for _ in 0..60 {
            tokio::time::sleep(Duration::from_secs(1)).await;
            if store.view(id).await.unwrap().status == RunStatus::Crashed {
                crashed = true;
                break;
            }
        }
        assert!(crashed, "stale run was not marked crashed");

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::RunCrashed);
        assert_eq!(ev.run, Some(id));
        assert_eq!(ev.reason.as_deref(), Some("heartbeat timeout"));

        token.cancel();
        let _ = monitor.await;
    }
}
