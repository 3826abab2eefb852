//! # Orchestrator: the explicit context handle for the whole core.
//!
//! The [`Orchestrator`] owns the event bus, the [`SubscriberSet`], the work
//! pool manager, the deployment store, the run store, and the background
//! loops (scheduler, executor, heartbeat monitor). There is no process-wide
//! singleton: every operation goes through this handle, and its lifecycle is
//! explicit: [`Orchestrator::builder`] starts the loops,
//! [`Orchestrator::shutdown`] (or [`Orchestrator::run_until_shutdown`])
//! tears them down within the configured grace period.
//!
//! ## Key responsibilities
//! - register deployments (atomic upsert; the registrar surface)
//! - resolve work pools via [`WorkPoolManager`]
//! - answer run-status queries and run/deployment listings
//! - trigger ad-hoc runs and cancel scheduled ones
//! - fan bus events out to subscribers
//! - graceful shutdown bounded by [`Config::grace`]
//!
//! ## Example
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use flowvisor::{
//!     Config, DeployRequest, FlowBuilder, Orchestrator, PoolKind, PoolSpec,
//!     TaskError, TaskFn, TaskSpec,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = Orchestrator::builder(Config::default()).build();
//!
//!     let flow = FlowBuilder::new("hello-world")
//!         .step(TaskSpec::new(TaskFn::arc("greet", |_: CancellationToken| async {
//!             println!("Hello from flowvisor!");
//!             Ok::<(), TaskError>(())
//!         })))?
//!         .build()?;
//!
//!     orchestrator
//!         .deploy(
//!             DeployRequest::new("hello-world", flow, PoolSpec::new("local-pool", PoolKind::Process))
//!                 .with_schedule("* * * * *")
//!                 .with_tag("local"),
//!         )
//!         .await?;
//!
//!     orchestrator.run_until_shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::builder::OrchestratorBuilder;
use crate::core::shutdown;
use crate::deployments::{DeployRequest, Deployment, DeploymentId, DeploymentStore};
use crate::error::OrchestratorError;
use crate::events::{Bus, Event, EventKind};
use crate::pools::WorkPoolManager;
use crate::runs::{RunId, RunStore, RunView};
use crate::schedules::CronSchedule;
use crate::subscribers::SubscriberSet;

/// Coordinates deployments, schedules, pools, runs, and event delivery.
pub struct Orchestrator {
    pub(crate) cfg: Config,
    pub(crate) bus: Bus,
    #[allow(dead_code)] // held so subscriber workers live as long as the handle
    pub(crate) subs: Arc<SubscriberSet>,
    pub(crate) pools: Arc<WorkPoolManager>,
    pub(crate) deployments: Arc<DeploymentStore>,
    pub(crate) runs: Arc<RunStore>,
    pub(crate) run_tx: mpsc::Sender<RunId>,
    pub(crate) runtime_token: CancellationToken,
    /// Scheduler, executor, and monitor handles; taken by `shutdown`.
    pub(crate) loops: Mutex<Vec<JoinHandle<()>>>,
}

impl Orchestrator {
    /// Returns a builder; `build()` starts the background loops and must be
    /// called inside a tokio runtime.
    pub fn builder(cfg: Config) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg)
    }

    /// Returns the runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the event bus (subscribe for raw event access).
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Returns the work pool manager.
    pub fn pools(&self) -> &WorkPoolManager {
        &self.pools
    }

    /// Registers (or overwrites) a deployment.
    ///
    /// Validates the schedule and resolves the work pool first, then upserts
    /// the binding atomically; the previous schedule is cancelled before
    /// the new one can fire, and a failed request leaves nothing applied.
    pub async fn deploy(&self, req: DeployRequest) -> Result<DeploymentId, OrchestratorError> {
        let schedule = req
            .schedule
            .as_deref()
            .map(CronSchedule::parse)
            .transpose()?;
        let pool = self
            .pools
            .get_or_create(req.work_pool, req.create_pool_if_missing)
            .await?;

        let (record, replaced) = self
            .deployments
            .upsert(req.name, req.flow, pool, schedule, req.tags)
            .await;

        let kind = if replaced {
            EventKind::DeploymentUpdated
        } else {
            EventKind::DeploymentCreated
        };
        self.bus
            .publish(Event::now(kind).with_deployment(record.name_arc()));
        Ok(record.id())
    }

    /// Removes a deployment; its schedule stops before the next fire time.
    ///
    /// Runs already created keep executing and stay queryable.
    pub async fn remove_deployment(&self, name: &str) -> Result<(), OrchestratorError> {
        let removed = self.deployments.remove(name).await?;
        self.bus
            .publish(Event::now(EventKind::DeploymentRemoved).with_deployment(removed.name_arc()));
        Ok(())
    }

    /// Looks up a deployment record by name.
    pub async fn get_deployment(&self, name: &str) -> Result<Arc<Deployment>, OrchestratorError> {
        self.deployments.get(name).await
    }

    /// Returns all active deployments, sorted by name.
    pub async fn list_deployments(&self) -> Vec<Arc<Deployment>> {
        self.deployments.snapshot().await
    }

    /// Creates an ad-hoc run of a deployed flow, bypassing its schedule.
    pub async fn trigger(&self, name: &str) -> Result<RunId, OrchestratorError> {
        let deployment = self.deployments.get(name).await?;
        let id = self.runs.create(&deployment, Utc::now()).await;
        self.bus.publish(
            Event::now(EventKind::RunScheduled)
                .with_deployment(deployment.name_arc())
                .with_run(id),
        );
        self.run_tx
            .send(id)
            .await
            .map_err(|_| OrchestratorError::QueueClosed)?;
        Ok(id)
    }

    /// Returns the status snapshot of one run.
    pub async fn run_status(&self, id: RunId) -> Result<RunView, OrchestratorError> {
        self.runs.view(id).await
    }

    /// Returns snapshots of all runs (terminal runs are retained for audit).
    pub async fn list_runs(&self) -> Vec<RunView> {
        self.runs.list().await
    }

    /// Requests cooperative cancellation of a run.
    ///
    /// Stops issuing further tasks; a task already in progress is never
    /// interrupted. The run terminates FAILED with error `"run cancelled"`.
    pub async fn cancel_run(&self, id: RunId) -> Result<(), OrchestratorError> {
        self.runs.cancel(id).await
    }

    /// Blocks until an OS termination signal arrives, then shuts down.
    pub async fn run_until_shutdown(&self) -> Result<(), OrchestratorError> {
        let _ = shutdown::wait_for_shutdown_signal().await;
        self.shutdown().await
    }

    /// Stops the background loops and drains in-flight runs.
    ///
    /// Cancels the runtime token (run tokens are children, so cooperative
    /// tasks exit promptly) and waits up to [`Config::grace`]. On timeout,
    /// returns [`OrchestratorError::GraceExceeded`] listing the stuck runs.
    /// Idempotent: later calls are no-ops.
    pub async fn shutdown(&self) -> Result<(), OrchestratorError> {
        let loops: Vec<JoinHandle<()>> = {
            let mut guard = self.loops.lock().expect("loops mutex poisoned");
            std::mem::take(&mut *guard)
        };
        if loops.is_empty() {
            return Ok(());
        }

        self.bus.publish(Event::now(EventKind::ShutdownRequested));
        self.runtime_token.cancel();

        let drain = async {
            for handle in loops {
                let _ = handle.await;
            }
        };
        match tokio::time::timeout(self.cfg.grace, drain).await {
            Ok(()) => {
                self.bus.publish(Event::now(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                self.bus.publish(Event::now(EventKind::GraceExceeded));
                Err(OrchestratorError::GraceExceeded {
                    grace: self.cfg.grace,
                    running: self.runs.running().await,
                })
            }
        }
    }
}
