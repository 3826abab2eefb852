//! # flowvisor
//!
//! **Flowvisor** is a minimal workflow-orchestration core for Rust.
//!
//! It provides primitives to compose named tasks into ordered flows, bind
//! flows to cron schedules and typed work pools as deployments, and execute
//! the resulting flow runs under supervision with per-task retries and
//! heartbeat-based crash detection. The crate is designed as a building
//! block for higher-level orchestration services.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!  │ TaskRegistry │───►│ FlowBuilder  │───►│     Flow     │
//!  │ (named specs)│    │ (call order) │    │ (immutable)  │
//!  └──────────────┘    └──────────────┘    └──────┬───────┘
//!                                                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator (explicit context handle)                           │
//! │  - Bus (broadcast events) + SubscriberSet (fan-out)               │
//! │  - WorkPoolManager (typed pools, semaphore capacity)              │
//! │  - DeploymentStore (atomic upsert, change notify)                 │
//! │  - RunStore (run state machine + heartbeats)                      │
//! └──────┬──────────────────────┬─────────────────────────┬───────────┘
//!        ▼                      ▼                         ▼
//! ┌──────────────┐      ┌──────────────┐          ┌──────────────────┐
//! │SchedulerLoop │ ───► │ RunExecutor  │ ───────► │ HeartbeatMonitor │
//! │(single timer)│ runs │ (queue +     │ watches  │ (stale RUNNING   │
//! │ cron fires   │      │  RunActors)  │  panics  │   → CRASHED)     │
//! └──────────────┘      └──────┬───────┘          └──────────────────┘
//!                              │ per run: permit → tasks in order
//!                              ▼
//!                    Bus ──► subscriber listener ──► user subscribers
//! ```
//!
//! ### Run lifecycle
//! ```text
//! deploy(name, flow, pool, cron?, tags)
//!   └─► DeploymentStore upsert (atomic; old schedule cannot fire again)
//!
//! SchedulerLoop: sleep until earliest fire
//!   └─► due fire ─► FlowRun PENDING ─► run queue
//!
//! RunActor::run()
//!   ├─► acquire pool permit (capacity 1 by default)
//!   ├─► RUNNING (heartbeat guard starts beating)
//!   ├─► tasks strictly in declared order
//!   │     └─ failure: re-invoke same task up to its retry budget,
//!   │        then FAILED (remaining tasks skipped)
//!   ├─► COMPLETED when every task succeeded
//!   └─► CRASHED when the executor dies (panic or stale heartbeat)
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types / traits                    |
//! |-------------------|--------------------------------------------------------------------|---------------------------------------|
//! | **Tasks & flows** | Define tasks as functions or trait impls, compose ordered flows.   | [`Task`], [`TaskFn`], [`FlowBuilder`] |
//! | **Scheduling**    | Explicit 5-/6-field cron with a single cooperative timer.          | [`CronSchedule`], [`CronFields`]      |
//! | **Work pools**    | Named, typed capacity; created on first reference.                 | [`PoolSpec`], [`WorkPoolManager`]     |
//! | **Deployments**   | Atomic name-keyed upsert of flow + schedule + pool.                | [`DeployRequest`], [`Deployment`]     |
//! | **Runs**          | PENDING→RUNNING→terminal state machine, retained for audit.        | [`RunStatus`], [`RunView`]            |
//! | **Policies**      | Per-task retry budget with backoff and jitter.                     | [`RetryPolicy`], [`BackoffPolicy`]    |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom subscribers). | [`Subscribe`]                         |
//! | **Errors**        | Typed errors for orchestration and task execution.                 | [`OrchestratorError`], [`TaskError`]  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
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
//!         .step(TaskSpec::new(TaskFn::arc("goodbye", |_: CancellationToken| async {
//!             println!("Goodbye from flowvisor!");
//!             Ok::<(), TaskError>(())
//!         })))?
//!         .build()?;
//!
//!     orchestrator
//!         .deploy(
//!             DeployRequest::new("hello-world", flow, PoolSpec::new("local-pool", PoolKind::Process))
//!                 .with_schedule("* * * * *") // every minute
//!                 .with_tag("local")
//!                 .with_tag("test"),
//!         )
//!         .await?;
//!
//!     orchestrator.run_until_shutdown().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod deployments;
mod error;
mod events;
mod flows;
mod policies;
mod pools;
mod runs;
mod schedules;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{Orchestrator, OrchestratorBuilder};
pub use config::Config;
pub use deployments::{DeployRequest, Deployment, DeploymentId};
pub use error::{OrchestratorError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use flows::{Flow, FlowBuilder};
pub use policies::{BackoffPolicy, JitterPolicy, RetryPolicy};
pub use pools::{PoolKind, PoolSpec, WorkPool, WorkPoolManager};
pub use runs::{RunId, RunStatus, RunView};
pub use schedules::{CronFields, CronSchedule};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Task, TaskFn, TaskRef, TaskRegistry, TaskSpec};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
