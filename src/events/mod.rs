//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the scheduler, executor,
//! run actors, pool manager and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Orchestrator`, scheduler loop, `RunActor`,
//!   `runner::run_task_once`, `WorkPoolManager`, `SubscriberSet` workers
//!   (overflow/panic).
//! - **Consumer**: `Orchestrator`'s subscriber listener, which fans events
//!   out to the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
