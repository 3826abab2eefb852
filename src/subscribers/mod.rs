//! # Event subscribers for the flowvisor runtime.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out used to deliver runtime events broadcast through the
//! [`Bus`](crate::events::Bus) to user code.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   RunActor / Scheduler ── publish(Event) ──► Bus ──► orchestrator listener
//!                                                          │
//!                                                  SubscriberSet::emit()
//!                                                 ┌────────┼────────┐
//!                                                 ▼        ▼        ▼
//!                                            [queue S1][queue S2][queue SN]
//!                                                 ▼        ▼        ▼
//!                                             worker 1  worker 2  worker N
//!                                                 ▼        ▼        ▼
//!                                             on_event  on_event  on_event
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use flowvisor::{Subscribe, Event, EventKind};
//! use async_trait::async_trait;
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::RunFailed {
//!             // increment a counter, page someone, ...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
