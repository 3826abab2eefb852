//! # Cron schedules.
//!
//! - [`CronSchedule`] - validated 5-/6-field cron expression with fire-time
//!   evaluation
//! - [`CronFields`] - explicit field-count classification (minute vs second
//!   granularity)

mod cron;

pub use cron::{CronFields, CronSchedule};
