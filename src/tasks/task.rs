//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable). The common
//! handle type is [`TaskRef`], an `Arc<dyn Task>` suitable for sharing across
//! flows: flows reference tasks, they never own them exclusively.
//!
//! A task receives a [`CancellationToken`] and should periodically check it
//! to stop cooperatively when its run is cancelled.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared reference to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit of work within a flow.
///
/// A `Task` has a stable [`name`](Task::name) (unique within its flow) and an
/// async [`run`](Task::run) method that receives a [`CancellationToken`].
/// Implementors should regularly check cancellation and exit promptly; the
/// executor never interrupts an attempt that is already in progress.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use flowvisor::{Task, TaskError};
///
/// struct Greet;
///
/// #[async_trait]
/// impl Task for Greet {
///     fn name(&self) -> &str { "greet" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         println!("Hello from flowvisor!");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes one attempt of the task until completion or cancellation.
    ///
    /// Implementations should check `ctx.is_cancelled()` and return
    /// [`TaskError::Canceled`] quickly to honor cooperative cancellation.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}
