//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the orchestrator runtime.
//!
//! Config is used in two ways:
//! 1. **Orchestrator creation**: `Orchestrator::builder(config)`
//! 2. **TaskSpec defaults**: `TaskSpec::with_defaults(task, &config)`
//!
//! ## Sentinel values
//! - `task_timeout = 0s` → no per-attempt timeout (treated as `None`)
//! - `bus_capacity` is clamped to a minimum of 1 by the bus

use std::time::Duration;

use crate::policies::RetryPolicy;

/// Global configuration for the orchestrator runtime.
///
/// Defines:
/// - **Shutdown behavior**: grace period for graceful termination
/// - **Event system**: bus capacity for event delivery
/// - **Scheduling**: run queue depth between scheduler and executor
/// - **Pools**: default capacity for pools created without an explicit one
/// - **Crash detection**: heartbeat cadence and staleness threshold
/// - **Task defaults**: retry policy and per-attempt timeout
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for in-flight runs after a shutdown request.
    ///
    /// When shutdown starts:
    /// - runs are cancelled via their `CancellationToken`s
    /// - the orchestrator waits up to `grace` for the executor to drain
    /// - on timeout, `OrchestratorError::GraceExceeded` lists stuck runs
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// observe `Lagged` and skip older items. Minimum value is 1.
    pub bus_capacity: usize,

    /// Depth of the scheduler → executor run queue.
    ///
    /// The scheduler awaits queue space, so a full queue delays emission
    /// rather than dropping runs.
    pub run_queue_capacity: usize,

    /// Capacity assigned to work pools created without an explicit capacity.
    ///
    /// One unit of capacity is one concurrently RUNNING flow run.
    pub default_pool_capacity: usize,

    /// How often a running flow run refreshes its heartbeat.
    pub heartbeat_interval: Duration,

    /// Age past which a RUNNING run with no fresh heartbeat is declared CRASHED.
    pub heartbeat_timeout: Duration,

    /// Default per-attempt task timeout.
    ///
    /// - `Duration::ZERO` = no timeout (attempt runs until completion)
    /// - `> 0` = timeout applied per task attempt
    ///
    /// Used by `TaskSpec::with_defaults()`. Can be overridden per task.
    pub task_timeout: Duration,

    /// Default retry policy for tasks.
    ///
    /// Used by `TaskSpec::with_defaults()`. Can be overridden per task.
    pub retry: RetryPolicy,
}

impl Config {
    /// Returns the default per-attempt timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → timeout applied per attempt
    #[inline]
    pub fn default_task_timeout(&self) -> Option<Duration> {
        if self.task_timeout == Duration::ZERO {
            None
        } else {
            Some(self.task_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a run queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn run_queue_capacity_clamped(&self) -> usize {
        self.run_queue_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    /// - `run_queue_capacity = 256`
    /// - `default_pool_capacity = 1` (runs of one pool execute serially)
    /// - `heartbeat_interval = 1s`, `heartbeat_timeout = 30s`
    /// - `task_timeout = 0s` (no timeout)
    /// - `retry = RetryPolicy::default()` (no retries)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            run_queue_capacity: 256,
            default_pool_capacity: 1,
            heartbeat_interval: Duration::from_secs(1),
            heartbeat_timeout: Duration::from_secs(30),
            task_timeout: Duration::from_secs(0),
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_means_none() {
        let cfg = Config::default();
        assert_eq!(cfg.default_task_timeout(), None);

        let cfg = Config {
            task_timeout: Duration::from_secs(5),
            ..Config::default()
        };
        assert_eq!(cfg.default_task_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_capacities_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            run_queue_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.run_queue_capacity_clamped(), 1);
    }
}
