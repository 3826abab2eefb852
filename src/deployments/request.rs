//! # Deployment registration request.
//!
//! [`DeployRequest`] carries everything `Orchestrator::deploy` needs to bind
//! a flow to a schedule and a work pool. The pool is referenced by spec so a
//! first deployment can create it on demand (`create_pool_if_missing`,
//! enabled by default); set the flag to false to require an existing pool.

use crate::flows::Flow;
use crate::pools::PoolSpec;

/// Parameters for registering (or overwriting) one deployment.
#[derive(Clone, Debug)]
pub struct DeployRequest {
    /// Unique deployment name; re-deploying a name overwrites its binding.
    pub name: String,
    /// The flow to execute.
    pub flow: Flow,
    /// Work pool reference and creation parameters.
    pub work_pool: PoolSpec,
    /// Optional cron expression (5- or 6-field).
    pub schedule: Option<String>,
    /// Deployment tags.
    pub tags: Vec<String>,
    /// Create the pool on first reference if it does not exist yet.
    pub create_pool_if_missing: bool,
}

impl DeployRequest {
    /// Creates a request binding `flow` to the given pool, with no schedule.
    pub fn new(name: impl Into<String>, flow: Flow, work_pool: PoolSpec) -> Self {
        Self {
            name: name.into(),
            flow,
            work_pool,
            schedule: None,
            tags: Vec::new(),
            create_pool_if_missing: true,
        }
    }

    /// Sets the cron schedule expression.
    pub fn with_schedule(mut self, cron: impl Into<String>) -> Self {
        self.schedule = Some(cron.into());
        self
    }

    /// Adds one tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Requires the pool to exist already (no on-demand creation).
    pub fn require_existing_pool(mut self) -> Self {
        self.create_pool_if_missing = false;
        self
    }
}
