//! # Deployment record.
//!
//! A [`Deployment`] binds one flow to one work pool and, optionally, a cron
//! schedule. Records are immutable; re-deploying a name installs a fresh
//! record with a bumped generation while keeping the stable
//! [`DeploymentId`].

use std::sync::Arc;

use crate::flows::Flow;
use crate::pools::WorkPool;
use crate::schedules::CronSchedule;

/// Stable identifier of a deployment name.
///
/// Survives re-deployments of the same name; a fresh name gets a fresh id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeploymentId(u64);

impl DeploymentId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted binding of a flow to a schedule and a work pool.
pub struct Deployment {
    id: DeploymentId,
    name: Arc<str>,
    flow: Flow,
    pool: Arc<WorkPool>,
    schedule: Option<CronSchedule>,
    tags: Vec<String>,
    generation: u64,
}

impl Deployment {
    pub(crate) fn new(
        id: DeploymentId,
        name: Arc<str>,
        flow: Flow,
        pool: Arc<WorkPool>,
        schedule: Option<CronSchedule>,
        tags: Vec<String>,
        generation: u64,
    ) -> Self {
        Self {
            id,
            name,
            flow,
            pool,
            schedule,
            tags,
            generation,
        }
    }

    /// Returns the stable deployment id.
    pub fn id(&self) -> DeploymentId {
        self.id
    }

    /// Returns the deployment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Returns the bound flow.
    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    /// Returns the bound work pool.
    pub fn pool(&self) -> &WorkPool {
        &self.pool
    }

    pub(crate) fn pool_arc(&self) -> Arc<WorkPool> {
        Arc::clone(&self.pool)
    }

    /// Returns the schedule, if the deployment has one.
    pub fn schedule(&self) -> Option<&CronSchedule> {
        self.schedule.as_ref()
    }

    /// Returns the deployment tags.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the upsert generation (1 for the first deploy of a name).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub(crate) fn new_for_tests(name: &str, flow: Flow, pool: Arc<WorkPool>) -> Self {
        Self::new(
            DeploymentId::from_raw(0),
            name.into(),
            flow,
            pool,
            None,
            Vec::new(),
            1,
        )
    }
}

impl std::fmt::Debug for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployment")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("flow", &self.flow.name())
            .field("pool", &self.pool.name())
            .field("schedule", &self.schedule.as_ref().map(|s| s.expression()))
            .field("generation", &self.generation)
            .finish()
    }
}
