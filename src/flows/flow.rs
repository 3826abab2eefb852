//! # Immutable flow graph.
//!
//! A [`Flow`] is the unit a deployment binds to a schedule and a work pool:
//! a name plus an ordered sequence of task steps. The sequence IS the
//! execution order: there is no implicit parallelism, and a run never
//! starts a step before the previous one finished.
//!
//! Flows are cheap to clone (`Arc` internals) and immutable after
//! construction; build them with [`FlowBuilder`](crate::FlowBuilder).

use std::sync::Arc;

use crate::tasks::TaskSpec;

/// Immutable, ordered composition of tasks.
#[derive(Clone)]
pub struct Flow {
    name: Arc<str>,
    steps: Arc<[TaskSpec]>,
}

impl Flow {
    pub(crate) fn from_parts(name: Arc<str>, steps: Vec<TaskSpec>) -> Self {
        Self {
            name,
            steps: steps.into(),
        }
    }

    /// Returns the flow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the steps in execution order.
    pub fn steps(&self) -> &[TaskSpec] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if the flow has no steps (such a run completes immediately).
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.name)
            .field("steps", &self.steps.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}
