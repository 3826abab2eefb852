//! # Flow graph builder.
//!
//! [`FlowBuilder`] composes task specifications into an immutable [`Flow`].
//! Call order is preserved as execution order; duplicate task names within
//! one flow are rejected at append time, so a finished builder always yields
//! a valid flow.
//!
//! Steps can be appended directly ([`FlowBuilder::step`]) or pulled from a
//! [`TaskRegistry`](crate::TaskRegistry) by name
//! ([`FlowBuilder::steps_from`]).
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use flowvisor::{FlowBuilder, OrchestratorError, TaskFn, TaskSpec};
//!
//! # fn main() -> Result<(), OrchestratorError> {
//! # use flowvisor::TaskError;
//! let flow = FlowBuilder::new("hello-world")
//!     .step(TaskSpec::new(TaskFn::arc("greet", |_: CancellationToken| async {
//!         Ok::<(), TaskError>(())
//!     })))?
//!     .step(TaskSpec::new(TaskFn::arc("goodbye", |_: CancellationToken| async {
//!         Ok::<(), TaskError>(())
//!     })))?
//!     .build()?;
//!
//! assert_eq!(flow.name(), "hello-world");
//! assert_eq!(flow.steps().len(), 2);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::OrchestratorError;
use crate::flows::Flow;
use crate::tasks::{TaskRegistry, TaskSpec};

/// Validating builder for [`Flow`]s.
#[derive(Debug)]
pub struct FlowBuilder {
    name: Arc<str>,
    steps: Vec<TaskSpec>,
    seen: HashSet<String>,
}

impl FlowBuilder {
    /// Creates a builder for a flow with the given name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Appends one step; it will execute after all previously appended steps.
    ///
    /// Fails with [`OrchestratorError::DuplicateName`] if a step with the
    /// same task name is already present in this flow.
    pub fn step(mut self, spec: TaskSpec) -> Result<Self, OrchestratorError> {
        if !self.seen.insert(spec.name().to_string()) {
            return Err(OrchestratorError::DuplicateName {
                scope: self.name.to_string(),
                name: spec.name().to_string(),
            });
        }
        self.steps.push(spec);
        Ok(self)
    }

    /// Appends steps looked up from a registry, in the order given.
    ///
    /// Fails with [`OrchestratorError::TaskNotFound`] for an unregistered
    /// name, or [`OrchestratorError::DuplicateName`] for a repeat.
    pub fn steps_from<'a, I>(
        mut self,
        registry: &TaskRegistry,
        names: I,
    ) -> Result<Self, OrchestratorError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            let spec = registry.lookup(name)?;
            self = self.step(spec)?;
        }
        Ok(self)
    }

    /// Finishes construction and returns the immutable flow.
    pub fn build(self) -> Result<Flow, OrchestratorError> {
        Ok(Flow::from_parts(self.name, self.steps))
    }
}
