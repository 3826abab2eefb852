//! # Task registry - named registration scope for flow construction.
//!
//! A [`TaskRegistry`] records callable units of work together with their
//! declared execution metadata ([`TaskSpec`]). Registration replaces the
//! annotation-at-definition pattern seen in decorator-based orchestrators:
//! the caller registers explicitly, then composes flows from registered
//! names.
//!
//! ## Rules
//! - Names are unique within one registry (its scope is typically the flow
//!   under construction); re-registering a name fails with `DuplicateName`.
//! - Lookups return clones of the spec; the underlying task is shared via
//!   `Arc`, so the same task may appear in several flows by reference.

use std::collections::HashMap;

use crate::error::OrchestratorError;
use crate::tasks::TaskSpec;

/// Scoped, name-keyed collection of task specifications.
pub struct TaskRegistry {
    scope: String,
    tasks: HashMap<String, TaskSpec>,
}

impl TaskRegistry {
    /// Creates an empty registry with the given scope label.
    ///
    /// The scope appears in `DuplicateName` errors to identify the
    /// colliding namespace.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            tasks: HashMap::new(),
        }
    }

    /// Registers a task specification under its task's name.
    ///
    /// Fails with [`OrchestratorError::DuplicateName`] if the name is
    /// already taken in this registry; the existing entry is left untouched.
    pub fn register(&mut self, spec: TaskSpec) -> Result<(), OrchestratorError> {
        let name = spec.name().to_string();
        if self.tasks.contains_key(&name) {
            return Err(OrchestratorError::DuplicateName {
                scope: self.scope.clone(),
                name,
            });
        }
        self.tasks.insert(name, spec);
        Ok(())
    }

    /// Looks up a registered specification by name.
    ///
    /// Fails with [`OrchestratorError::TaskNotFound`] if absent.
    pub fn lookup(&self, name: &str) -> Result<TaskSpec, OrchestratorError> {
        self.tasks
            .get(name)
            .cloned()
            .ok_or_else(|| OrchestratorError::TaskNotFound {
                name: name.to_string(),
            })
    }

    /// Returns the registry's scope label.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns sorted registered task names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tasks.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
