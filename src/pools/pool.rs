//! # Work pool: a named, typed allocation of run capacity.
//!
//! A [`WorkPool`] owns a capacity counter realized as a fair
//! [`Semaphore`]: one permit is one concurrently RUNNING flow run. Run
//! actors acquire a permit before entering RUNNING and hold it until the run
//! reaches a terminal state, so permits release on completion and failure
//! alike.
//!
//! The pool type ([`PoolKind`]) and the descriptive metadata (description,
//! labels, tags) are registration-time attributes; the minimal core executes
//! every run in-process regardless of kind.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Pool type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Runs execute as local processes.
    Process,
    /// Runs execute in containers.
    Docker,
    /// Runs execute on a Kubernetes cluster.
    Kubernetes,
}

impl std::fmt::Display for PoolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PoolKind::Process => "process",
            PoolKind::Docker => "docker",
            PoolKind::Kubernetes => "kubernetes",
        };
        f.write_str(s)
    }
}

impl FromStr for PoolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "process" => Ok(PoolKind::Process),
            "docker" => Ok(PoolKind::Docker),
            "kubernetes" => Ok(PoolKind::Kubernetes),
            other => Err(format!("unknown pool kind {other:?}")),
        }
    }
}

/// Creation parameters for a work pool.
///
/// `capacity = 0` means "use the orchestrator default" (1 unless configured
/// otherwise).
#[derive(Clone, Debug)]
pub struct PoolSpec {
    /// Unique, process-wide pool name.
    pub name: String,
    /// Pool type; a name can only ever be bound to one kind.
    pub kind: PoolKind,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Label key/value pairs.
    pub labels: HashMap<String, String>,
    /// Tag list.
    pub tags: Vec<String>,
    /// Concurrent-run capacity; 0 = orchestrator default.
    pub capacity: usize,
}

impl PoolSpec {
    /// Creates a spec with the given name and kind and no metadata.
    pub fn new(name: impl Into<String>, kind: PoolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            labels: HashMap::new(),
            tags: Vec::new(),
            capacity: 0,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds one label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Adds one tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets an explicit capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// A named, typed allocation of execution capacity.
pub struct WorkPool {
    name: Arc<str>,
    kind: PoolKind,
    description: Option<String>,
    labels: HashMap<String, String>,
    tags: Vec<String>,
    capacity: usize,
    permits: Arc<Semaphore>,
}

impl WorkPool {
    /// Builds a pool from a spec, resolving `capacity = 0` to the default.
    pub(crate) fn from_spec(spec: PoolSpec, default_capacity: usize) -> Arc<Self> {
        let capacity = if spec.capacity == 0 {
            default_capacity.max(1)
        } else {
            spec.capacity
        };
        Arc::new(Self {
            name: spec.name.into(),
            kind: spec.kind,
            description: spec.description,
            labels: spec.labels,
            tags: spec.tags,
            capacity,
            permits: Arc::new(Semaphore::new(capacity)),
        })
    }

    /// Returns the pool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pool kind.
    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    /// Returns the description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the label map.
    pub fn labels(&self) -> &HashMap<String, String> {
        &self.labels
    }

    /// Returns the tags.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the currently free capacity.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Acquires one unit of capacity; resolves when a unit frees up.
    ///
    /// The semaphore is fair, so waiters are served in acquisition order;
    /// this is what keeps runs of one deployment starting in fire-time
    /// order. Fails only if the pool is closed (never, in the current core).
    pub(crate) async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        Arc::clone(&self.permits).acquire_owned().await
    }
}

impl std::fmt::Debug for WorkPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkPool")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}
