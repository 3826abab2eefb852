//! # Work pool manager - name-keyed pool store with get-or-create.
//!
//! Tracks named pools of worker capacity and creates them on demand. The
//! name is the identity: once a name is bound to a [`PoolKind`], any request
//! for the same name with a different kind fails, and re-requests with the
//! matching kind return the **same** pool instance (so capacity accounting
//! is shared by everyone referencing the name).
//!
//! ## Rules
//! - Lookup and creation happen under one write lock (no create/create race).
//! - Creation publishes [`EventKind::PoolCreated`].
//! - Metadata from the spec only applies at creation time; an existing pool
//!   keeps its original description/labels/tags.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::OrchestratorError;
use crate::events::{Bus, Event, EventKind};
use crate::pools::{PoolSpec, WorkPool};

/// Name-keyed store of work pools.
pub struct WorkPoolManager {
    pools: RwLock<HashMap<String, Arc<WorkPool>>>,
    bus: Bus,
    default_capacity: usize,
}

impl WorkPoolManager {
    /// Creates an empty manager.
    ///
    /// `default_capacity` applies to pools created from specs with
    /// `capacity = 0`.
    pub fn new(bus: Bus, default_capacity: usize) -> Self {
        Self {
            pools: RwLock::new(HashMap::new()),
            bus,
            default_capacity,
        }
    }

    /// Returns the pool with the spec's name, creating it if allowed.
    ///
    /// - Name exists with the same kind → the existing pool.
    /// - Name exists with a different kind →
    ///   [`OrchestratorError::PoolTypeMismatch`].
    /// - Name absent, `create_if_not_found` → a new pool built from the
    ///   spec.
    /// - Name absent otherwise → [`OrchestratorError::PoolNotFound`].
    pub async fn get_or_create(
        &self,
        spec: PoolSpec,
        create_if_not_found: bool,
    ) -> Result<Arc<WorkPool>, OrchestratorError> {
        let mut pools = self.pools.write().await;

        if let Some(existing) = pools.get(&spec.name) {
            if existing.kind() != spec.kind {
                return Err(OrchestratorError::PoolTypeMismatch {
                    name: spec.name,
                    existing: existing.kind(),
                    requested: spec.kind,
                });
            }
            return Ok(Arc::clone(existing));
        }

        if !create_if_not_found {
            return Err(OrchestratorError::PoolNotFound { name: spec.name });
        }

        let name = spec.name.clone();
        let kind = spec.kind;
        let pool = WorkPool::from_spec(spec, self.default_capacity);
        pools.insert(name.clone(), Arc::clone(&pool));
        drop(pools);

        self.bus.publish(
            Event::now(EventKind::PoolCreated).with_reason(format!("pool={name} kind={kind}")),
        );
        Ok(pool)
    }

    /// Looks up an existing pool by name.
    pub async fn get(&self, name: &str) -> Result<Arc<WorkPool>, OrchestratorError> {
        self.pools
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| OrchestratorError::PoolNotFound {
                name: name.to_string(),
            })
    }

    /// Returns all pools, sorted by name.
    pub async fn list(&self) -> Vec<Arc<WorkPool>> {
        let pools = self.pools.read().await;
        let mut all: Vec<Arc<WorkPool>> = pools.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }
}
