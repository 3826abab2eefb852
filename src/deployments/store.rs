//! # Deployment store - atomic upsert with scheduler wakeup.
//!
//! Owns the name-keyed map of active deployments. Upserts and removals
//! happen under a single write lock and signal the change notifier inside
//! the same operation, so the scheduler loop re-snapshots before it can act
//! on a stale binding: an overwritten schedule never fires after the new
//! record is visible, and a removed deployment never fires after removal.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use tokio::sync::{Notify, RwLock};

use crate::deployments::{Deployment, DeploymentId};
use crate::error::OrchestratorError;
use crate::flows::Flow;
use crate::pools::WorkPool;
use crate::schedules::CronSchedule;

/// Name-keyed store of active deployments.
pub(crate) struct DeploymentStore {
    inner: RwLock<HashMap<String, Arc<Deployment>>>,
    changed: Notify,
    next_id: AtomicU64,
}

impl DeploymentStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            changed: Notify::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Installs or replaces the binding for `name` atomically.
    ///
    /// Returns the new record and whether an old binding was replaced. A
    /// replaced name keeps its [`DeploymentId`] and gets `generation + 1`.
    pub(crate) async fn upsert(
        &self,
        name: String,
        flow: Flow,
        pool: Arc<WorkPool>,
        schedule: Option<CronSchedule>,
        tags: Vec<String>,
    ) -> (Arc<Deployment>, bool) {
        let mut inner = self.inner.write().await;

        let (id, generation, replaced) = match inner.get(&name) {
            Some(old) => (old.id(), old.generation() + 1, true),
            None => (
                DeploymentId::from_raw(self.next_id.fetch_add(1, AtomicOrdering::Relaxed)),
                1,
                false,
            ),
        };

        let record = Arc::new(Deployment::new(
            id,
            name.as_str().into(),
            flow,
            pool,
            schedule,
            tags,
            generation,
        ));
        inner.insert(name, Arc::clone(&record));
        self.changed.notify_one();

        (record, replaced)
    }

    /// Removes the binding for `name`; its schedule stops before the next
    /// fire time.
    pub(crate) async fn remove(&self, name: &str) -> Result<Arc<Deployment>, OrchestratorError> {
        let mut inner = self.inner.write().await;
        let removed = inner
            .remove(name)
            .ok_or_else(|| OrchestratorError::DeploymentNotFound {
                name: name.to_string(),
            })?;
        self.changed.notify_one();
        Ok(removed)
    }

    /// Looks up the current binding for `name`.
    pub(crate) async fn get(&self, name: &str) -> Result<Arc<Deployment>, OrchestratorError> {
        self.inner
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| OrchestratorError::DeploymentNotFound {
                name: name.to_string(),
            })
    }

    /// Returns all active deployments, sorted by name.
    pub(crate) async fn snapshot(&self) -> Vec<Arc<Deployment>> {
        let inner = self.inner.read().await;
        let mut all: Vec<Arc<Deployment>> = inner.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Resolves when the store changes after this call.
    ///
    /// A change signaled while nobody waits is latched, so the scheduler
    /// cannot miss an upsert between snapshot and sleep.
    pub(crate) async fn changed(&self) {
        self.changed.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::FlowBuilder;
    use crate::pools::{PoolKind, PoolSpec};
    use crate::tasks::{TaskFn, TaskSpec};
    use crate::TaskError;
    use tokio_util::sync::CancellationToken;

    fn flow(name: &str) -> Flow {
        FlowBuilder::new(name)
            .step(TaskSpec::new(TaskFn::arc("noop", |_ctx: CancellationToken| async {
                Ok::<(), TaskError>(())
            })))
            .unwrap()
            .build()
            .unwrap()
    }

    fn pool() -> Arc<WorkPool> {
        WorkPool::from_spec(PoolSpec::new("local-pool", PoolKind::Process), 1)
    }

    #[tokio::test]
    async fn test_upsert_keeps_id_and_bumps_generation() {
        let store = DeploymentStore::new();

        let (first, replaced) = store
            .upsert("hello-world".into(), flow("f1"), pool(), None, vec![])
            .await;
        assert!(!replaced);
        assert_eq!(first.generation(), 1);

        let (second, replaced) = store
            .upsert("hello-world".into(), flow("f2"), pool(), None, vec![])
            .await;
        assert!(replaced);
        assert_eq!(second.id(), first.id());
        assert_eq!(second.generation(), 2);
        assert_eq!(second.flow().name(), "f2");
    }

    #[tokio::test]
    async fn test_distinct_names_get_distinct_ids() {
        let store = DeploymentStore::new();
        let (a, _) = store.upsert("a".into(), flow("f"), pool(), None, vec![]).await;
        let (b, _) = store.upsert("b".into(), flow("f"), pool(), None, vec![]).await;
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_remove_and_missing_lookup() {
        let store = DeploymentStore::new();
        store.upsert("gone".into(), flow("f"), pool(), None, vec![]).await;

        store.remove("gone").await.unwrap();
        assert!(matches!(
            store.get("gone").await.unwrap_err(),
            OrchestratorError::DeploymentNotFound { .. }
        ));
        assert!(matches!(
            store.remove("gone").await.unwrap_err(),
            OrchestratorError::DeploymentNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_change_signal_is_latched() {
        let store = DeploymentStore::new();
        // Notify before anyone waits: the permit must be stored.
        store.upsert("x".into(), flow("f"), pool(), None, vec![]).await;
        // Must resolve immediately thanks to the latched permit.
        store.changed().await;
    }
}
