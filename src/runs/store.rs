//! # Run store - authoritative flow-run state machine.
//!
//! Maintains the authoritative state of every flow run, guarding transitions
//! so out-of-order reports cannot corrupt a record:
//!
//! - `mark_running` applies only to PENDING runs
//! - terminal marks apply only to non-terminal runs (first report wins)
//! - heartbeats touch RUNNING runs only
//!
//! Terminal records are retained for audit; queries read them through
//! [`RunView`] snapshots.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::deployments::Deployment;
use crate::error::OrchestratorError;
use crate::flows::Flow;
use crate::pools::WorkPool;
use crate::runs::{FlowRun, RunId, RunStatus, RunView};

/// Everything a run actor needs to execute one run.
pub(crate) struct RunContext {
    pub(crate) id: RunId,
    pub(crate) deployment: Arc<str>,
    pub(crate) flow: Flow,
    pub(crate) pool: Arc<WorkPool>,
    pub(crate) cancel: CancellationToken,
}

/// Thread-safe store of all flow runs.
pub(crate) struct RunStore {
    runs: RwLock<HashMap<RunId, FlowRun>>,
    seq: AtomicU64,
    runtime_token: CancellationToken,
}

impl RunStore {
    /// Creates an empty store; run cancel tokens derive from `runtime_token`.
    pub(crate) fn new(runtime_token: CancellationToken) -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            seq: AtomicU64::new(1),
            runtime_token,
        }
    }

    /// Creates a PENDING run for the deployment at the given fire time.
    pub(crate) async fn create(
        &self,
        deployment: &Deployment,
        scheduled_for: DateTime<Utc>,
    ) -> RunId {
        let id = RunId::from_raw(self.seq.fetch_add(1, AtomicOrdering::Relaxed));
        let run = FlowRun {
            id,
            deployment: deployment.name_arc(),
            flow: deployment.flow().clone(),
            pool: deployment.pool_arc(),
            scheduled_for,
            started_at: None,
            ended_at: None,
            status: RunStatus::Pending,
            error: None,
            last_beat: None,
            cancel: self.runtime_token.child_token(),
        };
        self.runs.write().await.insert(id, run);
        id
    }

    /// Returns the execution context for a PENDING run.
    pub(crate) async fn context(&self, id: RunId) -> Option<RunContext> {
        let runs = self.runs.read().await;
        let run = runs.get(&id)?;
        if run.status != RunStatus::Pending {
            return None;
        }
        Some(RunContext {
            id,
            deployment: Arc::clone(&run.deployment),
            flow: run.flow.clone(),
            pool: Arc::clone(&run.pool),
            cancel: run.cancel.clone(),
        })
    }

    /// PENDING → RUNNING; records the start time and the first heartbeat.
    ///
    /// Returns false if the run is not PENDING (e.g. already crashed).
    pub(crate) async fn mark_running(&self, id: RunId) -> bool {
        let mut runs = self.runs.write().await;
        match runs.get_mut(&id) {
            Some(run) if run.status == RunStatus::Pending => {
                run.status = RunStatus::Running;
                run.started_at = Some(Utc::now());
                run.last_beat = Some(Instant::now());
                true
            }
            _ => false,
        }
    }

    /// Refreshes the heartbeat of a RUNNING run.
    pub(crate) async fn beat(&self, id: RunId) {
        let mut runs = self.runs.write().await;
        if let Some(run) = runs.get_mut(&id) {
            if run.status == RunStatus::Running {
                run.last_beat = Some(Instant::now());
            }
        }
    }

    /// RUNNING → COMPLETED. Returns false if the run already terminated.
    pub(crate) async fn mark_completed(&self, id: RunId) -> bool {
        self.finish(id, RunStatus::Completed, None).await
    }

    /// PENDING|RUNNING → FAILED with the given error.
    pub(crate) async fn mark_failed(&self, id: RunId, error: &str) -> bool {
        self.finish(id, RunStatus::Failed, Some(error.to_string())).await
    }

    /// PENDING|RUNNING → CRASHED with the given reason.
    pub(crate) async fn mark_crashed(&self, id: RunId, reason: &str) -> bool {
        self.finish(id, RunStatus::Crashed, Some(reason.to_string())).await
    }

    async fn finish(&self, id: RunId, status: RunStatus, error: Option<String>) -> bool {
        let mut runs = self.runs.write().await;
        match runs.get_mut(&id) {
            Some(run) if !run.status.is_terminal() => {
                run.status = status;
                run.ended_at = Some(Utc::now());
                run.error = error;
                true
            }
            _ => false,
        }
    }

    /// Requests cooperative cancellation of a run.
    ///
    /// A no-op for already-terminal runs; the task in progress (if any) is
    /// never interrupted, only further tasks are skipped.
    pub(crate) async fn cancel(&self, id: RunId) -> Result<(), OrchestratorError> {
        let runs = self.runs.read().await;
        let run = runs.get(&id).ok_or(OrchestratorError::RunNotFound { id })?;
        if !run.status.is_terminal() {
            run.cancel.cancel();
        }
        Ok(())
    }

    /// Returns the status snapshot of one run.
    pub(crate) async fn view(&self, id: RunId) -> Result<RunView, OrchestratorError> {
        self.runs
            .read()
            .await
            .get(&id)
            .map(FlowRun::view)
            .ok_or(OrchestratorError::RunNotFound { id })
    }

    /// Returns snapshots of all runs, ordered by id.
    pub(crate) async fn list(&self) -> Vec<RunView> {
        let runs = self.runs.read().await;
        let mut views: Vec<RunView> = runs.values().map(FlowRun::view).collect();
        views.sort_by_key(|v| v.id);
        views
    }

    /// Returns ids of runs currently RUNNING.
    pub(crate) async fn running(&self) -> Vec<RunId> {
        let runs = self.runs.read().await;
        let mut ids: Vec<RunId> = runs
            .values()
            .filter(|r| r.status == RunStatus::Running)
            .map(|r| r.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Returns RUNNING runs whose heartbeat is older than `timeout`.
    pub(crate) async fn stale_running(&self, timeout: Duration) -> Vec<RunId> {
        let now = Instant::now();
        let runs = self.runs.read().await;
        runs.values()
            .filter(|r| r.status == RunStatus::Running)
            .filter(|r| match r.last_beat {
                Some(beat) => now.saturating_duration_since(beat) > timeout,
                None => true,
            })
            .map(|r| r.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployments::Deployment;
    use crate::flows::FlowBuilder;
    use crate::pools::{PoolKind, PoolSpec, WorkPool};
    use crate::tasks::{TaskFn, TaskSpec};

    fn deployment() -> Deployment {
        let flow = FlowBuilder::new("demo")
            .step(TaskSpec::new(TaskFn::arc(
                "noop",
                |_ctx: CancellationToken| async { Ok::<(), crate::TaskError>(()) },
            )))
            .unwrap()
            .build()
            .unwrap();
        let pool = WorkPool::from_spec(PoolSpec::new("local-pool", PoolKind::Process), 1);
        Deployment::new_for_tests("demo", flow, pool)
    }

    #[tokio::test]
    async fn test_state_machine_happy_path() {
        let store = RunStore::new(CancellationToken::new());
        let d = deployment();
        let id = store.create(&d, Utc::now()).await;

        assert_eq!(store.view(id).await.unwrap().status, RunStatus::Pending);
        assert!(store.mark_running(id).await);
        assert!(store.mark_completed(id).await);

        let view = store.view(id).await.unwrap();
        assert_eq!(view.status, RunStatus::Completed);
        assert!(view.started_at.is_some());
        assert!(view.ended_at.is_some());
        assert!(view.error.is_none());
    }

    #[tokio::test]
    async fn test_terminal_runs_reject_further_transitions() {
        let store = RunStore::new(CancellationToken::new());
        let d = deployment();
        let id = store.create(&d, Utc::now()).await;

        store.mark_running(id).await;
        assert!(store.mark_failed(id, "boom").await);
        // First terminal report wins.
        assert!(!store.mark_completed(id).await);
        assert!(!store.mark_crashed(id, "late").await);
        assert_eq!(store.view(id).await.unwrap().status, RunStatus::Failed);
        assert_eq!(store.view(id).await.unwrap().error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_running_requires_pending() {
        let store = RunStore::new(CancellationToken::new());
        let d = deployment();
        let id = store.create(&d, Utc::now()).await;

        store.mark_crashed(id, "lost").await;
        assert!(!store.mark_running(id).await);
    }

    #[tokio::test]
    async fn test_unknown_run_query_fails() {
        let store = RunStore::new(CancellationToken::new());
        let err = store.view(RunId::from_raw(999)).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::RunNotFound { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_heartbeat_detection() {
        let store = RunStore::new(CancellationToken::new());
        let d = deployment();
        let id = store.create(&d, Utc::now()).await;
        store.mark_running(id).await;

        let timeout = Duration::from_secs(30);
        assert!(store.stale_running(timeout).await.is_empty());

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.stale_running(timeout).await, vec![id]);

        // A fresh beat clears the staleness.
        store.beat(id).await;
        assert!(store.stale_running(timeout).await.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_is_cooperative_and_idempotent() {
        let store = RunStore::new(CancellationToken::new());
        let d = deployment();
        let id = store.create(&d, Utc::now()).await;

        let ctx = store.context(id).await.unwrap();
        assert!(!ctx.cancel.is_cancelled());
        store.cancel(id).await.unwrap();
        assert!(ctx.cancel.is_cancelled());

        store.mark_failed(id, "run cancelled").await;
        store.cancel(id).await.unwrap(); // terminal: no-op
    }
}
