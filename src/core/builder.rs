//! # Orchestrator builder.
//!
//! Wires the runtime together: bus, subscriber fan-out, pool manager,
//! deployment and run stores, and the three background loops (scheduler,
//! executor, heartbeat monitor). `build()` spawns the loops immediately, so
//! it must run inside a tokio runtime; teardown is explicit via
//! [`Orchestrator::shutdown`].

use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::{HeartbeatMonitor, Orchestrator, RunExecutor, SchedulerLoop};
use crate::deployments::DeploymentStore;
use crate::events::Bus;
use crate::pools::WorkPoolManager;
use crate::runs::RunStore;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing an [`Orchestrator`].
pub struct OrchestratorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the given configuration.
    pub(crate) fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Sets the full subscriber list.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the orchestrator and starts its background loops.
    pub fn build(self) -> Arc<Orchestrator> {
        let cfg = self.cfg;
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let runtime_token = CancellationToken::new();

        let pools = Arc::new(WorkPoolManager::new(bus.clone(), cfg.default_pool_capacity));
        let deployments = Arc::new(DeploymentStore::new());
        let runs = Arc::new(RunStore::new(runtime_token.clone()));
        let (run_tx, run_rx) = mpsc::channel(cfg.run_queue_capacity_clamped());

        spawn_subscriber_listener(&bus, &subs);

        let scheduler = SchedulerLoop {
            deployments: Arc::clone(&deployments),
            runs: Arc::clone(&runs),
            bus: bus.clone(),
            run_tx: run_tx.clone(),
        }
        .spawn(runtime_token.clone());

        let executor = RunExecutor {
            store: Arc::clone(&runs),
            bus: bus.clone(),
            heartbeat_interval: cfg.heartbeat_interval,
        }
        .spawn(run_rx, runtime_token.clone());

        let monitor = HeartbeatMonitor {
            store: Arc::clone(&runs),
            bus: bus.clone(),
            interval: cfg.heartbeat_interval,
            timeout: cfg.heartbeat_timeout,
        }
        .spawn(runtime_token.clone());

        Arc::new(Orchestrator {
            cfg,
            bus,
            subs,
            pools,
            deployments,
            runs,
            run_tx,
            runtime_token,
            loops: Mutex::new(vec![scheduler, executor, monitor]),
        })
    }
}

/// Forwards bus events to the subscriber set.
///
/// Holds the set weakly so the listener cannot keep the runtime alive on
/// its own: once the orchestrator handle drops, the next wakeup (or bus
/// closure) ends the task. Shutdown-phase events still flow because the
/// handle outlives `shutdown()`. Lagging skips the oldest events rather
/// than exiting.
fn spawn_subscriber_listener(bus: &Bus, subs: &Arc<SubscriberSet>) {
    let mut rx = bus.subscribe();
    let subs = Arc::downgrade(subs);
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => match subs.upgrade() {
                    Some(set) => set.emit(&ev),
                    None => break,
                },
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });
}
