//! Polling scheduler.
//!
//! Starts one independent worker per website. Workers never coordinate; the
//! alert store is the only shared state and it is partitioned by URL.

mod target;
mod worker;

pub use target::{targets_from_config, Target};
pub use worker::Worker;

use crate::health::AlertStore;
use crate::metrics::MetricsCollector;
use crate::notify::Notifiers;
use crate::probe::Prober;
use crate::util::ShutdownSignal;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Launches and owns the per-website workers.
pub struct Scheduler {
    targets: Vec<Target>,
    prober: Arc<dyn Prober>,
    store: Arc<AlertStore>,
    notifiers: Notifiers,
    metrics: MetricsCollector,
}

impl Scheduler {
    pub fn new(
        targets: Vec<Target>,
        prober: Arc<dyn Prober>,
        notifiers: Notifiers,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            targets,
            prober,
            store: Arc::new(AlertStore::new()),
            notifiers,
            metrics,
        }
    }

    /// Alert state shared by the workers.
    pub fn store(&self) -> &Arc<AlertStore> {
        &self.store
    }

    /// Build the workers in configuration order without starting them.
    pub fn workers(&self) -> Vec<Worker> {
        self.targets
            .iter()
            .cloned()
            .map(|target| {
                Worker::new(
                    target,
                    Arc::clone(&self.prober),
                    Arc::clone(&self.store),
                    self.notifiers.clone(),
                    self.metrics.clone(),
                )
            })
            .collect()
    }

    /// Spawn one task per website. Each runs until `shutdown` fires.
    pub fn spawn(&self, shutdown: &ShutdownSignal) -> Vec<JoinHandle<()>> {
        let handles: Vec<JoinHandle<()>> = self
            .workers()
            .into_iter()
            .map(|worker| tokio::spawn(worker.run(shutdown.subscribe())))
            .collect();

        info!(workers = handles.len(), "scheduler started");
        handles
    }
}
