//! Per-website polling loop.

use crate::health::{AlertKind, AlertStore};
use crate::metrics::MetricsCollector;
use crate::notify::{Notification, Notifiers};
use crate::probe::{ProbeOutcome, Prober};
use crate::scheduler::Target;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Owns one website for the life of the process.
///
/// The website's alert state is created in the store by the first `step`.
pub struct Worker {
    target: Target,
    prober: Arc<dyn Prober>,
    store: Arc<AlertStore>,
    notifiers: Notifiers,
    metrics: MetricsCollector,
}

impl Worker {
    pub fn new(
        target: Target,
        prober: Arc<dyn Prober>,
        store: Arc<AlertStore>,
        notifiers: Notifiers,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            target,
            prober,
            store,
            notifiers,
            metrics,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// One cycle: probe, evaluate, notify if the policy says so, record metrics.
    pub async fn step(&self) -> Option<AlertKind> {
        let url = self.target.url.as_str();
        let outcome = self.prober.probe(url).await;

        match outcome {
            ProbeOutcome::Success { status, latency } => {
                debug!(url = %url, status, latency_ms = latency.as_millis() as u64, "website up");
            }
            ProbeOutcome::Failure {
                ref failure,
                latency,
            } => {
                warn!(url = %url, reason = %failure, latency_ms = latency.as_millis() as u64, "website down");
            }
        }

        let decision = self
            .store
            .evaluate(url, self.target.policy.as_ref(), &outcome, Instant::now());

        if let Some(kind) = decision {
            self.notify(kind, &outcome).await;
        }

        self.metrics
            .record_probe(url, outcome.is_success(), outcome.latency());

        decision
    }

    async fn notify(&self, kind: AlertKind, outcome: &ProbeOutcome) {
        info!(
            url = %self.target.url,
            kind = %kind,
            policy = self.target.policy.name(),
            "state change, notifying"
        );
        self.metrics.record_notification(&self.target.url, kind);

        let notification = Notification {
            target: self.target.url.clone(),
            reason: outcome.reason(),
            kind,
        };
        self.notifiers
            .dispatch(
                &notification,
                &self.target.recipients,
                &self.target.secondary_recipients,
            )
            .await;
    }

    /// Poll until shutdown. An in-flight probe always completes first.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            url = %self.target.url,
            interval_secs = self.target.interval.as_secs(),
            policy = self.target.policy.name(),
            "worker starting"
        );

        loop {
            self.step().await;

            tokio::select! {
                _ = sleep(self.target.interval) => {}
                _ = shutdown.recv() => {
                    debug!(url = %self.target.url, "worker shutting down");
                    break;
                }
            }
        }
    }
}
