//! Metrics collector using prometheus-client.
//!
//! Provides per-website availability, latency, probe and notification metrics.

use crate::health::AlertKind;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

/// Prometheus client default latency buckets, in seconds.
const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Labels for per-website metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct UrlLabels {
    pub url: String,
}

/// Labels for probe counters.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ProbeLabels {
    pub url: String,
    pub result: ProbeResult,
}

/// Result of a probe.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum ProbeResult {
    Success,
    Failure,
}

/// Labels for notification counters.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct NotificationLabels {
    pub url: String,
    pub kind: NotificationKind,
}

/// Notification kind label value.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum NotificationKind {
    Down,
    Recovered,
}

impl From<AlertKind> for NotificationKind {
    fn from(kind: AlertKind) -> Self {
        match kind {
            AlertKind::Down => NotificationKind::Down,
            AlertKind::Recovered => NotificationKind::Recovered,
        }
    }
}

/// Collects and stores all metrics. Cheap to clone; all workers share one.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsCollectorInner>,
}

struct MetricsCollectorInner {
    /// Website up gauge (1 = up, 0 = down).
    website_up: Family<UrlLabels, Gauge<f64, AtomicU64>>,
    /// Probe latency histogram (in seconds).
    response_time_seconds: Family<UrlLabels, Histogram>,
    /// Probes performed, by result.
    probes_total: Family<ProbeLabels, Counter>,
    /// Notifications triggered, by kind.
    notifications_total: Family<NotificationLabels, Counter>,
    /// The prometheus registry.
    registry: Registry,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let website_up = Family::<UrlLabels, Gauge<f64, AtomicU64>>::default();
        let response_time_seconds =
            Family::<UrlLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(DEFAULT_BUCKETS.into_iter())
            });
        let probes_total = Family::<ProbeLabels, Counter>::default();
        let notifications_total = Family::<NotificationLabels, Counter>::default();

        registry.register(
            "website_up",
            "Website up status (1 = UP, 0 = DOWN)",
            website_up.clone(),
        );
        registry.register(
            "website_response_time_seconds",
            "Response time for websites in seconds",
            response_time_seconds.clone(),
        );
        registry.register(
            "website_probes",
            "Total number of probes performed",
            probes_total.clone(),
        );
        registry.register(
            "website_notifications",
            "Total number of notifications triggered",
            notifications_total.clone(),
        );

        Self {
            inner: Arc::new(MetricsCollectorInner {
                website_up,
                response_time_seconds,
                probes_total,
                notifications_total,
                registry,
            }),
        }
    }

    /// Get the prometheus registry for encoding.
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Record one probe cycle: up gauge, latency and probe counter.
    pub fn record_probe(&self, url: &str, success: bool, latency: Duration) {
        let labels = UrlLabels {
            url: url.to_string(),
        };
        self.inner
            .website_up
            .get_or_create(&labels)
            .set(if success { 1.0 } else { 0.0 });
        self.inner
            .response_time_seconds
            .get_or_create(&labels)
            .observe(latency.as_secs_f64());

        let probe_labels = ProbeLabels {
            url: url.to_string(),
            result: if success {
                ProbeResult::Success
            } else {
                ProbeResult::Failure
            },
        };
        self.inner.probes_total.get_or_create(&probe_labels).inc();
    }

    /// Record a triggered notification.
    pub fn record_notification(&self, url: &str, kind: AlertKind) {
        let labels = NotificationLabels {
            url: url.to_string(),
            kind: kind.into(),
        };
        self.inner.notifications_total.get_or_create(&labels).inc();
    }

    /// Current value of the up gauge for `url`.
    pub fn website_up(&self, url: &str) -> f64 {
        let labels = UrlLabels {
            url: url.to_string(),
        };
        self.inner.website_up.get_or_create(&labels).get()
    }

    /// Number of probes recorded for `url`.
    pub fn probe_count(&self, url: &str) -> u64 {
        [ProbeResult::Success, ProbeResult::Failure]
            .into_iter()
            .map(|result| {
                let labels = ProbeLabels {
                    url: url.to_string(),
                    result,
                };
                self.inner.probes_total.get_or_create(&labels).get()
            })
            .sum()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus_client::encoding::text::encode;

    #[test]
    fn test_record_probe_sets_gauge() {
        let collector = MetricsCollector::new();

        collector.record_probe("http://a.example", true, Duration::from_millis(40));
        assert_eq!(collector.website_up("http://a.example"), 1.0);

        collector.record_probe("http://a.example", false, Duration::from_secs(10));
        assert_eq!(collector.website_up("http://a.example"), 0.0);
        assert_eq!(collector.probe_count("http://a.example"), 2);
    }

    #[test]
    fn test_targets_do_not_share_series() {
        let collector = MetricsCollector::new();
        collector.record_probe("http://a.example", true, Duration::ZERO);
        collector.record_probe("http://b.example", false, Duration::ZERO);

        assert_eq!(collector.website_up("http://a.example"), 1.0);
        assert_eq!(collector.website_up("http://b.example"), 0.0);
    }

    #[test]
    fn test_concurrent_recording() {
        let collector = MetricsCollector::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let collector = collector.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        collector.record_probe("http://a.example", true, Duration::ZERO);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(collector.probe_count("http://a.example"), 1000);
    }

    #[test]
    fn test_encoding_uses_website_names() {
        let collector = MetricsCollector::new();
        collector.record_probe("http://a.example", true, Duration::from_millis(12));
        collector.record_notification("http://a.example", AlertKind::Down);

        let mut buffer = String::new();
        encode(&mut buffer, collector.registry()).unwrap();

        assert!(buffer.contains("website_up{url=\"http://a.example\"}"));
        assert!(buffer.contains("website_response_time_seconds_bucket"));
        assert!(buffer.contains("website_probes_total"));
        assert!(buffer.contains("website_notifications_total"));
    }
}
