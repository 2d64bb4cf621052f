//! Probe execution: one GET against a website, classified into an outcome.

mod http;

pub use http::HttpProber;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Performs a single check against a URL.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `url` once. Never fails: errors are reported as a failed outcome.
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// Why a probe was unhealthy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// Connection, timeout, DNS or protocol error; no response was received.
    Transport(String),
    /// HTTP status 500 and above.
    Server(u16),
    /// HTTP status 400..=499, or an unexpected status below 200.
    Client(u16),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Transport(detail) => write!(f, "transport error: {}", detail),
            ProbeFailure::Server(code) => write!(f, "server error: HTTP {}", code),
            ProbeFailure::Client(code) => write!(f, "client error: HTTP {}", code),
        }
    }
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success { status: u16, latency: Duration },
    Failure { failure: ProbeFailure, latency: Duration },
}

impl ProbeOutcome {
    /// Classify a received HTTP status.
    pub fn from_status(status: u16, latency: Duration) -> Self {
        match status {
            200..=399 => ProbeOutcome::Success { status, latency },
            500.. => ProbeOutcome::Failure {
                failure: ProbeFailure::Server(status),
                latency,
            },
            _ => ProbeOutcome::Failure {
                failure: ProbeFailure::Client(status),
                latency,
            },
        }
    }

    /// Build a transport-level failure.
    pub fn transport(detail: impl Into<String>, latency: Duration) -> Self {
        ProbeOutcome::Failure {
            failure: ProbeFailure::Transport(detail.into()),
            latency,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }

    /// Elapsed time from request start to response or error.
    pub fn latency(&self) -> Duration {
        match self {
            ProbeOutcome::Success { latency, .. } | ProbeOutcome::Failure { latency, .. } => {
                *latency
            }
        }
    }

    /// Human-readable reason suitable for a notification.
    pub fn reason(&self) -> String {
        match self {
            ProbeOutcome::Success { status, .. } => format!("responding with HTTP {}", status),
            ProbeOutcome::Failure { failure, .. } => failure.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let latency = Duration::from_millis(10);
        assert!(ProbeOutcome::from_status(200, latency).is_success());
        assert!(ProbeOutcome::from_status(301, latency).is_success());
        assert!(ProbeOutcome::from_status(399, latency).is_success());

        assert_eq!(
            ProbeOutcome::from_status(404, latency),
            ProbeOutcome::Failure {
                failure: ProbeFailure::Client(404),
                latency,
            }
        );
        assert_eq!(
            ProbeOutcome::from_status(503, latency),
            ProbeOutcome::Failure {
                failure: ProbeFailure::Server(503),
                latency,
            }
        );
        assert!(!ProbeOutcome::from_status(101, latency).is_success());
    }

    #[test]
    fn test_latency_kept_for_failures() {
        let outcome = ProbeOutcome::transport("connection refused", Duration::from_millis(7));
        assert_eq!(outcome.latency(), Duration::from_millis(7));
    }

    #[test]
    fn test_reason_distinguishes_failures() {
        let latency = Duration::ZERO;
        assert_eq!(
            ProbeOutcome::from_status(502, latency).reason(),
            "server error: HTTP 502"
        );
        assert_eq!(
            ProbeOutcome::from_status(403, latency).reason(),
            "client error: HTTP 403"
        );
        assert_eq!(
            ProbeOutcome::transport("timed out", latency).reason(),
            "transport error: timed out"
        );
    }
}
