//! Health state management.
//!
//! Provides per-website alert tracking shared by all polling workers.

use crate::health::{AlertKind, AlertPolicy};
use crate::probe::ProbeOutcome;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::Instant;

/// Alerting state of a single website.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetHealth {
    /// Consecutive failed probes (zero while succeeding).
    pub consecutive_failures: u32,
    /// Consecutive successful probes (zero while failing).
    pub consecutive_successes: u32,
    /// A down alert was sent and no recovery has been sent since.
    pub alert_active: bool,
    /// When the debounce window last restarted; `None` means never.
    pub last_alert: Option<Instant>,
}

impl TargetHealth {
    /// Reset successes, increment failures. Returns the new failure count.
    pub fn record_failure(&mut self) -> u32 {
        self.consecutive_successes = 0;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_failures
    }

    /// Reset failures, increment successes. Returns the new success count.
    pub fn record_success(&mut self) -> u32 {
        self.consecutive_failures = 0;
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        self.consecutive_successes
    }
}

/// Shared handle to one website's state.
pub type TargetHandle = Arc<Mutex<TargetHealth>>;

/// Alert state for all websites, keyed by URL.
///
/// Sharded so that workers for different websites never contend on one lock;
/// each entry carries its own mutex for the evaluate step.
#[derive(Debug, Default)]
pub struct AlertStore {
    targets: DashMap<String, TargetHandle>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the state for `target`, inserting a zeroed one on first use.
    pub fn get_or_create(&self, target: &str) -> TargetHandle {
        if let Some(existing) = self.targets.get(target) {
            return Arc::clone(existing.value());
        }
        Arc::clone(self.targets.entry(target.to_string()).or_default().value())
    }

    /// Feed one outcome through `policy` for `target`, creating its state on
    /// first use.
    ///
    /// The read-modify-decide-write runs under the website's own lock.
    pub fn evaluate(
        &self,
        target: &str,
        policy: &dyn AlertPolicy,
        outcome: &ProbeOutcome,
        now: Instant,
    ) -> Option<AlertKind> {
        let handle = self.get_or_create(target);
        let mut state = handle.lock();
        policy.evaluate(&mut state, outcome, now)
    }

    /// Copy of the current state, if the website has been observed.
    pub fn snapshot(&self, target: &str) -> Option<TargetHealth> {
        self.targets.get(target).map(|entry| entry.value().lock().clone())
    }

    /// Number of websites tracked.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HysteresisPolicy;
    use std::time::Duration;

    fn failure() -> ProbeOutcome {
        ProbeOutcome::transport("connection refused", Duration::ZERO)
    }

    #[test]
    fn test_counters_are_exclusive() {
        let mut state = TargetHealth::default();
        assert_eq!(state.record_failure(), 1);
        assert_eq!(state.record_failure(), 2);
        assert_eq!(state.consecutive_successes, 0);

        assert_eq!(state.record_success(), 1);
        assert_eq!(state.consecutive_failures, 0);
    }

    #[test]
    fn test_get_or_create_returns_same_handle() {
        let store = AlertStore::new();
        assert!(store.is_empty());

        let first = store.get_or_create("http://a.example");
        first.lock().consecutive_failures = 4;

        let second = store.get_or_create("http://a.example");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.lock().consecutive_failures, 4);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_state_created_lazily() {
        let store = AlertStore::new();
        assert!(store.snapshot("http://a.example").is_none());

        let policy = HysteresisPolicy::new(3, 2);
        let decision = store.evaluate("http://a.example", &policy, &failure(), Instant::now());
        assert_eq!(decision, None);

        let state = store.snapshot("http://a.example").unwrap();
        assert_eq!(state.consecutive_failures, 1);
    }

    #[test]
    fn test_targets_are_independent() {
        let store = AlertStore::new();
        let policy = HysteresisPolicy::new(1, 1);
        let now = Instant::now();

        assert_eq!(
            store.evaluate("http://a.example", &policy, &failure(), now),
            Some(AlertKind::Down)
        );
        assert!(store.snapshot("http://a.example").unwrap().alert_active);
        assert!(store.snapshot("http://b.example").is_none());

        assert_eq!(
            store.evaluate("http://b.example", &policy, &failure(), now),
            Some(AlertKind::Down)
        );
    }

    #[test]
    fn test_concurrent_creation_yields_single_entry() {
        let store = Arc::new(AlertStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.get_or_create("http://a.example"))
            })
            .collect();

        let created: Vec<TargetHandle> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(store.len(), 1);
        assert!(created.iter().all(|h| Arc::ptr_eq(h, &created[0])));
    }
}
