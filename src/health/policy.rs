//! Alerting policies.
//!
//! A policy turns one probe outcome plus the website's state into at most one
//! notification decision. Two variants exist:
//!
//! - [`HysteresisPolicy`]: alert once when failures reach `failure_threshold`,
//!   announce recovery once when successes reach `success_threshold`.
//! - [`DebouncePolicy`]: alert whenever failures are at or past
//!   `failure_threshold` and the debounce window has passed. Recovery is
//!   silent.

use crate::config::AlertingConfig;
use crate::health::TargetHealth;
use crate::probe::ProbeOutcome;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Kind of notification a policy asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    /// The website is considered down.
    Down,
    /// The website is back up after a down alert.
    Recovered,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Down => f.write_str("down"),
            AlertKind::Recovered => f.write_str("recovered"),
        }
    }
}

/// Transition policy over a website's health state.
pub trait AlertPolicy: Send + Sync + fmt::Debug {
    /// Apply `outcome` to `state` and decide whether to notify.
    fn evaluate(
        &self,
        state: &mut TargetHealth,
        outcome: &ProbeOutcome,
        now: Instant,
    ) -> Option<AlertKind>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Threshold policy with an active-alert flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HysteresisPolicy {
    failure_threshold: u32,
    success_threshold: u32,
}

impl HysteresisPolicy {
    pub fn new(failure_threshold: u32, success_threshold: u32) -> Self {
        Self {
            failure_threshold,
            success_threshold,
        }
    }
}

impl AlertPolicy for HysteresisPolicy {
    fn evaluate(
        &self,
        state: &mut TargetHealth,
        outcome: &ProbeOutcome,
        _now: Instant,
    ) -> Option<AlertKind> {
        // Equality rather than >=: the counter keeps climbing during an
        // outage but only the crossing itself may alert.
        if outcome.is_success() {
            let successes = state.record_success();
            if successes == self.success_threshold && state.alert_active {
                state.alert_active = false;
                return Some(AlertKind::Recovered);
            }
        } else {
            let failures = state.record_failure();
            if failures == self.failure_threshold && !state.alert_active {
                state.alert_active = true;
                return Some(AlertKind::Down);
            }
        }
        None
    }

    fn name(&self) -> &'static str {
        "hysteresis"
    }
}

/// Time-gated policy: repeated down alerts, silent recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    failure_threshold: u32,
    debounce: Duration,
}

impl DebouncePolicy {
    pub fn new(failure_threshold: u32, debounce: Duration) -> Self {
        Self {
            failure_threshold,
            debounce,
        }
    }

    fn window_elapsed(&self, last_alert: Option<Instant>, now: Instant) -> bool {
        match last_alert {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.debounce,
        }
    }
}

impl AlertPolicy for DebouncePolicy {
    fn evaluate(
        &self,
        state: &mut TargetHealth,
        outcome: &ProbeOutcome,
        now: Instant,
    ) -> Option<AlertKind> {
        if outcome.is_success() {
            // A success restarts the window, so the next outage waits a full
            // debounce period before alerting.
            state.record_success();
            state.alert_active = false;
            state.last_alert = Some(now);
            return None;
        }

        let failures = state.record_failure();
        if failures >= self.failure_threshold && self.window_elapsed(state.last_alert, now) {
            state.alert_active = true;
            state.last_alert = Some(now);
            return Some(AlertKind::Down);
        }
        None
    }

    fn name(&self) -> &'static str {
        "debounce"
    }
}

/// Build the policy selected by configuration.
pub fn build_policy(config: &AlertingConfig) -> Arc<dyn AlertPolicy> {
    match *config {
        AlertingConfig::Hysteresis {
            failure_threshold,
            success_threshold,
        } => Arc::new(HysteresisPolicy::new(failure_threshold, success_threshold)),
        AlertingConfig::Debounce {
            failure_threshold,
            debounce,
        } => Arc::new(DebouncePolicy::new(failure_threshold, debounce)),
    }
}
