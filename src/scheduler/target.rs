//! Runtime view of a monitored website.

use crate::config::{AlertingConfig, Config, WebsiteConfig};
use crate::health::{build_policy, AlertPolicy};
use std::sync::Arc;
use std::time::Duration;

/// A website with its resolved alerting policy. Immutable once built.
#[derive(Debug, Clone)]
pub struct Target {
    /// URL to probe; identifies the website everywhere.
    pub url: String,
    /// Delay between the end of one cycle and the next probe.
    pub interval: Duration,
    pub recipients: Vec<String>,
    /// Recipients on the secondary (SMS) channel.
    pub secondary_recipients: Vec<String>,
    pub policy: Arc<dyn AlertPolicy>,
}

impl Target {
    /// Resolve a website, falling back to the process-wide policy.
    pub fn from_config(website: &WebsiteConfig, default_alerting: &AlertingConfig) -> Self {
        let alerting = website.alerting.as_ref().unwrap_or(default_alerting);
        Self {
            url: website.url.clone(),
            interval: website.interval(),
            recipients: website.custodians.clone(),
            secondary_recipients: website.sms_custodians.clone(),
            policy: build_policy(alerting),
        }
    }
}

/// All targets in configuration order.
pub fn targets_from_config(config: &Config) -> Vec<Target> {
    config
        .websites
        .iter()
        .map(|website| Target::from_config(website, &config.alerting))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_per_website_policy_override() {
        let config = parse_config(
            r#"
alerting:
  policy: hysteresis
  failure_threshold: 5
websites:
  - url: "http://a.example"
    poll_interval: 30
  - url: "http://b.example"
    poll_interval: 60
    alerting:
      policy: debounce
      debounce: 5m
"#,
        )
        .unwrap();

        let targets = targets_from_config(&config);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].url, "http://a.example");
        assert_eq!(targets[0].interval, Duration::from_secs(30));
        assert_eq!(targets[0].policy.name(), "hysteresis");
        assert_eq!(targets[1].policy.name(), "debounce");
    }
}
