//! Configuration data types.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Probe executor settings
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Process-wide alerting policy
    #[serde(default)]
    pub alerting: AlertingConfig,

    /// Primary notification channel
    #[serde(default)]
    pub email: Option<EmailConfig>,

    /// Secondary notification channel (email-to-SMS gateway)
    #[serde(default)]
    pub sms: Option<EmailConfig>,

    /// Monitored websites
    #[serde(default)]
    pub websites: Vec<WebsiteConfig>,
}

/// Global configuration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Json,
            metrics: MetricsConfig::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Metrics endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Whether metrics endpoint is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address to bind metrics server
    #[serde(default = "default_metrics_address")]
    pub address: SocketAddr,

    /// Path for metrics endpoint
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: default_metrics_address(),
            path: default_metrics_path(),
        }
    }
}

/// Probe executor settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Timeout for a single GET, connect through response headers
    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Retry once when the server closes the connection before responding
    #[serde(default = "default_true")]
    pub retry_on_premature_close: bool,

    /// User-Agent header sent with every probe
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: default_probe_timeout(),
            retry_on_premature_close: true,
            user_agent: default_user_agent(),
        }
    }
}

/// Alerting policy selection.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum AlertingConfig {
    /// Distinct failure/success thresholds with an active-alert flag.
    Hysteresis {
        #[serde(default = "default_failure_threshold")]
        failure_threshold: u32,
        #[serde(default = "default_success_threshold")]
        success_threshold: u32,
    },
    /// Repeated down alerts spaced by at least `debounce`; recovery is silent.
    Debounce {
        #[serde(default = "default_failure_threshold")]
        failure_threshold: u32,
        #[serde(default = "default_debounce", with = "humantime_serde")]
        debounce: Duration,
    },
}

impl Default for AlertingConfig {
    fn default() -> Self {
        AlertingConfig::Hysteresis {
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
        }
    }
}

/// SMTP channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    /// SMTP relay host
    pub smtp_host: String,

    /// SMTP relay port
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Login user, also the sender when `from` is unset
    pub username: String,

    /// Login password
    #[serde(default)]
    pub password: String,

    /// Sender address override
    #[serde(default)]
    pub from: Option<String>,

    /// Transport security
    #[serde(default)]
    pub tls: SmtpTls,
}

impl EmailConfig {
    /// Address used in the From header.
    pub fn sender(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.username)
    }
}

/// SMTP transport security mode.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    /// Plain connection upgraded with STARTTLS
    #[default]
    Starttls,
    /// Implicit TLS from the first byte (usually port 465)
    Wrapper,
    /// No encryption, for local relays only
    None,
}

/// A monitored website.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebsiteConfig {
    /// URL to probe; also the target identifier
    pub url: String,

    /// Seconds between probes
    pub poll_interval: u64,

    /// Primary notification recipients
    #[serde(default)]
    pub custodians: Vec<String>,

    /// Secondary (SMS channel) recipients
    #[serde(default)]
    pub sms_custodians: Vec<String>,

    /// Per-website override of the global alerting policy
    #[serde(default)]
    pub alerting: Option<AlertingConfig>,
}

impl WebsiteConfig {
    /// Poll interval as a duration.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

fn default_true() -> bool {
    true
}

fn default_metrics_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    concat!("sitewatch/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_success_threshold() -> u32 {
    2
}

fn default_debounce() -> Duration {
    Duration::from_secs(600)
}

fn default_smtp_port() -> u16 {
    587
}

/// Custom serde module for humantime durations.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
