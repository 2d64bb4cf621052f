//! Configuration validation.

use crate::config::{AlertingConfig, Config};
use reqwest::Url;
use std::collections::HashSet;

/// Validate the configuration.
///
/// Checks for:
/// - At least one website
/// - Well-formed, unique http/https URLs
/// - Positive poll intervals, probe timeout and thresholds
/// - Recipients only for channels that are configured
///
/// # Returns
///
/// `Ok(())` if valid, or an error message describing every problem found.
pub fn validate_config(config: &Config) -> Result<(), String> {
    let mut errors = Vec::new();

    if config.websites.is_empty() {
        errors.push("at least one website must be defined".to_string());
    }

    if config.probe.timeout.is_zero() {
        errors.push("probe timeout must be greater than zero".to_string());
    }

    validate_alerting("global alerting", &config.alerting, &mut errors);

    let mut urls = HashSet::new();

    for website in &config.websites {
        match Url::parse(&website.url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(format!(
                "website '{}' has unsupported scheme '{}' (expected http or https)",
                website.url,
                url.scheme()
            )),
            Err(e) => errors.push(format!("website '{}' has an invalid URL: {}", website.url, e)),
        }

        if !urls.insert(website.url.as_str()) {
            errors.push(format!("duplicate website url: {}", website.url));
        }

        if website.poll_interval == 0 {
            errors.push(format!(
                "website '{}' has poll_interval 0 (must be >= 1 second)",
                website.url
            ));
        }

        if !website.custodians.is_empty() && config.email.is_none() {
            errors.push(format!(
                "website '{}' has custodians but no email channel is configured",
                website.url
            ));
        }

        if !website.sms_custodians.is_empty() && config.sms.is_none() {
            errors.push(format!(
                "website '{}' has sms_custodians but no sms channel is configured",
                website.url
            ));
        }

        if let Some(ref alerting) = website.alerting {
            validate_alerting(&format!("website '{}'", website.url), alerting, &mut errors);
        }
    }

    // Validate log level
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.global.log_level.to_lowercase().as_str()) {
        errors.push(format!(
            "invalid log level '{}', must be one of: {}",
            config.global.log_level,
            valid_levels.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

fn validate_alerting(scope: &str, alerting: &AlertingConfig, errors: &mut Vec<String>) {
    match *alerting {
        AlertingConfig::Hysteresis {
            failure_threshold,
            success_threshold,
        } => {
            if failure_threshold == 0 {
                errors.push(format!("{}: failure_threshold must be >= 1", scope));
            }
            if success_threshold == 0 {
                errors.push(format!("{}: success_threshold must be >= 1", scope));
            }
        }
        AlertingConfig::Debounce {
            failure_threshold, ..
        } => {
            if failure_threshold == 0 {
                errors.push(format!("{}: failure_threshold must be >= 1", scope));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use std::time::Duration;

    fn minimal_config() -> Config {
        Config {
            global: GlobalConfig::default(),
            probe: ProbeConfig::default(),
            alerting: AlertingConfig::default(),
            email: Some(EmailConfig {
                smtp_host: "smtp.example.com".to_string(),
                smtp_port: 587,
                username: "alerts@example.com".to_string(),
                password: String::new(),
                from: None,
                tls: SmtpTls::Starttls,
            }),
            sms: None,
            websites: vec![WebsiteConfig {
                url: "https://example.com/".to_string(),
                poll_interval: 30,
                custodians: vec!["ops@example.com".to_string()],
                sms_custodians: vec![],
                alerting: None,
            }],
        }
    }

    #[test]
    fn test_valid_config() {
        let config = minimal_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_no_websites() {
        let mut config = minimal_config();
        config.websites.clear();
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("at least one website"));
    }

    #[test]
    fn test_duplicate_urls() {
        let mut config = minimal_config();
        let dup = config.websites[0].clone();
        config.websites.push(dup);
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("duplicate website url"));
    }

    #[test]
    fn test_invalid_url() {
        let mut config = minimal_config();
        config.websites[0].url = "not a url".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("invalid URL"));
    }

    #[test]
    fn test_unsupported_scheme() {
        let mut config = minimal_config();
        config.websites[0].url = "ftp://example.com/".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("unsupported scheme"));
    }

    #[test]
    fn test_zero_poll_interval() {
        let mut config = minimal_config();
        config.websites[0].poll_interval = 0;
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("poll_interval 0"));
    }

    #[test]
    fn test_zero_thresholds() {
        let mut config = minimal_config();
        config.alerting = AlertingConfig::Hysteresis {
            failure_threshold: 0,
            success_threshold: 0,
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.contains("failure_threshold must be >= 1"));
        assert!(err.contains("success_threshold must be >= 1"));
    }

    #[test]
    fn test_zero_debounce_is_allowed() {
        let mut config = minimal_config();
        config.websites[0].alerting = Some(AlertingConfig::Debounce {
            failure_threshold: 1,
            debounce: Duration::ZERO,
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_per_website_override_checked() {
        let mut config = minimal_config();
        config.websites[0].alerting = Some(AlertingConfig::Debounce {
            failure_threshold: 0,
            debounce: Duration::from_secs(60),
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.contains("website 'https://example.com/'"));
    }

    #[test]
    fn test_recipients_without_channel() {
        let mut config = minimal_config();
        config.email = None;
        config.websites[0].sms_custodians = vec!["5551234@sms.example.com".to_string()];
        let err = validate_config(&config).unwrap_err();
        assert!(err.contains("no email channel"));
        assert!(err.contains("no sms channel"));
    }

    #[test]
    fn test_zero_probe_timeout() {
        let mut config = minimal_config();
        config.probe.timeout = Duration::ZERO;
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("probe timeout"));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = minimal_config();
        config.global.log_level = "verbose".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("invalid log level"));
    }
}
