//! Notification delivery.
//!
//! A [`Notifier`] sends one message per recipient on a single channel.
//! Delivery is best effort: a failed or skipped recipient is recorded in the
//! [`DeliveryReport`] and never stops delivery to the rest.

mod email;

pub use email::{EmailNotifier, MessageStyle};

use crate::config::Config;
use crate::health::AlertKind;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while setting up a notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid sender address '{address}': {source}")]
    InvalidSender {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to configure SMTP transport: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// A state change worth telling someone about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Website URL.
    pub target: String,
    /// Human-readable cause, e.g. "server error: HTTP 503".
    pub reason: String,
    pub kind: AlertKind,
}

/// Per-recipient result of one delivery round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: Vec<String>,
    /// Recipient and error message.
    pub failed: Vec<(String, String)>,
    /// Blank or malformed recipients; nothing was attempted for these.
    pub skipped: Vec<String>,
}

impl DeliveryReport {
    /// Number of delivery attempts made.
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    /// Append another report's entries.
    pub fn merge(&mut self, other: DeliveryReport) {
        self.delivered.extend(other.delivered);
        self.failed.extend(other.failed);
        self.skipped.extend(other.skipped);
    }
}

/// A channel capable of delivering notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs, e.g. "email".
    fn channel(&self) -> &'static str;

    /// Deliver `notification` to each recipient.
    async fn notify(&self, recipients: &[String], notification: &Notification) -> DeliveryReport;
}

/// Split recipients into trimmed non-blank entries and blank ones.
pub(crate) fn partition_recipients(recipients: &[String]) -> (Vec<&str>, Vec<String>) {
    let mut valid = Vec::new();
    let mut blank = Vec::new();
    for recipient in recipients {
        let trimmed = recipient.trim();
        if trimmed.is_empty() {
            blank.push(recipient.clone());
        } else {
            valid.push(trimmed);
        }
    }
    (valid, blank)
}

/// The configured notification channels.
#[derive(Clone, Default)]
pub struct Notifiers {
    primary: Option<Arc<dyn Notifier>>,
    secondary: Option<Arc<dyn Notifier>>,
}

impl Notifiers {
    pub fn new(primary: Option<Arc<dyn Notifier>>, secondary: Option<Arc<dyn Notifier>>) -> Self {
        Self { primary, secondary }
    }

    /// Build channels from the `email` and `sms` sections.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let primary = match config.email {
            Some(ref email) => {
                Some(Arc::new(EmailNotifier::new(email, MessageStyle::Full)?) as Arc<dyn Notifier>)
            }
            None => None,
        };
        let secondary = match config.sms {
            Some(ref sms) => {
                Some(Arc::new(EmailNotifier::new(sms, MessageStyle::Compact)?) as Arc<dyn Notifier>)
            }
            None => None,
        };
        Ok(Self::new(primary, secondary))
    }

    /// Send `notification` to both recipient lists on their channels.
    ///
    /// Outcomes are logged per recipient; the combined report is returned.
    pub async fn dispatch(
        &self,
        notification: &Notification,
        recipients: &[String],
        secondary_recipients: &[String],
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        report.merge(deliver(self.primary.as_deref(), recipients, notification).await);
        report.merge(deliver(self.secondary.as_deref(), secondary_recipients, notification).await);
        report
    }
}

async fn deliver(
    notifier: Option<&dyn Notifier>,
    recipients: &[String],
    notification: &Notification,
) -> DeliveryReport {
    if recipients.is_empty() {
        return DeliveryReport::default();
    }

    let Some(notifier) = notifier else {
        warn!(
            target_url = %notification.target,
            recipients = recipients.len(),
            "recipients configured but channel is not, notification dropped"
        );
        return DeliveryReport::default();
    };

    let channel = notifier.channel();
    let report = notifier.notify(recipients, notification).await;

    for recipient in &report.delivered {
        info!(
            channel,
            target_url = %notification.target,
            kind = %notification.kind,
            recipient = %recipient,
            "notification delivered"
        );
    }
    for (recipient, error) in &report.failed {
        warn!(
            channel,
            target_url = %notification.target,
            kind = %notification.kind,
            recipient = %recipient,
            error = %error,
            "notification delivery failed"
        );
    }
    for recipient in &report.skipped {
        warn!(
            channel,
            target_url = %notification.target,
            recipient = ?recipient,
            "skipping invalid recipient"
        );
    }
    if report.attempted() == 0 {
        warn!(channel, target_url = %notification.target, "no valid recipients, nothing sent");
    } else {
        debug!(channel, attempted = report.attempted(), "delivery round finished");
    }

    report
}
