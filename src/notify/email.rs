//! SMTP notification channel.

use super::{partition_recipients, DeliveryReport, Notification, Notifier, NotifyError};
use crate::config::{EmailConfig, SmtpTls};
use crate::health::AlertKind;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// How much text a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStyle {
    /// Regular email with subject and explanatory body.
    Full,
    /// One short line, for email-to-SMS gateways.
    Compact,
}

/// Sends notifications as plain-text email.
///
/// The transport pools connections and is shared by every worker.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    style: MessageStyle,
}

impl EmailNotifier {
    /// Configure a notifier from an SMTP section.
    pub fn new(config: &EmailConfig, style: MessageStyle) -> Result<Self, NotifyError> {
        let mut builder = match config.tls {
            SmtpTls::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            }
            SmtpTls::Wrapper => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host),
        }
        .port(config.smtp_port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        let from = parse_sender(config.sender())?;
        Ok(Self::with_transport(builder.build(), from, style))
    }

    /// Use an already built transport.
    pub fn with_transport(
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
        style: MessageStyle,
    ) -> Self {
        Self {
            transport,
            from,
            style,
        }
    }

    fn build_message(
        &self,
        to: Mailbox,
        notification: &Notification,
    ) -> Result<Message, lettre::error::Error> {
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject(notification.kind))
            .header(ContentType::TEXT_PLAIN)
            .body(body(self.style, notification))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        match self.style {
            MessageStyle::Full => "email",
            MessageStyle::Compact => "sms",
        }
    }

    async fn notify(&self, recipients: &[String], notification: &Notification) -> DeliveryReport {
        let (candidates, skipped) = partition_recipients(recipients);
        let mut report = DeliveryReport {
            skipped,
            ..DeliveryReport::default()
        };

        for recipient in candidates {
            let Ok(mailbox) = recipient.parse::<Mailbox>() else {
                report.skipped.push(recipient.to_string());
                continue;
            };

            let message = match self.build_message(mailbox, notification) {
                Ok(message) => message,
                Err(e) => {
                    report.failed.push((recipient.to_string(), e.to_string()));
                    continue;
                }
            };

            match self.transport.send(message).await {
                Ok(_) => report.delivered.push(recipient.to_string()),
                Err(e) => report.failed.push((recipient.to_string(), e.to_string())),
            }
        }

        report
    }
}

fn parse_sender(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse::<Mailbox>()
        .map_err(|source| NotifyError::InvalidSender {
            address: address.to_string(),
            source,
        })
}

fn subject(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Down => "Website Down Alert",
        AlertKind::Recovered => "Website Recovered",
    }
}

fn body(style: MessageStyle, notification: &Notification) -> String {
    match (style, notification.kind) {
        (MessageStyle::Full, AlertKind::Down) => format!(
            "The website {} is down.\n\nReason: {}\n",
            notification.target, notification.reason
        ),
        (MessageStyle::Full, AlertKind::Recovered) => format!(
            "The website {} is back up.\n\nStatus: {}\n",
            notification.target, notification.reason
        ),
        (MessageStyle::Compact, AlertKind::Down) => {
            format!("DOWN {} ({})", notification.target, notification.reason)
        }
        (MessageStyle::Compact, AlertKind::Recovered) => format!("UP {}", notification.target),
    }
}
