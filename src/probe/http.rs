//! HTTP probe implementation.

use super::{ProbeOutcome, Prober};
use crate::config::ProbeConfig;
use async_trait::async_trait;
use std::error::Error as _;
use std::io;
use std::time::{Duration, Instant};
use tracing::debug;

/// Probes websites with a GET request through a shared client.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
    retry_on_premature_close: bool,
}

impl HttpProber {
    /// Build a prober from the probe settings.
    pub fn new(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            // A 3xx is the website's own answer and classifies as up.
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            timeout: config.timeout,
            retry_on_premature_close: config.retry_on_premature_close,
        })
    }

    async fn get(&self, url: &str) -> Result<u16, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        Ok(response.status().as_u16())
    }

    fn describe(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            return format!("timed out after {}", humantime::format_duration(self.timeout));
        }

        // Keep only the innermost cause; outer layers repeat the URL.
        let mut innermost: Option<&(dyn std::error::Error + 'static)> = None;
        let mut source = err.source();
        while let Some(cause) = source {
            innermost = Some(cause);
            source = cause.source();
        }
        match innermost {
            Some(cause) => cause.to_string(),
            None => err.to_string(),
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let start = Instant::now();

        let mut result = self.get(url).await;
        let retry = matches!(&result, Err(e) if self.retry_on_premature_close && is_premature_close(e));
        if retry {
            debug!(url = %url, "connection closed early, retrying once");
            result = self.get(url).await;
        }

        let latency = start.elapsed();
        match result {
            Ok(status) => ProbeOutcome::from_status(status, latency),
            Err(e) => ProbeOutcome::transport(self.describe(&e), latency),
        }
    }
}

/// Whether the peer dropped the connection before a full response arrived.
fn is_premature_close(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() {
                return true;
            }
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
