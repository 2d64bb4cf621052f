//! sitewatch - website uptime monitor
//!
//! Usage:
//!     sitewatch --config <path>
//!
//! See --help for more options.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use sitewatch::config::{load_config, Config};
use sitewatch::metrics::{MetricsCollector, MetricsServer};
use sitewatch::notify::Notifiers;
use sitewatch::probe::HttpProber;
use sitewatch::scheduler::{targets_from_config, Scheduler};
use sitewatch::util::{init_logging, ShutdownSignal};

/// Website uptime monitor with alerting and Prometheus metrics.
#[derive(Parser, Debug)]
#[command(name = "sitewatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (YAML or JSON)
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config).with_context(|| {
        format!(
            "failed to load configuration from '{}'",
            cli.config.display()
        )
    })?;

    // CLI overrides config
    let log_level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.global.log_level);

    init_logging(log_level, &config.global.log_format).context("failed to initialize logging")?;

    if cli.validate {
        info!("Configuration is valid");
        println!("Configuration is valid.");
        println!("  Websites: {}", config.websites.len());
        for website in &config.websites {
            println!(
                "    - {} every {}s ({} custodians, {} sms)",
                website.url,
                website.poll_interval,
                website.custodians.len(),
                website.sms_custodians.len()
            );
        }
        return Ok(());
    }

    info!(
        config_path = %cli.config.display(),
        websites = config.websites.len(),
        alerting = ?config.alerting,
        "sitewatch starting"
    );

    for website in &config.websites {
        info!(
            url = %website.url,
            poll_interval = website.poll_interval,
            custodians = website.custodians.len(),
            sms_custodians = website.sms_custodians.len(),
            "configured website"
        );
    }

    run(config)
}

/// Run the monitor with the given configuration.
fn run(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(async { run_async(config).await })
}

/// Async entry point for the monitor.
async fn run_async(config: Config) -> Result<()> {
    let shutdown = ShutdownSignal::new();
    let metrics = MetricsCollector::new();

    let prober = HttpProber::new(&config.probe).context("failed to build HTTP client")?;
    let notifiers = Notifiers::from_config(&config).context("failed to configure notifications")?;

    let mut handles = Vec::new();

    let metrics_config = &config.global.metrics;
    if metrics_config.enabled {
        let server = MetricsServer::bind(
            metrics_config.address,
            metrics_config.path.clone(),
            metrics.clone(),
        )
        .await
        .with_context(|| {
            format!(
                "failed to bind metrics server on {}",
                metrics_config.address
            )
        })?;
        handles.push(tokio::spawn(server.run(shutdown.subscribe())));
    } else {
        warn!("metrics endpoint disabled");
    }

    let scheduler = Scheduler::new(
        targets_from_config(&config),
        Arc::new(prober),
        notifiers,
        metrics,
    );
    handles.extend(scheduler.spawn(&shutdown));

    info!("sitewatch is running");
    info!("press Ctrl+C to stop");

    shutdown.trigger_on_signal().await;

    // Workers finish their in-flight probe before exiting.
    for result in futures::future::join_all(handles).await {
        if let Err(e) = result {
            warn!(error = %e, "task ended abnormally");
        }
    }

    info!("sitewatch shut down complete");
    Ok(())
}
