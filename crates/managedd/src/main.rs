//! managedd - container supervision daemon
//!
//! Polls a fixed set of Docker containers, checks liveness and resource
//! thresholds, and raises edge-triggered alerts.

use anyhow::{Context, Result};
use clap::Parser;
use managed_lib::{
    health::{components, HealthRegistry},
    DockerRuntime, LogNotifier, MonitorBuilder, Notifier, StructuredLogger, TimeoutRuntime,
    WebhookNotifier,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

use config::{MonitorSettings, NotifierKind};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Container supervision daemon
#[derive(Parser)]
#[command(name = "managedd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (toml, yaml or json)
    #[arg(long, short, env = "MANAGED_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured iteration count (0 runs forever)
    #[arg(long)]
    iterations: Option<u64>,
}

fn build_notifier(settings: &MonitorSettings) -> Result<Arc<dyn Notifier>> {
    match settings.notifier.kind {
        NotifierKind::Log => Ok(Arc::new(LogNotifier::new(settings.node_name.clone()))),
        NotifierKind::Webhook => {
            let url = settings
                .notifier
                .webhook_url
                .clone()
                .context("webhook_url is required for the webhook notifier")?;
            Ok(Arc::new(WebhookNotifier::new(url, settings.node_name.clone())?))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let cli = Cli::parse();

    let mut settings = MonitorSettings::load(cli.config.as_deref())?;
    if let Some(iterations) = cli.iterations {
        settings.iterations = iterations;
    }
    info!(
        node_name = %settings.node_name,
        containers = settings.containers.len(),
        "Monitor configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MONITOR).await;
    health_registry.register(components::RUNTIME).await;
    health_registry.register(components::NOTIFIER).await;

    let logger = StructuredLogger::new(&settings.node_name);

    let docker = DockerRuntime::connect().await?;
    let runtime = Arc::new(TimeoutRuntime::new(docker, settings.runtime_timeout()));

    let monitor = MonitorBuilder::new()
        .runtime(runtime)
        .notifier(build_notifier(&settings)?)
        .containers(settings.containers.clone())
        .interval(settings.interval())
        .iterations(settings.iterations)
        .node_name(settings.node_name.clone())
        .health(health_registry.clone())
        .build()?;

    let app_state = Arc::new(api::AppState::new(health_registry.clone()));
    let api_port = settings.api_port;
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, app_state).await {
            error!(error = %e, "API server stopped");
        }
    });

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    logger.log_startup(VERSION, settings.containers.len(), settings.iterations);
    health_registry.set_ready(true).await;

    let mut monitor_handle = tokio::spawn(monitor.run(shutdown_rx));

    let completed = tokio::select! {
        result = &mut monitor_handle => result?,
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
            let _ = shutdown_tx.send(());
            monitor_handle.await?
        }
    };

    info!(cycles = completed, "Monitor finished");
    Ok(())
}
