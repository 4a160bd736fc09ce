//! Daemon configuration

use anyhow::{bail, Context, Result};
use managed_lib::ContainerSpec;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Monitor configuration, read once at startup
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    /// Host label used in logs and alerts
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Pause between polling cycles in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Number of cycles to run, 0 runs forever
    #[serde(default)]
    pub iterations: u64,

    /// Deadline for each runtime call in seconds
    #[serde(default = "default_runtime_timeout")]
    pub runtime_timeout_secs: u64,

    #[serde(default)]
    pub containers: Vec<ContainerSpec>,

    #[serde(default)]
    pub notifier: NotifierSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Log,
    Webhook,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifierSettings {
    #[serde(default)]
    pub kind: NotifierKind,
    pub webhook_url: Option<String>,
}

fn default_node_name() -> String {
    std::env::var("NODE_NAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_runtime_timeout() -> u64 {
    10
}

impl MonitorSettings {
    /// Load configuration from an optional file overlaid with `MANAGED_*`
    /// environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings: Self = builder
            .add_source(
                config::Environment::with_prefix("MANAGED")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.containers.is_empty() {
            bail!("No containers configured");
        }

        let mut seen = HashSet::new();
        for spec in &self.containers {
            if spec.name.trim().is_empty() {
                bail!("Container name must not be empty");
            }
            if !seen.insert(spec.name.as_str()) {
                bail!("Container {} is configured more than once", spec.name);
            }
            if !spec.max_cpu_percent.is_finite() || spec.max_cpu_percent < 0.0 {
                bail!(
                    "Container {} has invalid max_cpu_percent {}",
                    spec.name,
                    spec.max_cpu_percent
                );
            }
        }

        if self.interval_ms == 0 {
            bail!("interval_ms must be greater than zero");
        }

        if self.notifier.kind == NotifierKind::Webhook {
            let url = self
                .notifier
                .webhook_url
                .as_deref()
                .context("notifier.webhook_url is required for the webhook notifier")?;
            url::Url::parse(url).with_context(|| format!("Invalid webhook URL {}", url))?;
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn runtime_timeout(&self) -> Duration {
        Duration::from_secs(self.runtime_timeout_secs)
    }
}
