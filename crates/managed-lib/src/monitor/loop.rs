//! Monitor loop
//!
//! Runs either a fixed number of cycles or until shutdown is signalled,
//! sleeping for the configured interval between cycles.

use crate::alert::{Delivery, HostAction, LogNotifier, Notifier};
use crate::check::Violation;
use crate::container::{CycleOutcome, ManagedContainer};
use crate::health::{components, HealthRegistry};
use crate::models::ContainerSpec;
use crate::observability::{MonitorMetrics, StructuredLogger};
use crate::runtime::{ContainerRuntime, InspectOutcome};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::time::Instant;
use tracing::{debug, info};

/// Configuration for the monitor loop
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Pause between cycles (default: 5 seconds)
    pub interval: Duration,
    /// Number of cycles to run; 0 runs until shutdown
    pub iterations: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            iterations: 0,
        }
    }
}

/// What a single cycle produced
#[derive(Debug)]
pub struct CycleReport {
    /// Every violation raised this cycle, in container order
    pub violations: Vec<Violation>,
    pub delivery: Delivery,
    /// Containers whose inspect or stats call failed
    pub unreachable: usize,
}

impl CycleReport {
    pub fn should_send(&self) -> bool {
        !self.violations.is_empty()
    }
}

pub struct Monitor {
    runtime: Arc<dyn ContainerRuntime>,
    notifier: Arc<dyn Notifier>,
    containers: Vec<ManagedContainer>,
    host: HostAction,
    config: MonitorConfig,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
    health: Option<HealthRegistry>,
}

impl Monitor {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        notifier: Arc<dyn Notifier>,
        specs: &[ContainerSpec],
        config: MonitorConfig,
    ) -> Self {
        let containers: Vec<_> = specs.iter().map(ManagedContainer::new).collect();

        let metrics = MonitorMetrics::new();
        metrics.set_containers_monitored(containers.len() as i64);

        Self {
            runtime,
            notifier,
            containers,
            host: HostAction::new(),
            config,
            metrics,
            logger: StructuredLogger::new("unknown"),
            health: None,
        }
    }

    pub fn containers(&self) -> &[ManagedContainer] {
        &self.containers
    }

    /// Check every container once and evaluate the host action
    pub async fn run_cycle(&mut self) -> CycleReport {
        let start = Instant::now();
        self.host.clear();

        let mut unreachable = 0;
        for container in &mut self.containers {
            let outcome = container.run_cycle(self.runtime.as_ref()).await;
            debug!(container = %container.name(), outcome = ?outcome, "Container checked");

            let inspect_failed =
                matches!(container.last_inspect(), Some(InspectOutcome::Unreachable(_)));
            if inspect_failed || outcome == CycleOutcome::StatsUnavailable {
                unreachable += 1;
                self.metrics.inc_runtime_errors();
            }

            self.host.merge(container.action());
        }

        let violations = self.host.messages().to_vec();
        for violation in &violations {
            self.logger.log_violation(violation);
            self.metrics.inc_violation(violation.kind.as_str());
        }

        let delivery = self.host.evaluate(self.notifier.as_ref()).await;
        if let Delivery::Failed(ref e) = delivery {
            self.metrics.inc_delivery_failures();
            self.logger
                .log_delivery_failure(violations.len(), &e.to_string());
        }

        self.metrics.observe_cycle(start.elapsed().as_secs_f64());
        self.update_health(unreachable, &delivery).await;

        CycleReport {
            violations,
            delivery,
            unreachable,
        }
    }

    async fn update_health(&self, unreachable: usize, delivery: &Delivery) {
        let Some(health) = &self.health else {
            return;
        };

        if unreachable > 0 {
            health
                .set_degraded(
                    components::RUNTIME,
                    format!("{} container(s) could not be queried", unreachable),
                )
                .await;
        } else {
            health.set_healthy(components::RUNTIME).await;
        }

        match delivery {
            Delivery::Failed(e) => health.set_degraded(components::NOTIFIER, e.to_string()).await,
            Delivery::Delivered(_) => health.set_healthy(components::NOTIFIER).await,
            Delivery::Skipped => {}
        }
    }

    /// Run cycles until the iteration bound is reached or shutdown is
    /// signalled. Returns the number of completed cycles.
    ///
    /// A bounded run returns right after its last cycle without sleeping
    /// the interval again. Dropping every shutdown sender does not stop
    /// the loop; it then runs without cancellation.
    pub async fn run(mut self, shutdown: broadcast::Receiver<()>) -> u64 {
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            iterations = self.config.iterations,
            containers = self.containers.len(),
            "Starting monitor loop"
        );

        let bounded = self.config.iterations > 0;
        let mut completed = 0u64;
        let mut shutdown = Some(shutdown);

        loop {
            if bounded && completed >= self.config.iterations {
                break;
            }

            match shutdown.as_mut().map(|rx| rx.try_recv()) {
                Some(Ok(())) | Some(Err(TryRecvError::Lagged(_))) => {
                    info!("Shutdown requested before cycle");
                    break;
                }
                Some(Err(TryRecvError::Closed)) => {
                    debug!("Shutdown channel closed, running without cancellation");
                    shutdown = None;
                }
                Some(Err(TryRecvError::Empty)) | None => {}
            }

            let start = Instant::now();
            let report = self.run_cycle().await;
            completed += 1;
            self.logger
                .log_cycle(completed, report.violations.len(), start.elapsed().as_millis());

            if bounded && completed >= self.config.iterations {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = shutdown_requested(&mut shutdown) => {
                    info!("Shutting down monitor loop");
                    break;
                }
            }
        }

        if let Some(health) = &self.health {
            health
                .set_unhealthy(components::MONITOR, "monitor loop stopped")
                .await;
        }

        completed
    }
}

/// Resolves once a shutdown signal arrives. Never resolves when the
/// channel has no senders left.
async fn shutdown_requested(shutdown: &mut Option<broadcast::Receiver<()>>) {
    let closed = match shutdown.as_mut() {
        Some(rx) => matches!(rx.recv().await, Err(RecvError::Closed)),
        None => true,
    };

    if closed {
        *shutdown = None;
        std::future::pending::<()>().await;
    }
}

/// Builder for the monitor loop
pub struct MonitorBuilder {
    runtime: Option<Arc<dyn ContainerRuntime>>,
    notifier: Option<Arc<dyn Notifier>>,
    containers: Vec<ContainerSpec>,
    config: MonitorConfig,
    node_name: String,
    health: Option<HealthRegistry>,
}

impl MonitorBuilder {
    pub fn new() -> Self {
        Self {
            runtime: None,
            notifier: None,
            containers: Vec::new(),
            config: MonitorConfig::default(),
            node_name: "unknown".to_string(),
            health: None,
        }
    }

    pub fn runtime(mut self, runtime: Arc<dyn ContainerRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Defaults to a [`LogNotifier`] when unset
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn containers(mut self, containers: Vec<ContainerSpec>) -> Self {
        self.containers = containers;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn iterations(mut self, iterations: u64) -> Self {
        self.config.iterations = iterations;
        self
    }

    pub fn node_name(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = node_name.into();
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn build(self) -> Result<Monitor> {
        let runtime = self
            .runtime
            .ok_or_else(|| anyhow::anyhow!("Container runtime is required"))?;
        if self.containers.is_empty() {
            anyhow::bail!("At least one container must be configured");
        }

        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(LogNotifier::new(self.node_name.clone())));

        let mut monitor = Monitor::new(runtime, notifier, &self.containers, self.config);
        monitor.logger = StructuredLogger::new(self.node_name);
        monitor.health = self.health;
        Ok(monitor)
    }
}

impl Default for MonitorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
