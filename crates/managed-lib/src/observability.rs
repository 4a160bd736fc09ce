//! Observability infrastructure for the monitor
//!
//! Provides:
//! - Prometheus metrics (cycle latency, violations by check, runtime and delivery errors)
//! - Structured JSON logging with tracing

use crate::check::Violation;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for cycle latency (in seconds)
const CYCLE_LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    cycles: IntCounter,
    cycle_latency_seconds: Histogram,
    violations: IntCounterVec,
    runtime_errors: IntCounter,
    delivery_failures: IntCounter,
    containers_monitored: IntGauge,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            cycles: register_int_counter!(
                "managedd_cycles_total",
                "Number of completed polling cycles"
            )
            .expect("Failed to register cycles_total"),

            cycle_latency_seconds: register_histogram!(
                "managedd_cycle_latency_seconds",
                "Time spent checking every container in one cycle",
                CYCLE_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_latency_seconds"),

            violations: register_int_counter_vec!(
                "managedd_violations_total",
                "Violations raised, by check kind",
                &["check"]
            )
            .expect("Failed to register violations_total"),

            runtime_errors: register_int_counter!(
                "managedd_runtime_errors_total",
                "Inspect or stats calls that failed to reach the runtime"
            )
            .expect("Failed to register runtime_errors_total"),

            delivery_failures: register_int_counter!(
                "managedd_delivery_failures_total",
                "Alert deliveries rejected or failed"
            )
            .expect("Failed to register delivery_failures_total"),

            containers_monitored: register_int_gauge!(
                "managedd_containers_monitored",
                "Number of configured containers"
            )
            .expect("Failed to register containers_monitored"),
        }
    }
}

/// Lightweight handle to the global metrics instance.
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_cycle(&self, duration_secs: f64) {
        self.inner().cycles.inc();
        self.inner().cycle_latency_seconds.observe(duration_secs);
    }

    pub fn inc_violation(&self, check: &str) {
        self.inner().violations.with_label_values(&[check]).inc();
    }

    pub fn inc_runtime_errors(&self) {
        self.inner().runtime_errors.inc();
    }

    pub fn inc_delivery_failures(&self) {
        self.inner().delivery_failures.inc();
    }

    pub fn set_containers_monitored(&self, count: i64) {
        self.inner().containers_monitored.set(count);
    }
}

/// Structured logger for monitor events
#[derive(Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    pub fn log_startup(&self, version: &str, containers: usize, iterations: u64) {
        info!(
            event = "monitor_started",
            node = %self.node_name,
            version = %version,
            containers = containers,
            iterations = iterations,
            "Container monitor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "monitor_shutdown",
            node = %self.node_name,
            reason = %reason,
            "Container monitor shutting down"
        );
    }

    pub fn log_violation(&self, violation: &Violation) {
        info!(
            event = "violation_raised",
            node = %self.node_name,
            container = %violation.container,
            check = %violation.kind,
            detail = %violation.detail,
            "Container check breached"
        );
    }

    pub fn log_cycle(&self, cycle: u64, violations: usize, elapsed_ms: u128) {
        info!(
            event = "cycle_completed",
            node = %self.node_name,
            cycle = cycle,
            violations = violations,
            elapsed_ms = elapsed_ms,
            "Polling cycle complete"
        );
    }

    pub fn log_delivery_failure(&self, violations: usize, error: &str) {
        warn!(
            event = "delivery_failed",
            node = %self.node_name,
            violations = violations,
            error = %error,
            "Failed to deliver alerts, dropping them for this cycle"
        );
    }
}
