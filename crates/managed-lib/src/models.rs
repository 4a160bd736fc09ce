//! Core data models for the container monitor

use serde::{Deserialize, Serialize};

/// Per-container thresholds as read from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Runtime container name or ID
    pub name: String,
    /// CPU usage above this percentage is a violation
    pub max_cpu_percent: f64,
    /// Memory usage above this many bytes is a violation
    pub max_memory_bytes: u64,
    /// Fewer processes than this is a violation
    #[serde(default)]
    pub min_process_count: u64,
    /// Whether the container is expected to be running
    #[serde(default = "default_expected_running")]
    pub expected_running: bool,
}

fn default_expected_running() -> bool {
    true
}

/// Liveness state reported by the runtime for an existing container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub running: bool,
}

/// Point-in-time resource usage for one container
///
/// The runtime reports the CPU counters as a pre/post pair from a single
/// request, so no state has to be kept between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub container_cpu_prev: u64,
    pub container_cpu_now: u64,
    pub system_cpu_prev: u64,
    pub system_cpu_now: u64,
    pub online_cpus: u64,
    pub memory_usage_bytes: u64,
    pub process_count: u64,
}

impl StatsSnapshot {
    /// CPU usage as a percentage of a single core, scaled by online CPUs
    pub fn cpu_percent(&self) -> f64 {
        let cpu_delta = self.container_cpu_now.saturating_sub(self.container_cpu_prev);
        let system_delta = self.system_cpu_now.saturating_sub(self.system_cpu_prev);

        if system_delta == 0 {
            return 0.0;
        }

        (cpu_delta as f64 / system_delta as f64) * self.online_cpus as f64 * 100.0
    }
}
