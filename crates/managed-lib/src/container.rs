//! One monitored container and its per-cycle check sequence

use crate::alert::Action;
use crate::check::{CheckKind, MetricCheck, StaticCheck, Violation};
use crate::models::ContainerSpec;
use crate::runtime::{ContainerRuntime, InspectOutcome};
use tracing::debug;

/// What happened to a container during one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Liveness and metric checks all ran
    Checked,
    /// A liveness check is breached, metrics were skipped
    Stopped,
    /// Stats could not be fetched, metrics were skipped
    StatsUnavailable,
}

/// A container under supervision
///
/// Owns its checks and its action exclusively; nothing outside the
/// container mutates either.
#[derive(Debug)]
pub struct ManagedContainer {
    name: String,
    existence: StaticCheck,
    running: StaticCheck,
    cpu: MetricCheck,
    memory: MetricCheck,
    processes: MetricCheck,
    action: Action,
    last_inspect: Option<InspectOutcome>,
}

impl ManagedContainer {
    pub fn new(spec: &ContainerSpec) -> Self {
        let name = spec.name.clone();
        Self {
            existence: StaticCheck::existence(&name),
            running: StaticCheck::running(&name, spec.expected_running),
            cpu: MetricCheck::cpu(&name, spec.max_cpu_percent),
            memory: MetricCheck::memory(&name, spec.max_memory_bytes),
            processes: MetricCheck::processes(&name, spec.min_process_count),
            action: Action::new(),
            last_inspect: None,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Violations raised in the most recent cycle
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Inspect result from the most recent cycle
    pub fn last_inspect(&self) -> Option<&InspectOutcome> {
        self.last_inspect.as_ref()
    }

    /// Metrics are meaningless while the container is missing or in the
    /// wrong running state
    pub fn checks_should_stop(&self) -> bool {
        self.existence.is_breached() || self.running.is_breached()
    }

    fn record(&mut self, violation: Option<Violation>) {
        if let Some(violation) = violation {
            debug!(container = %self.name, check = %violation.kind, "Check breached");
            self.action.push(violation);
        }
    }

    fn check_statics(&mut self, outcome: &InspectOutcome) {
        let violation = self.existence.evaluate(outcome.exists());
        self.record(violation);

        if let Some(status) = outcome.status() {
            let violation = self.running.evaluate(status.running);
            self.record(violation);
        }
    }

    /// Run every check for this container once. Failures are recorded as
    /// violations and never returned.
    pub async fn run_cycle(&mut self, runtime: &dyn ContainerRuntime) -> CycleOutcome {
        self.action.clear();

        let outcome = runtime.inspect(&self.name).await;
        self.check_statics(&outcome);
        self.last_inspect = Some(outcome);

        if self.checks_should_stop() {
            return CycleOutcome::Stopped;
        }

        let stats = match runtime.stats(&self.name).await {
            Ok(stats) => stats,
            Err(e) => {
                self.action.push(Violation::new(
                    self.name.clone(),
                    CheckKind::Stats,
                    format!("could not retrieve resource usage: {}", e),
                ));
                return CycleOutcome::StatsUnavailable;
            }
        };

        let violation = self.cpu.evaluate(stats.cpu_percent());
        self.record(violation);
        let violation = self.memory.evaluate(stats.memory_usage_bytes as f64);
        self.record(violation);
        let violation = self.processes.evaluate(stats.process_count as f64);
        self.record(violation);

        CycleOutcome::Checked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContainerStatus, StatsSnapshot};
    use crate::runtime::RuntimeError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Runtime returning fixed answers and counting stats calls
    struct StubRuntime {
        inspect: Mutex<InspectOutcome>,
        stats: Mutex<Result<StatsSnapshot, String>>,
        stats_calls: AtomicUsize,
    }

    impl StubRuntime {
        fn new(inspect: InspectOutcome) -> Self {
            Self {
                inspect: Mutex::new(inspect),
                stats: Mutex::new(Ok(quiet_stats())),
                stats_calls: AtomicUsize::new(0),
            }
        }

        fn set_inspect(&self, outcome: InspectOutcome) {
            *self.inspect.lock().unwrap() = outcome;
        }
    }

    #[async_trait]
    impl ContainerRuntime for StubRuntime {
        async fn inspect(&self, _name: &str) -> InspectOutcome {
            self.inspect.lock().unwrap().clone()
        }

        async fn stats(&self, _name: &str) -> Result<StatsSnapshot, RuntimeError> {
            self.stats_calls.fetch_add(1, Ordering::SeqCst);
            self.stats
                .lock()
                .unwrap()
                .clone()
                .map_err(RuntimeError::Unreachable)
        }
    }

    fn quiet_stats() -> StatsSnapshot {
        StatsSnapshot {
            container_cpu_prev: 0,
            container_cpu_now: 10,
            system_cpu_prev: 0,
            system_cpu_now: 1000,
            online_cpus: 1,
            memory_usage_bytes: 1024,
            process_count: 3,
        }
    }

    fn spec() -> ContainerSpec {
        ContainerSpec {
            name: "web".to_string(),
            max_cpu_percent: 50.0,
            max_memory_bytes: 1_000_000,
            min_process_count: 1,
            expected_running: true,
        }
    }

    fn running() -> InspectOutcome {
        InspectOutcome::Found(ContainerStatus { running: true })
    }

    fn kinds(container: &ManagedContainer) -> Vec<CheckKind> {
        container.action().messages().iter().map(|v| v.kind).collect()
    }

    #[tokio::test]
    async fn test_healthy_container_has_no_violations() {
        let runtime = StubRuntime::new(running());
        let mut container = ManagedContainer::new(&spec());

        assert_eq!(container.run_cycle(&runtime).await, CycleOutcome::Checked);
        assert!(!container.action().should_send());
        assert_eq!(runtime.stats_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_container_skips_metrics() {
        let runtime = StubRuntime::new(InspectOutcome::NotFound);
        let mut container = ManagedContainer::new(&spec());

        assert_eq!(container.run_cycle(&runtime).await, CycleOutcome::Stopped);
        assert_eq!(kinds(&container), vec![CheckKind::Existence]);
        assert_eq!(runtime.stats_calls.load(Ordering::SeqCst), 0);

        // Still missing: suppressed, still skipped
        container.run_cycle(&runtime).await;
        assert!(container.action().is_empty());
        assert_eq!(runtime.stats_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreachable_runtime_counts_as_missing() {
        let runtime = StubRuntime::new(InspectOutcome::Unreachable("connection refused".into()));
        let mut container = ManagedContainer::new(&spec());

        assert_eq!(container.run_cycle(&runtime).await, CycleOutcome::Stopped);
        assert_eq!(kinds(&container), vec![CheckKind::Existence]);
        assert_eq!(runtime.stats_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stopped_container_skips_metrics() {
        let runtime = StubRuntime::new(InspectOutcome::Found(ContainerStatus { running: false }));
        let mut container = ManagedContainer::new(&spec());

        assert_eq!(container.run_cycle(&runtime).await, CycleOutcome::Stopped);
        assert_eq!(kinds(&container), vec![CheckKind::Running]);
        assert_eq!(runtime.stats_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expected_stopped_container_still_fetches_stats() {
        let runtime = StubRuntime::new(InspectOutcome::Found(ContainerStatus { running: false }));
        let mut container = ManagedContainer::new(&ContainerSpec {
            expected_running: false,
            ..spec()
        });

        assert_eq!(container.run_cycle(&runtime).await, CycleOutcome::Checked);
        assert!(container.action().is_empty());
        assert_eq!(runtime.stats_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovery_resumes_metrics() {
        let runtime = StubRuntime::new(InspectOutcome::NotFound);
        let mut container = ManagedContainer::new(&spec());

        container.run_cycle(&runtime).await;
        assert!(container.checks_should_stop());

        runtime.set_inspect(running());
        assert_eq!(container.run_cycle(&runtime).await, CycleOutcome::Checked);
        assert!(container.action().is_empty());
        assert_eq!(runtime.stats_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stats_failure_is_a_violation() {
        let runtime = StubRuntime::new(running());
        *runtime.stats.lock().unwrap() = Err("daemon restarting".to_string());
        let mut container = ManagedContainer::new(&spec());

        assert_eq!(
            container.run_cycle(&runtime).await,
            CycleOutcome::StatsUnavailable
        );
        assert_eq!(kinds(&container), vec![CheckKind::Stats]);
        assert!(container.action().messages()[0]
            .detail
            .contains("daemon restarting"));
    }

    #[tokio::test]
    async fn test_metric_violations_in_check_order() {
        let runtime = StubRuntime::new(running());
        *runtime.stats.lock().unwrap() = Ok(StatsSnapshot {
            container_cpu_now: 900,
            memory_usage_bytes: 5_000_000,
            process_count: 0,
            ..quiet_stats()
        });
        let mut container = ManagedContainer::new(&spec());

        container.run_cycle(&runtime).await;
        assert_eq!(
            kinds(&container),
            vec![CheckKind::Cpu, CheckKind::Memory, CheckKind::Processes]
        );
    }

    #[tokio::test]
    async fn test_action_cleared_each_cycle() {
        let runtime = StubRuntime::new(InspectOutcome::NotFound);
        let mut container = ManagedContainer::new(&spec());

        container.run_cycle(&runtime).await;
        assert!(container.action().should_send());

        runtime.set_inspect(running());
        container.run_cycle(&runtime).await;
        assert!(!container.action().should_send());
    }
}
