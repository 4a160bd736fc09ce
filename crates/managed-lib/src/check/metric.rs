//! Numeric threshold check

use super::{BreachState, CheckKind, Violation};

/// Direction in which a metric breaches its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Breach when the value rises above the limit
    Upper,
    /// Breach when the value falls below the limit
    Lower,
}

/// Single numeric threshold test with breach memory
#[derive(Debug, Clone)]
pub struct MetricCheck {
    container: String,
    kind: CheckKind,
    limit: f64,
    bound: Bound,
    state: BreachState,
}

impl MetricCheck {
    pub fn new(container: impl Into<String>, kind: CheckKind, limit: f64, bound: Bound) -> Self {
        Self {
            container: container.into(),
            kind,
            limit,
            bound,
            state: BreachState::Clear,
        }
    }

    /// CPU percentage ceiling
    pub fn cpu(container: impl Into<String>, max_percent: f64) -> Self {
        Self::new(container, CheckKind::Cpu, max_percent, Bound::Upper)
    }

    /// Memory usage ceiling in bytes
    pub fn memory(container: impl Into<String>, max_bytes: u64) -> Self {
        Self::new(container, CheckKind::Memory, max_bytes as f64, Bound::Upper)
    }

    /// Minimum number of processes
    pub fn processes(container: impl Into<String>, min_count: u64) -> Self {
        Self::new(container, CheckKind::Processes, min_count as f64, Bound::Lower)
    }

    pub fn kind(&self) -> CheckKind {
        self.kind
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    pub fn state(&self) -> BreachState {
        self.state
    }

    fn breaches(&self, value: f64) -> bool {
        match self.bound {
            Bound::Upper => value > self.limit,
            Bound::Lower => value < self.limit,
        }
    }

    /// Evaluate the current value, returning a violation on a new breach
    pub fn evaluate(&mut self, value: f64) -> Option<Violation> {
        if !self.state.observe(self.breaches(value)) {
            return None;
        }

        Some(Violation::new(
            self.container.clone(),
            self.kind,
            self.describe(value),
        ))
    }

    fn describe(&self, value: f64) -> String {
        match self.kind {
            CheckKind::Cpu => format!(
                "cpu usage {:.2}% exceeds limit {:.2}%",
                value, self.limit
            ),
            CheckKind::Memory => format!(
                "memory usage {} bytes exceeds limit {} bytes",
                value as u64, self.limit as u64
            ),
            CheckKind::Processes => format!(
                "{} processes running, expected at least {}",
                value as u64, self.limit as u64
            ),
            kind => {
                let relation = match self.bound {
                    Bound::Upper => "above",
                    Bound::Lower => "below",
                };
                format!("{} value {} is {} limit {}", kind, value, relation, self.limit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_bound_edge_triggered() {
        let mut check = MetricCheck::cpu("web", 50.0);

        let first = check.evaluate(80.0).expect("first breach should fire");
        assert_eq!(first.kind, CheckKind::Cpu);
        assert_eq!(first.container, "web");
        assert!(first.detail.contains("80.00%"));

        // Sustained breach is suppressed
        assert!(check.evaluate(90.0).is_none());
        assert!(check.evaluate(80.0).is_none());

        // Recovery is silent and re-arms the check
        assert!(check.evaluate(30.0).is_none());
        assert_eq!(check.state(), BreachState::Clear);
        assert!(check.evaluate(80.0).is_some());
    }

    #[test]
    fn test_limit_itself_is_not_a_breach() {
        let mut cpu = MetricCheck::cpu("web", 50.0);
        assert!(cpu.evaluate(50.0).is_none());

        let mut procs = MetricCheck::processes("web", 2);
        assert!(procs.evaluate(2.0).is_none());
    }

    #[test]
    fn test_lower_bound_breaches_below_minimum() {
        let mut check = MetricCheck::processes("worker", 3);

        assert!(check.evaluate(5.0).is_none());

        let violation = check.evaluate(1.0).unwrap();
        assert_eq!(violation.kind, CheckKind::Processes);
        assert!(violation.detail.contains("expected at least 3"));

        assert!(check.evaluate(0.0).is_none());
    }

    #[test]
    fn test_memory_detail_in_bytes() {
        let mut check = MetricCheck::memory("db", 1024);
        let violation = check.evaluate(2048.0).unwrap();
        assert_eq!(
            violation.detail,
            "memory usage 2048 bytes exceeds limit 1024 bytes"
        );
    }

    #[test]
    fn test_alternating_sequence_fires_on_every_rising_edge() {
        let mut check = MetricCheck::memory("db", 100);
        let fired: Vec<bool> = [200.0, 200.0, 50.0, 200.0, 50.0, 50.0, 200.0, 200.0]
            .iter()
            .map(|v| check.evaluate(*v).is_some())
            .collect();

        assert_eq!(
            fired,
            vec![true, false, false, true, false, false, true, false]
        );
    }
}
