//! Threshold and liveness checks with breach memory
//!
//! Every check is edge-triggered: it reports a violation when it moves from
//! clear into breach, stays quiet while the breach persists, and re-arms
//! silently once a non-breaching value is observed.

mod metric;
mod r#static;

pub use metric::{Bound, MetricCheck};
pub use r#static::StaticCheck;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hysteresis state of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreachState {
    #[default]
    Clear,
    Breached,
}

impl BreachState {
    /// Feed one evaluation result into the state machine.
    ///
    /// Returns true only on the `Clear -> Breached` transition.
    pub fn observe(&mut self, breaching: bool) -> bool {
        let (next, fired) = match (*self, breaching) {
            (BreachState::Clear, true) => (BreachState::Breached, true),
            (BreachState::Breached, true) => (BreachState::Breached, false),
            (_, false) => (BreachState::Clear, false),
        };
        *self = next;
        fired
    }

    pub fn is_breached(&self) -> bool {
        matches!(self, BreachState::Breached)
    }
}

/// Which check produced a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Existence,
    Running,
    Cpu,
    Memory,
    Processes,
    /// Resource usage could not be retrieved
    Stats,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Existence => "existence",
            CheckKind::Running => "running",
            CheckKind::Cpu => "cpu",
            CheckKind::Memory => "memory",
            CheckKind::Processes => "processes",
            CheckKind::Stats => "stats",
        }
    }

    /// Liveness failures are more severe than resource pressure
    pub fn is_liveness(&self) -> bool {
        matches!(self, CheckKind::Existence | CheckKind::Running)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One breaching check outcome for one container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub container: String,
    pub kind: CheckKind,
    pub detail: String,
}

impl Violation {
    pub fn new(container: impl Into<String>, kind: CheckKind, detail: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.container, self.kind, self.detail)
    }
}
