//! Boolean equality check

use super::{BreachState, CheckKind, Violation};

/// Single boolean test with breach memory (existence, running state)
#[derive(Debug, Clone)]
pub struct StaticCheck {
    container: String,
    kind: CheckKind,
    expected: bool,
    state: BreachState,
}

impl StaticCheck {
    pub fn new(container: impl Into<String>, kind: CheckKind, expected: bool) -> Self {
        Self {
            container: container.into(),
            kind,
            expected,
            state: BreachState::Clear,
        }
    }

    /// The container must exist
    pub fn existence(container: impl Into<String>) -> Self {
        Self::new(container, CheckKind::Existence, true)
    }

    /// The container must be in the expected running state
    pub fn running(container: impl Into<String>, expected: bool) -> Self {
        Self::new(container, CheckKind::Running, expected)
    }

    pub fn expected(&self) -> bool {
        self.expected
    }

    pub fn is_breached(&self) -> bool {
        self.state.is_breached()
    }

    pub fn evaluate(&mut self, actual: bool) -> Option<Violation> {
        if !self.state.observe(actual != self.expected) {
            return None;
        }

        let detail = match (self.kind, self.expected) {
            (CheckKind::Existence, _) => "container does not exist or could not be inspected".to_string(),
            (CheckKind::Running, true) => "container is not running".to_string(),
            (CheckKind::Running, false) => "container is running but expected to be stopped".to_string(),
            (kind, expected) => format!("{} is {}, expected {}", kind, actual, expected),
        };

        Some(Violation::new(self.container.clone(), self.kind, detail))
    }
}
