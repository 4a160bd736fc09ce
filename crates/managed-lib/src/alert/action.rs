//! Violation accumulators
//!
//! Each managed container fills its own [`Action`] during a cycle. The
//! monitor folds those into a [`HostAction`], which decides once per cycle
//! whether anything has to be delivered.

use super::{Notifier, NotifyError};
use crate::check::Violation;

/// Ordered violations gathered during one cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Action {
    messages: Vec<Violation>,
}

impl Action {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every message from the previous cycle
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn push(&mut self, violation: Violation) {
        self.messages.push(violation);
    }

    /// Append another accumulator's messages, preserving their order
    pub fn merge(&mut self, other: &Action) {
        self.messages.extend(other.messages.iter().cloned());
    }

    pub fn should_send(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Violation] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Extend<Violation> for Action {
    fn extend<T: IntoIterator<Item = Violation>>(&mut self, iter: T) {
        self.messages.extend(iter);
    }
}

/// Outcome of evaluating the host action at the end of a cycle
#[derive(Debug)]
pub enum Delivery {
    /// Nothing to send this cycle
    Skipped,
    /// Notifier accepted this many violations
    Delivered(usize),
    /// Notifier failed; the messages are dropped regardless
    Failed(NotifyError),
}

/// Host-level accumulator merged from every container's action
#[derive(Debug, Default)]
pub struct HostAction {
    action: Action,
}

impl HostAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an ordered sequence of container actions into a fresh host action
    pub fn collect<'a, I>(actions: I) -> Self
    where
        I: IntoIterator<Item = &'a Action>,
    {
        actions.into_iter().fold(Self::new(), |mut host, action| {
            host.merge(action);
            host
        })
    }

    pub fn clear(&mut self) {
        self.action.clear();
    }

    pub fn merge(&mut self, other: &Action) {
        self.action.merge(other);
    }

    pub fn should_send(&self) -> bool {
        self.action.should_send()
    }

    pub fn messages(&self) -> &[Violation] {
        self.action.messages()
    }

    /// Deliver accumulated violations if there are any, then clear.
    pub async fn evaluate(&mut self, notifier: &dyn Notifier) -> Delivery {
        if !self.should_send() {
            self.clear();
            return Delivery::Skipped;
        }

        let count = self.action.len();
        let delivery = match notifier.deliver(self.action.messages()).await {
            Ok(()) => Delivery::Delivered(count),
            Err(e) => Delivery::Failed(e),
        };

        self.clear();
        delivery
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        batches: Mutex<Vec<Vec<Violation>>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn deliver(&self, violations: &[Violation]) -> Result<(), NotifyError> {
            self.batches.lock().unwrap().push(violations.to_vec());
            if self.fail {
                Err(NotifyError::Rejected {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn action_with(container: &str, kinds: &[CheckKind]) -> Action {
        let mut action = Action::new();
        for kind in kinds {
            action.push(Violation::new(container, *kind, "breach"));
        }
        action
    }

    #[test]
    fn test_should_send_after_clear_and_merge() {
        let mut host = HostAction::new();
        host.merge(&action_with("web", &[CheckKind::Cpu]));
        assert!(host.should_send());

        host.clear();
        assert!(!host.should_send());

        host.merge(&Action::new());
        assert!(!host.should_send());

        host.merge(&action_with("db", &[CheckKind::Memory]));
        assert!(host.should_send());
    }

    #[test]
    fn test_merge_preserves_order_and_source() {
        let web = action_with("web", &[CheckKind::Existence]);
        let db = action_with("db", &[CheckKind::Cpu, CheckKind::Memory]);

        let host = HostAction::collect([&web, &db]);
        let containers: Vec<_> = host.messages().iter().map(|v| v.container.as_str()).collect();
        let kinds: Vec<_> = host.messages().iter().map(|v| v.kind).collect();

        assert_eq!(containers, vec!["web", "db", "db"]);
        assert_eq!(
            kinds,
            vec![CheckKind::Existence, CheckKind::Cpu, CheckKind::Memory]
        );

        // Source actions are untouched
        assert_eq!(web.len(), 1);
        assert_eq!(db.len(), 2);
    }

    #[tokio::test]
    async fn test_evaluate_skips_when_empty() {
        let notifier = RecordingNotifier::default();
        let mut host = HostAction::new();

        assert!(matches!(host.evaluate(&notifier).await, Delivery::Skipped));
        assert!(notifier.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_delivers_then_clears() {
        let notifier = RecordingNotifier::default();
        let mut host = HostAction::collect([&action_with("web", &[CheckKind::Cpu, CheckKind::Memory])]);

        assert!(matches!(
            host.evaluate(&notifier).await,
            Delivery::Delivered(2)
        ));
        assert!(!host.should_send());

        let batches = notifier.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }

    #[tokio::test]
    async fn test_evaluate_clears_on_failure() {
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        let mut host = HostAction::collect([&action_with("web", &[CheckKind::Running])]);

        assert!(matches!(host.evaluate(&notifier).await, Delivery::Failed(_)));
        assert!(!host.should_send());
    }
}
