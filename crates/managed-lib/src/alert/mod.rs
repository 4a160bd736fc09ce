//! Violation accumulation and alert delivery
//!
//! This module provides:
//! - Per-container and host-level violation accumulators
//! - The delivery decision made once per polling cycle
//! - Notifiers that log violations or post them to an Alertmanager webhook

mod action;
mod notifier;

pub use action::{Action, Delivery, HostAction};
pub use notifier::{AlertmanagerAlert, AlertmanagerPayload, LogNotifier, WebhookNotifier};

use crate::check::Violation;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while delivering violations
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook rejected alert with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Sink for violations that the host action decided to send
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, violations: &[Violation]) -> Result<(), NotifyError>;
}
