//! Notifier implementations
//!
//! Handles:
//! - Logging each violation as a structured warning
//! - Formatting violations as Alertmanager webhook alerts

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Notifier, NotifyError};
use crate::check::Violation;

/// Default timeout for webhook requests
const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Delivers violations to the log
#[derive(Debug, Clone)]
pub struct LogNotifier {
    node_name: String,
}

impl LogNotifier {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, violations: &[Violation]) -> Result<(), NotifyError> {
        for violation in violations {
            warn!(
                event = "alert",
                node = %self.node_name,
                container = %violation.container,
                check = %violation.kind,
                detail = %violation.detail,
                "Container check violated"
            );
        }
        Ok(())
    }
}

/// Alertmanager webhook alert format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertmanagerAlert {
    /// Always "firing"; recovery is not reported
    pub status: String,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    /// Start time in RFC3339 format
    pub starts_at: String,
}

/// Alertmanager webhook payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertmanagerPayload {
    pub alerts: Vec<AlertmanagerAlert>,
}

impl AlertmanagerPayload {
    /// One firing alert per violation, in the order they were raised
    pub fn from_violations(violations: &[Violation], node_name: &str, timestamp: &str) -> Self {
        let alerts = violations
            .iter()
            .map(|violation| {
                let severity = if violation.kind.is_liveness() {
                    "critical"
                } else {
                    "warning"
                };

                let mut labels = HashMap::new();
                labels.insert(
                    "alertname".to_string(),
                    "ManagedContainerViolation".to_string(),
                );
                labels.insert("severity".to_string(), severity.to_string());
                labels.insert("container".to_string(), violation.container.clone());
                labels.insert("check".to_string(), violation.kind.to_string());
                labels.insert("node".to_string(), node_name.to_string());

                let mut annotations = HashMap::new();
                annotations.insert(
                    "summary".to_string(),
                    format!(
                        "{} check failed for container {}",
                        violation.kind, violation.container
                    ),
                );
                annotations.insert("description".to_string(), violation.detail.clone());

                AlertmanagerAlert {
                    status: "firing".to_string(),
                    labels,
                    annotations,
                    starts_at: timestamp.to_string(),
                }
            })
            .collect();

        Self { alerts }
    }
}

/// Posts violations to an Alertmanager-compatible webhook
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    node_name: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, node_name: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_WEBHOOK_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            node_name: node_name.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, violations: &[Violation]) -> Result<(), NotifyError> {
        let timestamp = chrono::Utc::now().to_rfc3339();
        let payload = AlertmanagerPayload::from_violations(violations, &self.node_name, &timestamp);

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(alerts = payload.alerts.len(), url = %self.url, "Delivered alerts to webhook");
        Ok(())
    }
}
