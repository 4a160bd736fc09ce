//! Container runtime boundary
//!
//! The monitor only talks to the runtime through [`ContainerRuntime`]. The
//! Docker implementation lives in [`docker`]; tests supply scripted fakes.

mod docker;

pub use docker::DockerRuntime;

use crate::models::{ContainerStatus, StatsSnapshot};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by runtime queries
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("container {0} not found")]
    NotFound(String),

    #[error("runtime unreachable: {0}")]
    Unreachable(String),

    #[error("runtime call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed stats response: {0}")]
    MalformedStats(String),
}

/// Result of asking the runtime about a container's existence and state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectOutcome {
    Found(ContainerStatus),
    NotFound,
    Unreachable(String),
}

impl InspectOutcome {
    /// Whether the existence check observes the container as present.
    ///
    /// A container that could not be queried is treated exactly like one
    /// that does not exist.
    pub fn exists(&self) -> bool {
        matches!(self, InspectOutcome::Found(_))
    }

    pub fn status(&self) -> Option<ContainerStatus> {
        match self {
            InspectOutcome::Found(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<RuntimeError> for InspectOutcome {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::NotFound(_) => InspectOutcome::NotFound,
            other => InspectOutcome::Unreachable(other.to_string()),
        }
    }
}

/// Liveness and resource-usage queries against the container runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Look up whether a container exists and whether it is running
    async fn inspect(&self, name: &str) -> InspectOutcome;

    /// Fetch a resource-usage snapshot for a container
    async fn stats(&self, name: &str) -> Result<StatsSnapshot, RuntimeError>;
}

/// Bounds every runtime call with a deadline
///
/// A timed-out inspect counts as unreachable; a timed-out stats call
/// surfaces as [`RuntimeError::Timeout`].
pub struct TimeoutRuntime<R> {
    inner: R,
    timeout: Duration,
}

impl<R: ContainerRuntime> TimeoutRuntime<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<R: ContainerRuntime> ContainerRuntime for TimeoutRuntime<R> {
    async fn inspect(&self, name: &str) -> InspectOutcome {
        match tokio::time::timeout(self.timeout, self.inner.inspect(name)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(container = %name, timeout = ?self.timeout, "Inspect timed out");
                RuntimeError::Timeout(self.timeout).into()
            }
        }
    }

    async fn stats(&self, name: &str) -> Result<StatsSnapshot, RuntimeError> {
        tokio::time::timeout(self.timeout, self.inner.stats(name))
            .await
            .map_err(|_| RuntimeError::Timeout(self.timeout))?
    }
}
