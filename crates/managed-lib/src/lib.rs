//! Library for supervising a fixed set of containers
//!
//! This crate provides the core functionality for:
//! - Edge-triggered threshold and liveness checks
//! - Per-container check orchestration against a container runtime
//! - Violation accumulation and the per-cycle alert decision
//! - The polling loop, health checks and observability

pub mod alert;
pub mod check;
pub mod container;
pub mod health;
pub mod models;
pub mod monitor;
pub mod observability;
pub mod runtime;

pub use alert::{Action, Delivery, HostAction, LogNotifier, Notifier, NotifyError, WebhookNotifier};
pub use check::{BreachState, CheckKind, MetricCheck, StaticCheck, Violation};
pub use container::{CycleOutcome, ManagedContainer};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use monitor::{CycleReport, Monitor, MonitorBuilder, MonitorConfig};
pub use observability::{MonitorMetrics, StructuredLogger};
pub use runtime::{ContainerRuntime, DockerRuntime, InspectOutcome, RuntimeError, TimeoutRuntime};
