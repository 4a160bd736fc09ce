//! Docker Engine runtime backed by bollard

use super::{ContainerRuntime, InspectOutcome, RuntimeError};
use crate::models::{ContainerStatus, StatsSnapshot};
use anyhow::Context;
use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, Stats, StatsOptions};
use bollard::errors::Error as DockerError;
use bollard::Docker;
use futures::StreamExt;
use tracing::{debug, info, warn};

/// Container runtime talking to the local Docker daemon
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect using `DOCKER_HOST` or the platform's default socket.
    ///
    /// An unreachable daemon is not fatal here; every cycle retries and
    /// reports the containers as missing until it answers.
    pub async fn connect() -> anyhow::Result<Self> {
        let docker =
            Docker::connect_with_local_defaults().context("Failed to create Docker client")?;

        match docker.version().await {
            Ok(version) => info!(
                api_version = ?version.api_version,
                engine_version = ?version.version,
                "Connected to Docker daemon"
            ),
            Err(e) => warn!(error = %e, "Docker daemon not reachable yet"),
        }

        Ok(Self { docker })
    }
}

/// Translate a bollard error into the runtime error taxonomy
fn classify_error(name: &str, err: DockerError) -> RuntimeError {
    match err {
        DockerError::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeError::NotFound(name.to_string()),
        other => RuntimeError::Unreachable(other.to_string()),
    }
}

/// Build a snapshot from Docker's pre/post stats pair
fn snapshot_from_stats(stats: &Stats) -> StatsSnapshot {
    let online_cpus = stats
        .cpu_stats
        .online_cpus
        .filter(|n| *n > 0)
        .or_else(|| {
            stats
                .cpu_stats
                .cpu_usage
                .percpu_usage
                .as_ref()
                .map(|per_cpu| per_cpu.len() as u64)
                .filter(|n| *n > 0)
        })
        .unwrap_or(1);

    StatsSnapshot {
        container_cpu_prev: stats.precpu_stats.cpu_usage.total_usage,
        container_cpu_now: stats.cpu_stats.cpu_usage.total_usage,
        system_cpu_prev: stats.precpu_stats.system_cpu_usage.unwrap_or(0),
        system_cpu_now: stats.cpu_stats.system_cpu_usage.unwrap_or(0),
        online_cpus,
        memory_usage_bytes: stats.memory_stats.usage.unwrap_or(0),
        process_count: stats.pids_stats.current.unwrap_or(0),
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn inspect(&self, name: &str) -> InspectOutcome {
        match self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(response) => {
                let running = response
                    .state
                    .and_then(|state| state.running)
                    .unwrap_or(false);
                InspectOutcome::Found(ContainerStatus { running })
            }
            Err(e) => {
                debug!(container = %name, error = %e, "Inspect failed");
                classify_error(name, e).into()
            }
        }
    }

    async fn stats(&self, name: &str) -> Result<StatsSnapshot, RuntimeError> {
        // one_shot must stay off so the daemon samples twice and fills precpu_stats
        let options = StatsOptions {
            stream: false,
            one_shot: false,
        };
        let mut stream = Box::pin(self.docker.stats(name, Some(options)));

        match stream.next().await {
            Some(Ok(stats)) => Ok(snapshot_from_stats(&stats)),
            Some(Err(e)) => Err(classify_error(name, e)),
            None => Err(RuntimeError::MalformedStats(format!(
                "empty stats stream for {}",
                name
            ))),
        }
    }
}
