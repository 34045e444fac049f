use super::{ContainerGone, ContainerRuntime};
use crate::types::{Container, HealthState, RunState};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::errors::Error as DockerError;
use bollard::models::{ContainerInspectResponse, ContainerStateStatusEnum, HealthStatusEnum};
use bollard::Docker;
use log::debug;
use std::collections::HashMap;

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to the local Docker daemon (unix socket, or `DOCKER_HOST`).
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_containers(&self, label: Option<&str>) -> Result<Vec<String>> {
        let mut filters = HashMap::new();
        if let Some(label) = label {
            filters.insert("label".to_string(), vec![label.to_string()]);
        }
        let opts = ListContainersOptions::<String> {
            all: true,
            filters,
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(opts)).await?;
        Ok(containers.into_iter().filter_map(|c| c.id).collect())
    }

    async fn inspect(&self, id: &str) -> Result<Container> {
        let detail = match self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
        {
            Ok(detail) => detail,
            Err(DockerError::DockerResponseServerError {
                status_code: 404, ..
            }) => return Err(ContainerGone(id.to_string()).into()),
            Err(e) => return Err(e.into()),
        };
        debug!("Inspected container {}", id);
        container_from_inspect(id, detail)
    }
}

fn container_from_inspect(id: &str, detail: ContainerInspectResponse) -> Result<Container> {
    let config = detail
        .config
        .ok_or_else(|| anyhow!("container {} has no config block", id))?;
    let hostname = config
        .hostname
        .filter(|h| !h.is_empty())
        .ok_or_else(|| anyhow!("container {} has no hostname", id))?;

    let state = detail.state.unwrap_or_default();
    let run_state = match state.status {
        Some(ContainerStateStatusEnum::RUNNING) => RunState::Running,
        _ => RunState::NotRunning,
    };
    let health = match state.health.and_then(|h| h.status) {
        None | Some(HealthStatusEnum::NONE) => HealthState::NoCheck,
        Some(HealthStatusEnum::STARTING) => HealthState::Starting,
        Some(HealthStatusEnum::HEALTHY) => HealthState::Healthy,
        Some(HealthStatusEnum::UNHEALTHY) => HealthState::Unhealthy,
        Some(other) => HealthState::Unknown(other.to_string()),
    };

    Ok(Container {
        id: detail.id.unwrap_or_else(|| id.to_string()),
        hostname,
        labels: config.labels.unwrap_or_default(),
        run_state,
        health,
    })
}
