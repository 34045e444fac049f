use crate::config::LabelKeys;
use crate::types::Container;
use anyhow::Result;
use async_trait::async_trait;
use log::{error, info};
use thiserror::Error;

pub mod docker;
pub use docker::DockerRuntime;

/// Returned by [`ContainerRuntime::inspect`] when the container was removed
/// after it was listed.
#[derive(Debug, Error)]
#[error("container {0} no longer exists")]
pub struct ContainerGone(pub String);

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List container ids in every run state, optionally restricted to
    /// containers carrying `label` (presence only, any value).
    async fn list_containers(&self, label: Option<&str>) -> Result<Vec<String>>;

    /// Fetch full metadata for one container.
    async fn inspect(&self, id: &str) -> Result<Container>;
}

/// Find every container carrying the service marker and inspect it.
///
/// A container that fails to inspect is logged and left out; only a failed
/// listing fails the whole discovery.
pub async fn discover_services(
    runtime: &dyn ContainerRuntime,
    keys: &LabelKeys,
) -> Result<Vec<Container>> {
    let ids = runtime.list_containers(Some(&keys.marker)).await?;
    info!("Found {} containers labelled {}", ids.len(), keys.marker);

    let mut containers = Vec::with_capacity(ids.len());
    for id in ids {
        match runtime.inspect(&id).await {
            Ok(container) => containers.push(container),
            Err(e) => error!("Unable to inspect container {}: {}", id, e),
        }
    }
    Ok(containers)
}
