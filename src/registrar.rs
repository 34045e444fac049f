//! Idempotent registration and removal of container targets.
//!
//! Every entity is created only after a lookup reported it missing, and
//! updated only when its wiring differs from the labels, so repeated
//! registration of the same container leaves the gateway untouched.

use log::{debug, info};

use crate::error::GatewayResult;
use crate::gateway::{EntityRef, GatewayAdmin, Route, Service, Target, Upstream};
use crate::types::GatewayConfiguration;

/// Outcome of [`Registrar::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    /// The target was added in this call
    Created,
    /// Everything was already in place
    Unchanged,
}

/// Outcome of [`Registrar::deregister`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deregistered {
    Removed,
    AlreadyAbsent,
}

pub struct Registrar<'a> {
    gateway: &'a dyn GatewayAdmin,
    tag: &'a str,
    port: u16,
}

impl<'a> Registrar<'a> {
    pub fn new(gateway: &'a dyn GatewayAdmin, tag: &'a str, port: u16) -> Self {
        Self { gateway, tag, port }
    }

    /// Target string routing to a container hostname.
    pub fn target_for(&self, hostname: &str) -> String {
        format!("{}:{}", hostname, self.port)
    }

    fn tags(&self) -> Vec<String> {
        vec![self.tag.to_string()]
    }

    /// Ensure service, upstream, route and target exist for the container.
    pub async fn register(
        &self,
        container_id: &str,
        hostname: &str,
        config: &GatewayConfiguration,
    ) -> GatewayResult<Registered> {
        let service = self.ensure_service(config).await?;
        self.ensure_upstream(&config.upstream_name).await?;
        self.ensure_route(config, service.id).await?;

        let target = self.target_for(hostname);
        let existing = self.gateway.list_targets(&config.upstream_name, None).await?;
        if existing.iter().any(|t| t.target == target) {
            debug!(
                "Container {} already routed as {} in upstream {}",
                container_id, target, config.upstream_name
            );
            return Ok(Registered::Unchanged);
        }

        self.gateway
            .create_target(
                &config.upstream_name,
                &Target {
                    id: None,
                    target: target.clone(),
                    tags: self.tags(),
                },
            )
            .await?;
        info!(
            "Container {} added to upstream {} as {}",
            container_id, config.upstream_name, target
        );
        Ok(Registered::Created)
    }

    /// Remove the container's target from the upstream.
    ///
    /// A missing upstream or target is not an error.
    pub async fn deregister(
        &self,
        container_id: &str,
        hostname: &str,
        upstream: &str,
    ) -> GatewayResult<Deregistered> {
        let target = self.target_for(hostname);
        match self.gateway.delete_target(upstream, &target).await {
            Ok(()) => {
                info!(
                    "Container {} removed from upstream {} ({})",
                    container_id, upstream, target
                );
                Ok(Deregistered::Removed)
            }
            Err(e) if e.is_not_found() => {
                debug!(
                    "Container {} has no target {} in upstream {}",
                    container_id, target, upstream
                );
                Ok(Deregistered::AlreadyAbsent)
            }
            Err(e) => Err(e),
        }
    }

    async fn ensure_service(&self, config: &GatewayConfiguration) -> GatewayResult<Service> {
        let desired = Service {
            id: None,
            name: config.service_name.clone(),
            host: config.upstream_name.clone(),
            port: None,
            protocol: "http".into(),
            tags: self.tags(),
        };
        match self.gateway.get_service(&config.service_name).await {
            Ok(service) if service.host == desired.host => Ok(service),
            Ok(service) => {
                info!(
                    "Rewiring gateway service {} from {} to upstream {}",
                    config.service_name, service.host, desired.host
                );
                self.gateway
                    .update_service(&config.service_name, &desired)
                    .await
            }
            Err(e) if e.is_not_found() => {
                info!("Creating gateway service {}", config.service_name);
                self.gateway.create_service(&desired).await
            }
            Err(e) => Err(e),
        }
    }

    async fn ensure_upstream(&self, name: &str) -> GatewayResult<Upstream> {
        match self.gateway.get_upstream(name).await {
            Ok(upstream) => Ok(upstream),
            Err(e) if e.is_not_found() => {
                info!("Creating gateway upstream {}", name);
                self.gateway
                    .create_upstream(&Upstream {
                        id: None,
                        name: name.to_string(),
                        tags: self.tags(),
                    })
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn ensure_route(
        &self,
        config: &GatewayConfiguration,
        service_id: Option<String>,
    ) -> GatewayResult<Route> {
        let desired = Route {
            id: None,
            name: config.service_name.clone(),
            paths: vec![config.service_path.clone()],
            service: service_id.map(|id| EntityRef { id }),
            tags: self.tags(),
        };
        match self.gateway.get_route(&config.service_name).await {
            Ok(route) if route_matches(&route, &desired) => Ok(route),
            Ok(route) => {
                info!(
                    "Updating gateway route {} from {:?} to path {}",
                    config.service_name, route.paths, config.service_path
                );
                self.gateway
                    .update_route(&config.service_name, &desired)
                    .await
            }
            Err(e) if e.is_not_found() => {
                info!(
                    "Creating gateway route {} for path {}",
                    config.service_name, config.service_path
                );
                self.gateway
                    .create_route(&config.service_name, &desired)
                    .await
            }
            Err(e) => Err(e),
        }
    }
}

/// An unknown service id on the desired side does not count as a mismatch.
fn route_matches(existing: &Route, desired: &Route) -> bool {
    existing.paths == desired.paths
        && (desired.service.is_none() || existing.service == desired.service)
}
