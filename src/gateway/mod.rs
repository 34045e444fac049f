//! Gateway admin API: entity types and the client interface.
//!
//! Entities are addressed by name (services, upstreams, routes) or by their
//! `host:port` target string.  Every entity this daemon creates carries the
//! configured managed tag so that the orphan sweep never touches anything
//! it did not create.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayResult;

pub mod kong;
pub use kong::KongAdmin;

/// Reference to another entity by id, as embedded in routes and plugins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_protocol() -> String {
    "http".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upstream {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<EntityRef>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub target: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Target {
    /// Host portion of `host:port`.
    pub fn host(&self) -> &str {
        self.target.split(':').next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer: Option<EntityRef>,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Plugin {
    /// A plugin bound to no service, route or consumer applies to the whole
    /// gateway.
    pub fn is_global(&self) -> bool {
        self.service.is_none() && self.route.is_none() && self.consumer.is_none()
    }
}

/// Client for the gateway's admin API.
///
/// `get_*` and `delete_target` report a missing entity as
/// [`GatewayError::NotFound`](crate::error::GatewayError::NotFound).
#[async_trait]
pub trait GatewayAdmin: Send + Sync {
    async fn list_plugins(&self) -> GatewayResult<Vec<Plugin>>;
    async fn create_plugin(&self, plugin: &Plugin) -> GatewayResult<Plugin>;

    async fn get_service(&self, name: &str) -> GatewayResult<Service>;
    async fn create_service(&self, service: &Service) -> GatewayResult<Service>;
    async fn update_service(&self, name: &str, service: &Service) -> GatewayResult<Service>;

    async fn get_upstream(&self, name: &str) -> GatewayResult<Upstream>;
    async fn create_upstream(&self, upstream: &Upstream) -> GatewayResult<Upstream>;
    async fn list_upstreams(&self, tag: &str) -> GatewayResult<Vec<Upstream>>;

    async fn get_route(&self, name: &str) -> GatewayResult<Route>;
    async fn create_route(&self, service: &str, route: &Route) -> GatewayResult<Route>;
    async fn update_route(&self, name: &str, route: &Route) -> GatewayResult<Route>;

    /// Targets of an upstream; `tag` restricts the listing to tagged ones.
    async fn list_targets(&self, upstream: &str, tag: Option<&str>) -> GatewayResult<Vec<Target>>;
    async fn create_target(&self, upstream: &str, target: &Target) -> GatewayResult<Target>;
    async fn delete_target(&self, upstream: &str, target: &str) -> GatewayResult<()>;
}
