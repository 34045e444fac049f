//! In-memory container runtime and gateway used by unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{EntityRef, GatewayAdmin, Plugin, Route, Service, Target, Upstream};
use crate::runtime::{ContainerGone, ContainerRuntime};
use crate::types::{Container, HealthState, RunState};

/// Build a container whose hostname is `<id>-hostname`. When `labelled` is
/// set it carries the marker and a complete `svc`/`up`/`/api` configuration.
pub fn container(id: &str, run_state: RunState, health: HealthState, labelled: bool) -> Container {
    let mut labels = HashMap::new();
    if labelled {
        labels.insert("wisdom-oss.isService".into(), "true".into());
        labels.insert("wisdom-oss.service.name".into(), "svc".into());
        labels.insert("wisdom-oss.service.upstream-name".into(), "up".into());
        labels.insert("wisdom-oss.service.path".into(), "/api".into());
    }
    Container {
        id: id.to_string(),
        hostname: format!("{}-hostname", id),
        labels,
        run_state,
        health,
    }
}

#[derive(Default)]
pub struct FakeRuntime {
    containers: Mutex<Vec<Container>>,
    broken: Mutex<HashSet<String>>,
    vanishing: Mutex<HashSet<String>>,
    listing_fails: Mutex<bool>,
}

impl FakeRuntime {
    pub fn add(&self, container: Container) {
        let mut containers = self.containers.lock().unwrap();
        containers.retain(|c| c.id != container.id);
        containers.push(container);
    }

    pub fn remove(&self, id: &str) {
        self.containers.lock().unwrap().retain(|c| c.id != id);
    }

    pub fn update(&self, id: &str, f: impl FnOnce(&mut Container)) {
        let mut containers = self.containers.lock().unwrap();
        if let Some(c) = containers.iter_mut().find(|c| c.id == id) {
            f(c);
        }
    }

    pub fn fail_inspect(&self, id: &str) {
        self.broken.lock().unwrap().insert(id.to_string());
    }

    /// Keep listing the container but report it gone when inspected.
    pub fn vanish_on_inspect(&self, id: &str) {
        self.vanishing.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_listing(&self) {
        *self.listing_fails.lock().unwrap() = true;
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_containers(&self, label: Option<&str>) -> Result<Vec<String>> {
        if *self.listing_fails.lock().unwrap() {
            return Err(anyhow!("runtime unavailable"));
        }
        Ok(self
            .containers
            .lock()
            .unwrap()
            .iter()
            .filter(|c| label.map_or(true, |l| c.labels.contains_key(l)))
            .map(|c| c.id.clone())
            .collect())
    }

    async fn inspect(&self, id: &str) -> Result<Container> {
        if self.broken.lock().unwrap().contains(id) {
            return Err(anyhow!("inspect failed for {}", id));
        }
        if self.vanishing.lock().unwrap().contains(id) {
            return Err(ContainerGone(id.to_string()).into());
        }
        self.containers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| ContainerGone(id.to_string()).into())
    }
}

#[derive(Default)]
struct GatewayState {
    plugins: Vec<Plugin>,
    services: BTreeMap<String, Service>,
    upstreams: BTreeMap<String, Upstream>,
    routes: BTreeMap<String, Route>,
    targets: BTreeMap<String, Vec<Target>>,
    mutations: usize,
}

/// Which gateway calls should fail.
#[derive(Default, Clone, Copy)]
pub struct Failures {
    pub list_upstreams: bool,
    pub create_target: bool,
    pub create_plugin: bool,
}

#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<GatewayState>,
    failures: Mutex<Failures>,
}

fn unavailable() -> GatewayError {
    GatewayError::Api {
        status: 503,
        message: "unavailable".into(),
    }
}

/// Upstreams may be addressed by name or id.
fn upstream_name(state: &GatewayState, key: &str) -> Option<String> {
    state
        .upstreams
        .values()
        .find(|u| u.name == key || u.id.as_deref() == Some(key))
        .map(|u| u.name.clone())
}

impl FakeGateway {
    pub fn fail(&self, failures: Failures) {
        *self.failures.lock().unwrap() = failures;
    }

    pub fn targets(&self, upstream: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .targets
            .get(upstream)
            .map(|ts| ts.iter().map(|t| t.target.clone()).collect())
            .unwrap_or_default()
    }

    pub fn mutations(&self) -> usize {
        self.state.lock().unwrap().mutations
    }

    pub fn service_count(&self) -> usize {
        self.state.lock().unwrap().services.len()
    }

    pub fn route_count(&self) -> usize {
        self.state.lock().unwrap().routes.len()
    }

    pub fn plugins(&self) -> Vec<Plugin> {
        self.state.lock().unwrap().plugins.clone()
    }

    /// Insert a target directly, bypassing the mutation counter.
    pub fn seed_target(&self, upstream: &str, target: &str, tags: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state
            .upstreams
            .entry(upstream.to_string())
            .or_insert_with(|| Upstream {
                id: Some(format!("id-{}", upstream)),
                name: upstream.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            });
        state
            .targets
            .entry(upstream.to_string())
            .or_default()
            .push(Target {
                id: None,
                target: target.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            });
    }

    pub fn rebind_route(&self, route: &str, service_id: &str) {
        if let Some(r) = self.state.lock().unwrap().routes.get_mut(route) {
            r.service = Some(EntityRef {
                id: service_id.to_string(),
            });
        }
    }

    pub fn seed_plugin(&self, plugin: Plugin) {
        self.state.lock().unwrap().plugins.push(plugin);
    }
}

#[async_trait]
impl GatewayAdmin for FakeGateway {
    async fn list_plugins(&self) -> GatewayResult<Vec<Plugin>> {
        Ok(self.plugins())
    }

    async fn create_plugin(&self, plugin: &Plugin) -> GatewayResult<Plugin> {
        if self.failures.lock().unwrap().create_plugin {
            return Err(unavailable());
        }
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        state.plugins.push(plugin.clone());
        Ok(plugin.clone())
    }

    async fn get_service(&self, name: &str) -> GatewayResult<Service> {
        self.state
            .lock()
            .unwrap()
            .services
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(name.to_string()))
    }

    async fn create_service(&self, service: &Service) -> GatewayResult<Service> {
        let mut state = self.state.lock().unwrap();
        if state.services.contains_key(&service.name) {
            return Err(GatewayError::Api {
                status: 409,
                message: "unique constraint violation".into(),
            });
        }
        state.mutations += 1;
        let mut created = service.clone();
        created.id = Some(format!("id-{}", service.name));
        state.services.insert(service.name.clone(), created.clone());
        Ok(created)
    }

    async fn update_service(&self, name: &str, service: &Service) -> GatewayResult<Service> {
        let mut state = self.state.lock().unwrap();
        let existing = state
            .services
            .get_mut(name)
            .ok_or_else(|| GatewayError::NotFound(name.to_string()))?;
        existing.host = service.host.clone();
        existing.protocol = service.protocol.clone();
        let updated = existing.clone();
        state.mutations += 1;
        Ok(updated)
    }

    async fn get_upstream(&self, name: &str) -> GatewayResult<Upstream> {
        self.state
            .lock()
            .unwrap()
            .upstreams
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(name.to_string()))
    }

    async fn create_upstream(&self, upstream: &Upstream) -> GatewayResult<Upstream> {
        let mut state = self.state.lock().unwrap();
        if state.upstreams.contains_key(&upstream.name) {
            return Err(GatewayError::Api {
                status: 409,
                message: "unique constraint violation".into(),
            });
        }
        state.mutations += 1;
        let mut created = upstream.clone();
        created.id = Some(format!("id-{}", upstream.name));
        state.upstreams.insert(upstream.name.clone(), created.clone());
        Ok(created)
    }

    async fn list_upstreams(&self, tag: &str) -> GatewayResult<Vec<Upstream>> {
        if self.failures.lock().unwrap().list_upstreams {
            return Err(unavailable());
        }
        Ok(self
            .state
            .lock()
            .unwrap()
            .upstreams
            .values()
            .filter(|u| u.tags.iter().any(|t| t == tag))
            .cloned()
            .collect())
    }

    async fn get_route(&self, name: &str) -> GatewayResult<Route> {
        self.state
            .lock()
            .unwrap()
            .routes
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(name.to_string()))
    }

    async fn create_route(&self, service: &str, route: &Route) -> GatewayResult<Route> {
        let mut state = self.state.lock().unwrap();
        let service_id = state
            .services
            .get(service)
            .and_then(|s| s.id.clone())
            .ok_or_else(|| GatewayError::NotFound(service.to_string()))?;
        state.mutations += 1;
        let mut created = route.clone();
        created.service = Some(EntityRef { id: service_id });
        state.routes.insert(route.name.clone(), created.clone());
        Ok(created)
    }

    async fn update_route(&self, name: &str, route: &Route) -> GatewayResult<Route> {
        let mut state = self.state.lock().unwrap();
        let existing = state
            .routes
            .get_mut(name)
            .ok_or_else(|| GatewayError::NotFound(name.to_string()))?;
        existing.paths = route.paths.clone();
        if route.service.is_some() {
            existing.service = route.service.clone();
        }
        let updated = existing.clone();
        state.mutations += 1;
        Ok(updated)
    }

    async fn list_targets(&self, upstream: &str, tag: Option<&str>) -> GatewayResult<Vec<Target>> {
        let state = self.state.lock().unwrap();
        let name = upstream_name(&state, upstream)
            .ok_or_else(|| GatewayError::NotFound(upstream.to_string()))?;
        Ok(state
            .targets
            .get(&name)
            .map(|ts| {
                ts.iter()
                    .filter(|t| tag.map_or(true, |tag| t.tags.iter().any(|x| x == tag)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_target(&self, upstream: &str, target: &Target) -> GatewayResult<Target> {
        if self.failures.lock().unwrap().create_target {
            return Err(unavailable());
        }
        let mut state = self.state.lock().unwrap();
        if !state.upstreams.contains_key(upstream) {
            return Err(GatewayError::NotFound(upstream.to_string()));
        }
        state.mutations += 1;
        state
            .targets
            .entry(upstream.to_string())
            .or_default()
            .push(target.clone());
        Ok(target.clone())
    }

    async fn delete_target(&self, upstream: &str, target: &str) -> GatewayResult<()> {
        let mut state = self.state.lock().unwrap();
        let name = upstream_name(&state, upstream)
            .ok_or_else(|| GatewayError::NotFound(upstream.to_string()))?;
        let targets = state
            .targets
            .get_mut(&name)
            .ok_or_else(|| GatewayError::NotFound(upstream.to_string()))?;
        let before = targets.len();
        targets.retain(|t| t.target != target);
        if targets.len() == before {
            return Err(GatewayError::NotFound(target.to_string()));
        }
        state.mutations += 1;
        Ok(())
    }
}
