//! Data structures shared by the reconciliation components.
//!
//! A [`Container`] is a snapshot taken from the container runtime during a
//! single pass.  Nothing here is kept between passes: the runtime and the
//! gateway are re-queried every tick.

use std::collections::HashMap;

/// Whether the runtime reports the container as running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    NotRunning,
}

/// Health sub-state of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthState {
    /// The container has no health check configured.
    NoCheck,
    Starting,
    Healthy,
    Unhealthy,
    /// A status string the runtime reported that we do not know.
    Unknown(String),
}

/// A container as seen by one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    pub hostname: String,
    pub labels: HashMap<String, String>,
    pub run_state: RunState,
    pub health: HealthState,
}

/// Gateway wiring declared by a container's labels.
///
/// All three fields are non-empty; a container that cannot produce a
/// complete configuration is never registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfiguration {
    pub service_name: String,
    pub upstream_name: String,
    pub service_path: String,
}

/// What a reconciliation pass should do with a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Make sure the container is routed. `supervised` is false when no
    /// health check backs the decision.
    Register { supervised: bool },
    Deregister,
}
