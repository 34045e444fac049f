//! Maps a container's run and health state to a reconciliation action.

use crate::types::{Action, HealthState, RunState};

/// Decide whether a container should be routed by the gateway.
///
/// | run state   | health             | action                   |
/// |-------------|--------------------|--------------------------|
/// | not running | any                | deregister               |
/// | running     | no check           | register (unsupervised)  |
/// | running     | unhealthy          | deregister               |
/// | running     | starting / healthy | register                 |
///
/// Unknown health statuses register: only an explicit `unhealthy` evicts a
/// running container.
pub fn classify(run_state: RunState, health: &HealthState) -> Action {
    match (run_state, health) {
        (RunState::NotRunning, _) => Action::Deregister,
        (RunState::Running, HealthState::NoCheck) => Action::Register { supervised: false },
        (RunState::Running, HealthState::Unhealthy) => Action::Deregister,
        (RunState::Running, HealthState::Starting)
        | (RunState::Running, HealthState::Healthy)
        | (RunState::Running, HealthState::Unknown(_)) => Action::Register { supervised: true },
    }
}
