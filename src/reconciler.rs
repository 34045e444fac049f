//! The reconciliation loop.
//!
//! Each pass walks the labelled containers one by one, registers or removes
//! their gateway targets, and then sweeps the gateway for targets of
//! containers that no longer exist. A failure only ever abandons the
//! container (or sweep) it happened in.

use std::future::Future;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::classify::classify;
use crate::config::{Config, LabelKeys};
use crate::gateway::GatewayAdmin;
use crate::labels::{extract_configuration, is_service};
use crate::reaper::{known_hostnames, reap_orphans};
use crate::registrar::{Deregistered, Registered, Registrar};
use crate::runtime::{discover_services, ContainerRuntime};
use crate::scheduler::Scheduler;
use crate::types::{Action, Container};

/// Counters for one pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub registered: usize,
    pub deregistered: usize,
    pub skipped: usize,
    pub failed: usize,
    pub reaped: usize,
}

pub struct Reconciler {
    runtime: Arc<dyn ContainerRuntime>,
    gateway: Arc<dyn GatewayAdmin>,
    keys: LabelKeys,
    managed_tag: String,
    target_port: u16,
}

impl Reconciler {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        gateway: Arc<dyn GatewayAdmin>,
        config: &Config,
    ) -> Self {
        Self {
            runtime,
            gateway,
            keys: config.label_keys(),
            managed_tag: config.managed_tag.clone(),
            target_port: config.target_port,
        }
    }

    /// Run a pass on every scheduler trigger until `shutdown` resolves.
    /// A pass in progress is always finished first.
    pub async fn run(&self, mut scheduler: Scheduler, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopping reconciliation loop");
                    break;
                }
                _ = scheduler.next() => {
                    self.run_pass().await;
                }
            }
        }
    }

    pub async fn run_pass(&self) -> PassReport {
        info!("Looking for service containers");
        let mut report = PassReport::default();

        match discover_services(self.runtime.as_ref(), &self.keys).await {
            Ok(containers) if containers.is_empty() => warn!("No service containers found"),
            Ok(containers) => {
                let registrar = Registrar::new(self.gateway.as_ref(), &self.managed_tag, self.target_port);
                for container in &containers {
                    self.reconcile_container(&registrar, container, &mut report).await;
                }
            }
            Err(e) => error!("Unable to look for containers: {}", e),
        }

        match known_hostnames(self.runtime.as_ref()).await {
            Ok(hostnames) => {
                report.reaped =
                    reap_orphans(self.gateway.as_ref(), &self.managed_tag, &hostnames).await;
            }
            Err(e) => warn!(
                "Unable to collect container hostnames, skipping reverse search this time: {}",
                e
            ),
        }

        info!(
            "Pass finished: {} registered, {} deregistered, {} skipped, {} failed, {} reaped",
            report.registered, report.deregistered, report.skipped, report.failed, report.reaped
        );
        report
    }

    async fn reconcile_container(
        &self,
        registrar: &Registrar<'_>,
        container: &Container,
        report: &mut PassReport,
    ) {
        let id = container.id.as_str();
        debug!("Checking labels of container {}", id);

        match is_service(&container.labels, &self.keys) {
            Ok(true) => {}
            Ok(false) => {
                info!("Container {} not marked as service, skipping", id);
                report.skipped += 1;
                return;
            }
            Err(e) => {
                warn!("Skipping container {}: {}", id, e);
                report.skipped += 1;
                return;
            }
        }

        let config = match extract_configuration(&container.labels, &self.keys) {
            Ok(config) => config,
            Err(e) => {
                warn!("Incomplete gateway labels on container {}, skipping: {}", id, e);
                report.skipped += 1;
                return;
            }
        };

        match classify(container.run_state, &container.health) {
            Action::Register { supervised } => {
                if !supervised {
                    warn!("Registering container {} without enabled health checks", id);
                }
                match registrar.register(id, &container.hostname, &config).await {
                    Ok(Registered::Created) | Ok(Registered::Unchanged) => report.registered += 1,
                    Err(e) => {
                        error!("Unable to register container {}: {}", id, e);
                        report.failed += 1;
                    }
                }
            }
            Action::Deregister => {
                debug!(
                    "Container {} is {:?}/{:?}, removing from gateway",
                    id, container.run_state, container.health
                );
                match registrar
                    .deregister(id, &container.hostname, &config.upstream_name)
                    .await
                {
                    Ok(Deregistered::Removed) | Ok(Deregistered::AlreadyAbsent) => {
                        report.deregistered += 1
                    }
                    Err(e) => {
                        error!("Unable to remove container {}: {}", id, e);
                        report.failed += 1;
                    }
                }
            }
        }
    }
}
