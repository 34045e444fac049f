//! Service watcher entry point.
//!
//! Keeps the API gateway's upstream targets in line with the labelled
//! containers running on this host.

use std::sync::Arc;

use log::{error, info};
use tokio::signal;

mod auth;
mod classify;
mod config;
mod error;
mod gateway;
mod labels;
mod reaper;
mod reconciler;
mod registrar;
mod runtime;
mod scheduler;
#[cfg(test)]
mod testing;
mod types;

use auth::ensure_global_auth;
use config::Config;
use gateway::KongAdmin;
use reconciler::Reconciler;
use runtime::DockerRuntime;
use scheduler::Scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    // Load configuration
    let cfg = Config::load()?;
    info!("Starting service watcher with config: {:?}", cfg);

    let runtime = Arc::new(DockerRuntime::connect()?);
    let gateway = Arc::new(KongAdmin::new(&cfg.gateway_admin_url, cfg.request_timeout())?);

    // One-time check, failures only degrade protection
    ensure_global_auth(
        gateway.as_ref(),
        &cfg.auth_plugin,
        cfg.introspection_url.as_deref(),
    )
    .await;

    let reconciler = Reconciler::new(runtime, gateway, &cfg);
    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down..."),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
    };
    reconciler
        .run(Scheduler::new(cfg.poll_interval()), shutdown)
        .await;

    info!("Shutdown complete.");
    Ok(())
}
