//! Reverse sweep over managed gateway targets.
//!
//! Containers that were deleted outright never show up in discovery again,
//! so their targets can only be found by walking the gateway side and
//! comparing against every hostname the runtime still knows about.

use std::collections::HashSet;

use anyhow::Result;
use log::{debug, info, warn};

use crate::gateway::GatewayAdmin;
use crate::runtime::{ContainerGone, ContainerRuntime};

/// Hostnames of every container on the host, labelled or not.
///
/// A container removed between listing and inspection is left out. Any
/// other inspection failure fails the whole collection: a partial set would
/// make live containers look deleted.
pub async fn known_hostnames(runtime: &dyn ContainerRuntime) -> Result<HashSet<String>> {
    let ids = runtime.list_containers(None).await?;
    let mut hostnames = HashSet::with_capacity(ids.len());
    for id in ids {
        match runtime.inspect(&id).await {
            Ok(container) => {
                hostnames.insert(container.hostname);
            }
            Err(e) if e.is::<ContainerGone>() => {
                debug!("Container {} vanished before inspection", id);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(hostnames)
}

/// Delete managed targets whose host is not in `hostnames`.
///
/// Returns the number of deleted targets. Listing failures skip the sweep
/// (or the affected upstream) until the next pass.
pub async fn reap_orphans(gateway: &dyn GatewayAdmin, tag: &str, hostnames: &HashSet<String>) -> usize {
    let upstreams = match gateway.list_upstreams(tag).await {
        Ok(upstreams) => upstreams,
        Err(e) => {
            warn!("Unable to list upstreams, skipping reverse search this time: {}", e);
            return 0;
        }
    };

    let mut reaped = 0;
    for upstream in upstreams {
        let key = upstream.id.as_deref().unwrap_or(upstream.name.as_str());
        let targets = match gateway.list_targets(key, Some(tag)).await {
            Ok(targets) => targets,
            Err(e) => {
                warn!("Unable to list targets of upstream {}: {}", upstream.name, e);
                continue;
            }
        };

        for target in targets {
            if hostnames.contains(target.host()) {
                continue;
            }
            match gateway.delete_target(key, &target.target).await {
                Ok(()) => {
                    info!(
                        "Removed target {} of deleted container from upstream {}",
                        target.target, upstream.name
                    );
                    reaped += 1;
                }
                Err(e) if e.is_not_found() => {
                    debug!("Target {} already gone from upstream {}", target.target, upstream.name);
                }
                Err(e) => warn!(
                    "Unable to remove target {} from upstream {}: {}",
                    target.target, upstream.name, e
                ),
            }
        }
    }
    reaped
}
