//! Startup check for the gateway-wide authentication plugin.

use log::{info, warn};
use serde_json::json;

use crate::error::GatewayResult;
use crate::gateway::{GatewayAdmin, Plugin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    AlreadyEnabled,
    Enabled,
    /// No plugin could be created; routed services are unprotected.
    Unprotected,
}

/// Make sure exactly one global instance of `plugin_name` exists.
///
/// Never fails: any problem is logged and reported as
/// [`AuthStatus::Unprotected`].
pub async fn ensure_global_auth(
    gateway: &dyn GatewayAdmin,
    plugin_name: &str,
    introspection_url: Option<&str>,
) -> AuthStatus {
    match try_ensure(gateway, plugin_name, introspection_url).await {
        Ok(status) => status,
        Err(e) => {
            warn!(
                "Unable to enable global authentication, services may be unprotected: {}",
                e
            );
            AuthStatus::Unprotected
        }
    }
}

async fn try_ensure(
    gateway: &dyn GatewayAdmin,
    plugin_name: &str,
    introspection_url: Option<&str>,
) -> GatewayResult<AuthStatus> {
    let plugins = gateway.list_plugins().await?;
    if plugins.iter().any(|p| p.name == plugin_name && p.is_global()) {
        info!("Global authentication plugin {} already enabled", plugin_name);
        return Ok(AuthStatus::AlreadyEnabled);
    }

    let Some(url) = introspection_url else {
        warn!(
            "No introspection URL configured, not enabling {}. Services may be unprotected",
            plugin_name
        );
        return Ok(AuthStatus::Unprotected);
    };

    gateway
        .create_plugin(&Plugin {
            id: None,
            name: plugin_name.to_string(),
            service: None,
            route: None,
            consumer: None,
            // key spelling is fixed by the plugin's schema
            config: json!({
                "intospection_url": url,
                "auth_header": "ignore",
            }),
            enabled: true,
        })
        .await?;
    info!("Enabled global authentication plugin {}", plugin_name);
    Ok(AuthStatus::Enabled)
}
