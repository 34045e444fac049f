use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub gateway_admin_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introspection_url: Option<String>,
    pub label_prefix: String,
    pub managed_tag: String,
    pub auth_plugin: String,
    pub target_port: u16,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_admin_url: "http://api-gateway:8001".into(),
            introspection_url: None,
            label_prefix: "wisdom-oss".into(),
            managed_tag: "wisdom".into(),
            auth_plugin: "kong-internal-db-auth".into(),
            target_port: 8000,
            poll_interval_secs: 5,
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config: Config = Self::figment()
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("service-watcher.toml"))
            .merge(Json::file("service-watcher.json"))
            .merge(Env::prefixed("WATCHER_"))
            // Older deployments only set the bare variable
            .merge(Env::raw().only(&["INTROSPECTION_URL"]))
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.gateway_admin_url.trim().is_empty() {
            anyhow::bail!("gateway_admin_url must not be empty");
        }
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than zero");
        }
        if self.target_port == 0 {
            anyhow::bail!("target_port must be greater than zero");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn label_keys(&self) -> LabelKeys {
        LabelKeys::new(&self.label_prefix)
    }
}

/// Container label keys making up the labelling contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelKeys {
    pub marker: String,
    pub service_name: String,
    pub upstream_name: String,
    pub path: String,
}

impl LabelKeys {
    pub fn new(prefix: &str) -> Self {
        Self {
            marker: format!("{}.isService", prefix),
            service_name: format!("{}.service.name", prefix),
            upstream_name: format!("{}.service.upstream-name", prefix),
            path: format!("{}.service.path", prefix),
        }
    }
}
