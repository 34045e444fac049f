//! HTTP client for the Kong admin API

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use super::{GatewayAdmin, Plugin, Route, Service, Target, Upstream};
use crate::error::{GatewayError, GatewayResult};

/// Kong admin API client
pub struct KongAdmin {
    client: Client,
    base: Url,
}

/// One page of a Kong collection listing
#[derive(Debug, Deserialize)]
struct Page<T> {
    data: Vec<T>,
    #[serde(default)]
    offset: Option<String>,
}

impl KongAdmin {
    /// Create a new admin client
    pub fn new(endpoint: &str, timeout: Duration) -> GatewayResult<Self> {
        let base = Url::parse(endpoint)
            .map_err(|e| GatewayError::InvalidUrl(format!("{}: {}", endpoint, e)))?;
        if base.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(endpoint.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base })
    }

    /// Append `segments` to the base URL, percent-encoding each one so that
    /// label values cannot escape their path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> GatewayResult<T> {
        let url = self.url(segments);
        let response = self.client.get(url.clone()).send().await?;
        Self::handle_response(&url, response).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> GatewayResult<T> {
        let url = self.url(segments);
        let response = self
            .client
            .request(method, url.clone())
            .json(body)
            .send()
            .await?;
        Self::handle_response(&url, response).await
    }

    async fn delete(&self, segments: &[&str]) -> GatewayResult<()> {
        let url = self.url(segments);
        let response = self.client.delete(url.clone()).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::error_from(&url, status, response).await)
        }
    }

    /// Follow `offset` pagination until the collection is exhausted.
    async fn list<T: DeserializeOwned>(&self, segments: &[&str], tag: Option<&str>) -> GatewayResult<Vec<T>> {
        let url = self.url(segments);
        let mut items = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let mut query: Vec<(&str, &str)> = Vec::new();
            if let Some(tag) = tag {
                query.push(("tags", tag));
            }
            if let Some(o) = offset.as_deref() {
                query.push(("offset", o));
            }
            let response = self.client.get(url.clone()).query(&query).send().await?;
            let page: Page<T> = Self::handle_response(&url, response).await?;
            items.extend(page.data);
            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => break,
            }
        }
        debug!("Listed {} entities from {}", items.len(), url.path());
        Ok(items)
    }

    async fn handle_response<T: DeserializeOwned>(
        url: &Url,
        response: reqwest::Response,
    ) -> GatewayResult<T> {
        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        } else {
            Err(Self::error_from(url, status, response).await)
        }
    }

    async fn error_from(url: &Url, status: StatusCode, response: reqwest::Response) -> GatewayError {
        if status == StatusCode::NOT_FOUND {
            GatewayError::NotFound(url.path().to_string())
        } else {
            let message = response.text().await.unwrap_or_default();
            GatewayError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

#[async_trait]
impl GatewayAdmin for KongAdmin {
    async fn list_plugins(&self) -> GatewayResult<Vec<Plugin>> {
        self.list(&["plugins"], None).await
    }

    async fn create_plugin(&self, plugin: &Plugin) -> GatewayResult<Plugin> {
        self.send_json(Method::POST, &["plugins"], plugin).await
    }

    async fn get_service(&self, name: &str) -> GatewayResult<Service> {
        self.get(&["services", name]).await
    }

    async fn create_service(&self, service: &Service) -> GatewayResult<Service> {
        self.send_json(Method::POST, &["services"], service).await
    }

    async fn update_service(&self, name: &str, service: &Service) -> GatewayResult<Service> {
        self.send_json(Method::PATCH, &["services", name], service).await
    }

    async fn get_upstream(&self, name: &str) -> GatewayResult<Upstream> {
        self.get(&["upstreams", name]).await
    }

    async fn create_upstream(&self, upstream: &Upstream) -> GatewayResult<Upstream> {
        self.send_json(Method::POST, &["upstreams"], upstream).await
    }

    async fn list_upstreams(&self, tag: &str) -> GatewayResult<Vec<Upstream>> {
        self.list(&["upstreams"], Some(tag)).await
    }

    async fn get_route(&self, name: &str) -> GatewayResult<Route> {
        self.get(&["routes", name]).await
    }

    async fn create_route(&self, service: &str, route: &Route) -> GatewayResult<Route> {
        self.send_json(Method::POST, &["services", service, "routes"], route)
            .await
    }

    async fn update_route(&self, name: &str, route: &Route) -> GatewayResult<Route> {
        self.send_json(Method::PATCH, &["routes", name], route).await
    }

    async fn list_targets(&self, upstream: &str, tag: Option<&str>) -> GatewayResult<Vec<Target>> {
        self.list(&["upstreams", upstream, "targets"], tag).await
    }

    async fn create_target(&self, upstream: &str, target: &Target) -> GatewayResult<Target> {
        self.send_json(Method::POST, &["upstreams", upstream, "targets"], target)
            .await
    }

    async fn delete_target(&self, upstream: &str, target: &str) -> GatewayResult<()> {
        self.delete(&["upstreams", upstream, "targets", target]).await
    }
}
