//! reqwest-based HCloud API client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use super::error::{ApiError, Result};
use super::models::{
    ErrorResponse, FloatingIp, Image, LoadBalancer, Meta, PrimaryIp, Pricing, PricingResponse,
    Server, Volume,
};
use super::{CloudApi, PricingSource};

/// Default HCloud API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.hetzner.cloud/v1";

/// Page size requested from list endpoints (HCloud maximum is 50).
const PER_PAGE: u64 = 50;

/// Authenticated HCloud API client.
#[derive(Clone)]
pub struct HcloudClient {
    endpoint: String,
    token: String,
    client: Client,
}

impl HcloudClient {
    /// Builds a client for `endpoint` with a per-request `timeout`.
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .user_agent(concat!("hcloud-pricing-exporter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }

    /// Issues an authenticated GET and decodes the JSON body.
    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.endpoint, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_from_response(status, body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Fetches every page of a list endpoint and returns the items stored under `key`.
    #[instrument(skip(self, extra_query))]
    async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        extra_query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1u64;

        loop {
            let mut query: Vec<(&str, String)> = extra_query.to_vec();
            query.push(("page", page.to_string()));
            query.push(("per_page", PER_PAGE.to_string()));

            let mut body: serde_json::Value = self.get(path, &query).await?;
            let raw = body
                .get_mut(key)
                .map(serde_json::Value::take)
                .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));
            let chunk: Vec<T> = serde_json::from_value(raw)?;
            let meta: Meta = match body.get_mut("meta") {
                Some(meta) => serde_json::from_value(meta.take())?,
                None => Meta::default(),
            };

            debug!("Fetched {} {} from page {}", chunk.len(), key, page);
            items.extend(chunk);

            match meta.pagination.and_then(|p| p.next_page) {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(items)
    }
}

/// Maps a non-2xx response to the most specific error available.
fn error_from_response(status: StatusCode, body: String) -> ApiError {
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(envelope) => ApiError::Api {
            status: status.as_u16(),
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => ApiError::Http {
            status: status.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl PricingSource for HcloudClient {
    #[instrument(skip(self))]
    async fn fetch_pricing(&self) -> Result<Pricing> {
        let response: PricingResponse = self.get("/pricing", &[]).await?;
        Ok(response.pricing)
    }
}

#[async_trait]
impl CloudApi for HcloudClient {
    async fn list_floating_ips(&self) -> Result<Vec<FloatingIp>> {
        self.list_all("/floating_ips", "floating_ips", &[]).await
    }

    async fn list_primary_ips(&self) -> Result<Vec<PrimaryIp>> {
        self.list_all("/primary_ips", "primary_ips", &[]).await
    }

    async fn list_servers(&self) -> Result<Vec<Server>> {
        self.list_all("/servers", "servers", &[]).await
    }

    async fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>> {
        self.list_all("/load_balancers", "load_balancers", &[]).await
    }

    async fn list_snapshots(&self) -> Result<Vec<Image>> {
        self.list_all("/images", "images", &[("type", "snapshot".to_string())])
            .await
    }

    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        self.list_all("/volumes", "volumes", &[]).await
    }
}
