use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{BaseFetcher, Fetcher};
use crate::error::ExporterError;
use crate::hcloud::CloudApi;
use crate::pricing::{lookup, PriceCache};

const RESOURCE: &str = "server";

/// Servers, priced by server type and the location of their datacenter.
pub struct ServerFetcher {
    base: BaseFetcher,
}

impl ServerFetcher {
    pub fn new(
        pricing: Arc<PriceCache>,
        additional_labels: Arc<[String]>,
    ) -> prometheus::Result<Self> {
        Ok(Self {
            base: BaseFetcher::new(pricing, RESOURCE, &["location", "type"], additional_labels)?,
        })
    }
}

#[async_trait]
impl Fetcher for ServerFetcher {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn base(&self) -> &BaseFetcher {
        &self.base
    }

    async fn run(&self, api: &dyn CloudApi) -> Result<(), ExporterError> {
        let servers = api
            .list_servers()
            .await
            .map_err(|e| ExporterError::list("servers", e))?;
        let snapshot = self.base.snapshot().await?;

        for server in &servers {
            let location = server.datacenter.location.name.as_str();
            let server_type = server.server_type.name.as_str();
            let price = lookup::server_type(&snapshot, server_type, location)
                .map_err(|e| e.for_resource("server", &server.name))?;

            self.base
                .publish(&[&server.name, location, server_type], &server.labels, price);
        }

        debug!("Published pricing for {} servers", servers.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::tests::{cache, gauge_value, labels, server, tags, StaticApi};
    use prometheus::Registry;

    #[tokio::test]
    async fn test_prices_by_server_type() {
        let registry = Registry::new();
        let fetcher = ServerFetcher::new(cache(), labels(&["env"])).unwrap();
        fetcher.register(&registry).unwrap();

        let mut web = server("web-1", "cx22", "nbg1");
        web.labels = tags(&[("env", "prod")]);
        let api = StaticApi {
            servers: vec![web],
            ..Default::default()
        };
        fetcher.run(&api).await.unwrap();

        let expected = [
            ("name", "web-1"),
            ("location", "nbg1"),
            ("type", "cx22"),
            ("env", "prod"),
        ];
        assert_eq!(
            gauge_value(&registry, "hcloud_pricing_server_hourly", &expected),
            Some(0.0071)
        );
        assert_eq!(
            gauge_value(&registry, "hcloud_pricing_server_monthly", &expected),
            Some(4.51)
        );
    }

    #[tokio::test]
    async fn test_rerun_overwrites_samples() {
        let registry = Registry::new();
        let fetcher = ServerFetcher::new(cache(), labels(&[])).unwrap();
        fetcher.register(&registry).unwrap();

        let api = StaticApi {
            servers: vec![server("web-1", "cx22", "nbg1")],
            ..Default::default()
        };
        fetcher.run(&api).await.unwrap();
        fetcher.run(&api).await.unwrap();

        let text = crate::fetcher::tests::render(&registry);
        let samples = text
            .lines()
            .filter(|l| l.starts_with("hcloud_pricing_server_monthly{"))
            .count();
        assert_eq!(samples, 1);
    }
}
