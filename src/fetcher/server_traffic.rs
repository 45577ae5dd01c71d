use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{BaseFetcher, Fetcher};
use crate::error::ExporterError;
use crate::hcloud::CloudApi;
use crate::pricing::{lookup, Price, PriceCache};

const RESOURCE: &str = "server_traffic";

/// Outbound server traffic beyond the included allowance.
pub struct ServerTrafficFetcher {
    base: BaseFetcher,
}

impl ServerTrafficFetcher {
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
impl Fetcher for ServerTrafficFetcher {
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
        let per_tb = lookup::traffic_per_tb(&snapshot);

        for server in &servers {
            let monthly = lookup::traffic_overage(
                server.outgoing_traffic.unwrap_or(0),
                server.included_traffic,
                per_tb,
            );

            self.base.publish(
                &[
                    &server.name,
                    &server.datacenter.location.name,
                    &server.server_type.name,
                ],
                &server.labels,
                Price::from_monthly(monthly),
            );
        }

        debug!("Published traffic pricing for {} servers", servers.len());
        Ok(())
    }
}
