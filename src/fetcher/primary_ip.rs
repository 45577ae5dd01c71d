use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{BaseFetcher, Fetcher};
use crate::error::ExporterError;
use crate::hcloud::CloudApi;
use crate::pricing::{lookup, Price, PriceCache};

const RESOURCE: &str = "primaryip";

/// IPv6 primary IPs are free and have no catalog entry.
const UNPRICED_TYPE: &str = "ipv6";

/// Primary IPs, priced by IP type and the location of their datacenter.
pub struct PrimaryIpFetcher {
    base: BaseFetcher,
}

impl PrimaryIpFetcher {
    pub fn new(
        pricing: Arc<PriceCache>,
        additional_labels: Arc<[String]>,
    ) -> prometheus::Result<Self> {
        Ok(Self {
            base: BaseFetcher::new(pricing, RESOURCE, &["datacenter", "type"], additional_labels)?,
        })
    }
}

#[async_trait]
impl Fetcher for PrimaryIpFetcher {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn base(&self) -> &BaseFetcher {
        &self.base
    }

    async fn run(&self, api: &dyn CloudApi) -> Result<(), ExporterError> {
        let primary_ips = api
            .list_primary_ips()
            .await
            .map_err(|e| ExporterError::list("primary IPs", e))?;
        let snapshot = self.base.snapshot().await?;

        for ip in &primary_ips {
            let datacenter = &ip.datacenter;

            let price = if ip.ip_type == UNPRICED_TYPE {
                Price::ZERO
            } else {
                lookup::primary_ip(&snapshot, &ip.ip_type, &datacenter.location.name)
                    .map_err(|e| e.for_resource("primary IP", &ip.name))?
            };

            self.base
                .publish(&[&ip.name, &datacenter.name, &ip.ip_type], &ip.labels, price);
        }

        debug!("Published pricing for {} primary IPs", primary_ips.len());
        Ok(())
    }
}
