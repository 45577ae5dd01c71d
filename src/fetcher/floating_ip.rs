use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{BaseFetcher, Fetcher};
use crate::error::ExporterError;
use crate::hcloud::CloudApi;
use crate::pricing::{lookup, Price, PriceCache};

const RESOURCE: &str = "floatingip";

/// Floating IPs, priced by IP type and home location.
pub struct FloatingIpFetcher {
    base: BaseFetcher,
}

impl FloatingIpFetcher {
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
impl Fetcher for FloatingIpFetcher {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn base(&self) -> &BaseFetcher {
        &self.base
    }

    async fn run(&self, api: &dyn CloudApi) -> Result<(), ExporterError> {
        let floating_ips = api
            .list_floating_ips()
            .await
            .map_err(|e| ExporterError::list("floating IPs", e))?;
        let snapshot = self.base.snapshot().await?;

        for ip in &floating_ips {
            let location = ip.home_location.name.as_str();
            let monthly = lookup::floating_ip(&snapshot, &ip.ip_type, location)
                .map_err(|e| e.for_resource("floating IP", &ip.name))?;

            self.base.publish(
                &[&ip.name, location, &ip.ip_type],
                &ip.labels,
                Price::from_monthly(monthly),
            );
        }

        debug!("Published pricing for {} floating IPs", floating_ips.len());
        Ok(())
    }
}
