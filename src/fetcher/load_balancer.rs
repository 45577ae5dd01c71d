use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{BaseFetcher, Fetcher};
use crate::error::ExporterError;
use crate::hcloud::CloudApi;
use crate::pricing::{lookup, PriceCache};

const RESOURCE: &str = "loadbalancer";

/// Load balancers, priced by load balancer type and location.
pub struct LoadBalancerFetcher {
    base: BaseFetcher,
}

impl LoadBalancerFetcher {
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
impl Fetcher for LoadBalancerFetcher {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn base(&self) -> &BaseFetcher {
        &self.base
    }

    async fn run(&self, api: &dyn CloudApi) -> Result<(), ExporterError> {
        let load_balancers = api
            .list_load_balancers()
            .await
            .map_err(|e| ExporterError::list("load balancers", e))?;
        let snapshot = self.base.snapshot().await?;

        for lb in &load_balancers {
            let location = lb.location.name.as_str();
            let lb_type = lb.load_balancer_type.name.as_str();
            let price = lookup::load_balancer_type(&snapshot, lb_type, location)
                .map_err(|e| e.for_resource("load balancer", &lb.name))?;

            self.base
                .publish(&[&lb.name, location, lb_type], &lb.labels, price);
        }

        debug!("Published pricing for {} load balancers", load_balancers.len());
        Ok(())
    }
}
