use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{BaseFetcher, Fetcher};
use crate::error::ExporterError;
use crate::hcloud::CloudApi;
use crate::pricing::{lookup, Price, PriceCache};

const RESOURCE: &str = "loadbalancer_traffic";

/// Outbound load balancer traffic beyond the included allowance.
pub struct LoadBalancerTrafficFetcher {
    base: BaseFetcher,
}

impl LoadBalancerTrafficFetcher {
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
impl Fetcher for LoadBalancerTrafficFetcher {
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
        let per_tb = lookup::traffic_per_tb(&snapshot);

        for lb in &load_balancers {
            let monthly = lookup::traffic_overage(
                lb.outgoing_traffic.unwrap_or(0),
                lb.included_traffic,
                per_tb,
            );

            self.base.publish(
                &[&lb.name, &lb.location.name, &lb.load_balancer_type.name],
                &lb.labels,
                Price::from_monthly(monthly),
            );
        }

        debug!("Published traffic pricing for {} load balancers", load_balancers.len());
        Ok(())
    }
}
