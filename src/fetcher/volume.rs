use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{BaseFetcher, Fetcher};
use crate::error::ExporterError;
use crate::hcloud::CloudApi;
use crate::pricing::{lookup, Price, PriceCache};

const RESOURCE: &str = "volume";

/// Block storage volumes, billed per provisioned GB.
pub struct VolumeFetcher {
    base: BaseFetcher,
}

impl VolumeFetcher {
    pub fn new(
        pricing: Arc<PriceCache>,
        additional_labels: Arc<[String]>,
    ) -> prometheus::Result<Self> {
        Ok(Self {
            base: BaseFetcher::new(pricing, RESOURCE, &["location", "bytes"], additional_labels)?,
        })
    }
}

#[async_trait]
impl Fetcher for VolumeFetcher {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn base(&self) -> &BaseFetcher {
        &self.base
    }

    async fn run(&self, api: &dyn CloudApi) -> Result<(), ExporterError> {
        let volumes = api
            .list_volumes()
            .await
            .map_err(|e| ExporterError::list("volumes", e))?;
        let snapshot = self.base.snapshot().await?;
        let per_gb = lookup::volume_per_gb_month(&snapshot);

        for volume in &volumes {
            let monthly = volume.size as f64 * per_gb;
            // The `bytes` label carries the size in GB.
            let size = volume.size.to_string();

            self.base.publish(
                &[&volume.name, &volume.location.name, &size],
                &volume.labels,
                Price::from_monthly(monthly),
            );
        }

        debug!("Published pricing for {} volumes", volumes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::tests::{cache, gauge_value, labels, StaticApi};
    use crate::hcloud::models::Volume;
    use prometheus::Registry;
    use serde_json::json;

    #[tokio::test]
    async fn test_prices_volume_by_size() {
        let registry = Registry::new();
        let fetcher = VolumeFetcher::new(cache(), labels(&[])).unwrap();
        fetcher.register(&registry).unwrap();

        let volume: Volume = serde_json::from_value(json!({
            "id": 5,
            "name": "data",
            "size": 100,
            "location": {"name": "fsn1"}
        }))
        .unwrap();
        let api = StaticApi {
            volumes: vec![volume],
            ..Default::default()
        };
        fetcher.run(&api).await.unwrap();

        let monthly = gauge_value(
            &registry,
            "hcloud_pricing_volume_monthly",
            &[("name", "data"), ("location", "fsn1"), ("bytes", "100")],
        )
        .unwrap();
        assert!((monthly - 5.24).abs() < 1e-9);
    }
}
