use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{BaseFetcher, Fetcher};
use crate::error::ExporterError;
use crate::hcloud::CloudApi;
use crate::pricing::{lookup, Price, PriceCache};

const RESOURCE: &str = "snapshot";

/// Server snapshots, billed per stored GB.
pub struct SnapshotFetcher {
    base: BaseFetcher,
}

impl SnapshotFetcher {
    pub fn new(
        pricing: Arc<PriceCache>,
        additional_labels: Arc<[String]>,
    ) -> prometheus::Result<Self> {
        Ok(Self {
            base: BaseFetcher::new(pricing, RESOURCE, &[], additional_labels)?,
        })
    }
}

#[async_trait]
impl Fetcher for SnapshotFetcher {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn base(&self) -> &BaseFetcher {
        &self.base
    }

    async fn run(&self, api: &dyn CloudApi) -> Result<(), ExporterError> {
        let images = api
            .list_snapshots()
            .await
            .map_err(|e| ExporterError::list("images", e))?;
        let snapshot = self.base.snapshot().await?;
        let per_gb = lookup::image_per_gb_month(&snapshot);

        let mut published = 0usize;
        for image in images.iter().filter(|i| i.image_type == "snapshot") {
            let monthly = image.image_size.unwrap_or(0.0) * per_gb;

            self.base.publish(
                &[image.display_name()],
                &image.labels,
                Price::from_monthly(monthly),
            );
            published += 1;
        }

        debug!("Published pricing for {} snapshots", published);
        Ok(())
    }
}
