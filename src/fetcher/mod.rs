//! Per-resource-kind cost fetchers and the fetch orchestrator.
//!
//! Every fetcher lists the live resources of one kind, prices each instance
//! against the shared [`PriceCache`] and publishes an hourly and a monthly
//! gauge sample per instance. Samples are overwritten by label tuple on the
//! next run; tuples of resources that disappeared are kept until restart.

mod floating_ip;
mod load_balancer;
mod load_balancer_traffic;
mod primary_ip;
mod server;
mod server_backup;
mod server_traffic;
mod snapshot;
mod volume;

pub use floating_ip::FloatingIpFetcher;
pub use load_balancer::LoadBalancerFetcher;
pub use load_balancer_traffic::LoadBalancerTrafficFetcher;
pub use primary_ip::PrimaryIpFetcher;
pub use server::ServerFetcher;
pub use server_backup::ServerBackupFetcher;
pub use server_traffic::ServerTrafficFetcher;
pub use snapshot::SnapshotFetcher;
pub use volume::VolumeFetcher;

use async_trait::async_trait;
use prometheus::{GaugeVec, Opts, Registry};
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::error::{CycleError, ExporterError, FetcherFailure};
use crate::hcloud::models::Labels;
use crate::hcloud::CloudApi;
use crate::pricing::{Price, PriceCache, PriceSnapshot};

/// Metric namespace shared by all cost gauges.
const NAMESPACE: &str = "hcloud";
const SUBSYSTEM: &str = "pricing";

/// A cost fetcher for one resource kind.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Resource identifier, also the metric name stem.
    fn name(&self) -> &'static str;

    fn base(&self) -> &BaseFetcher;

    /// Registers the fetcher's gauges with `registry`.
    fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        self.base().register(registry)
    }

    /// Lists, prices and publishes every resource of this kind once.
    async fn run(&self, api: &dyn CloudApi) -> Result<(), ExporterError>;
}

/// State shared by all fetchers: the two gauges, the price cache and the
/// configured additional label keys.
pub struct BaseFetcher {
    pricing: Arc<PriceCache>,
    hourly: GaugeVec,
    monthly: GaugeVec,
    additional_labels: Arc<[String]>,
}

impl BaseFetcher {
    /// Creates `hcloud_pricing_<resource>_{hourly,monthly}` with labels
    /// `name`, then `fixed_labels`, then the additional labels.
    pub fn new(
        pricing: Arc<PriceCache>,
        resource: &str,
        fixed_labels: &[&str],
        additional_labels: Arc<[String]>,
    ) -> prometheus::Result<Self> {
        let mut labels: Vec<&str> = vec!["name"];
        labels.extend_from_slice(fixed_labels);
        labels.extend(additional_labels.iter().map(String::as_str));

        let hourly = GaugeVec::new(
            Opts::new(
                format!("{resource}_hourly"),
                format!("The cost of the resource {resource} per hour"),
            )
            .namespace(NAMESPACE)
            .subsystem(SUBSYSTEM),
            &labels,
        )?;
        let monthly = GaugeVec::new(
            Opts::new(
                format!("{resource}_monthly"),
                format!("The cost of the resource {resource} per month"),
            )
            .namespace(NAMESPACE)
            .subsystem(SUBSYSTEM),
            &labels,
        )?;

        Ok(Self {
            pricing,
            hourly,
            monthly,
            additional_labels,
        })
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.hourly.clone()))?;
        registry.register(Box::new(self.monthly.clone()))?;
        Ok(())
    }

    /// Current price snapshot from the shared cache.
    pub async fn snapshot(&self) -> Result<Arc<PriceSnapshot>, ExporterError> {
        self.pricing.get_or_fetch().await
    }

    /// Writes both gauges for one resource instance.
    ///
    /// `fixed` holds the instance name followed by the kind's fixed label values.
    pub fn publish(&self, fixed: &[&str], tags: &Labels, price: Price) {
        let additional = additional_label_values(&self.additional_labels, tags);
        let mut values: Vec<&str> = Vec::with_capacity(fixed.len() + additional.len());
        values.extend_from_slice(fixed);
        values.extend(additional.iter().map(String::as_str));

        self.hourly.with_label_values(values.as_slice()).set(price.hourly);
        self.monthly.with_label_values(values.as_slice()).set(price.monthly);
    }
}

/// Resolves the configured label keys against a resource's labels.
///
/// Keys the resource does not carry yield an empty value.
pub fn additional_label_values(keys: &[String], tags: &Labels) -> Vec<String> {
    keys.iter()
        .map(|key| tags.get(key).cloned().unwrap_or_default())
        .collect()
}

/// The registered fetchers, run in registration order.
pub struct Fetchers {
    fetchers: Vec<Box<dyn Fetcher>>,
}

impl Fetchers {
    pub fn new(fetchers: Vec<Box<dyn Fetcher>>) -> Self {
        Self { fetchers }
    }

    /// All nine resource kinds.
    pub fn standard(
        pricing: Arc<PriceCache>,
        additional_labels: Arc<[String]>,
    ) -> prometheus::Result<Self> {
        let p = || Arc::clone(&pricing);
        let l = || Arc::clone(&additional_labels);

        let fetchers: Vec<Box<dyn Fetcher>> = vec![
            Box::new(FloatingIpFetcher::new(p(), l())?),
            Box::new(PrimaryIpFetcher::new(p(), l())?),
            Box::new(LoadBalancerFetcher::new(p(), l())?),
            Box::new(LoadBalancerTrafficFetcher::new(p(), l())?),
            Box::new(ServerFetcher::new(p(), l())?),
            Box::new(ServerBackupFetcher::new(p(), l())?),
            Box::new(ServerTrafficFetcher::new(p(), l())?),
            Box::new(SnapshotFetcher::new(p(), l())?),
            Box::new(VolumeFetcher::new(p(), l())?),
        ];
        Ok(Self::new(fetchers))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.fetchers.iter().map(|f| f.name()).collect()
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        for fetcher in &self.fetchers {
            fetcher.register(registry)?;
        }
        Ok(())
    }

    /// Runs every fetcher once.
    ///
    /// A failing fetcher does not stop the others; all failures are returned
    /// together in registration order.
    #[instrument(skip_all)]
    pub async fn run_all(&self, api: &dyn CloudApi) -> Result<(), CycleError> {
        let mut failures = Vec::new();

        for fetcher in &self.fetchers {
            match fetcher.run(api).await {
                Ok(()) => debug!("Fetcher {} completed", fetcher.name()),
                Err(e) => {
                    error!("Fetcher {} failed: {}", fetcher.name(), e);
                    failures.push(FetcherFailure {
                        fetcher: fetcher.name(),
                        error: e,
                    });
                }
            }
        }

        match CycleError::from_failures(failures) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
