//! Wires the price cache, the fetchers and the registry together.

use axum::{routing::get, Router};
use prometheus::Registry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, instrument};

use crate::error::CycleError;
use crate::fetcher::Fetchers;
use crate::handlers::{health_handler, metrics_handler};
use crate::hcloud::{CloudApi, PricingSource};
use crate::metrics::ExporterMetrics;
use crate::pricing::PriceCache;
use crate::state::AppState;

/// One exporter instance: a registry, the shared price cache and the
/// fetchers that write into the registry.
pub struct Exporter {
    registry: Registry,
    metrics: ExporterMetrics,
    pricing: Arc<PriceCache>,
    fetchers: Fetchers,
    api: Arc<dyn CloudApi>,
}

impl Exporter {
    /// Builds the exporter and registers every gauge and counter.
    pub fn new(
        api: Arc<dyn CloudApi>,
        source: Arc<dyn PricingSource>,
        additional_labels: &[String],
    ) -> prometheus::Result<Self> {
        let registry = Registry::new();
        let metrics = ExporterMetrics::new(&registry)?;

        let pricing = Arc::new(
            PriceCache::new(source)
                .with_fetch_counter(metrics.price_fetches.clone())
                .with_fetched_timestamp(metrics.price_catalog_fetched.clone()),
        );
        let fetchers = Fetchers::standard(Arc::clone(&pricing), additional_labels.into())?;
        fetchers.register(&registry)?;
        debug!("Registered fetchers: {:?}", fetchers.names());

        Ok(Self {
            registry,
            metrics,
            pricing,
            fetchers,
            api,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn pricing(&self) -> &Arc<PriceCache> {
        &self.pricing
    }

    /// Runs every fetcher once and records the cycle's self-metrics.
    pub async fn run_cycle(&self) -> Result<(), CycleError> {
        let start = Instant::now();
        let result = self.fetchers.run_all(self.api.as_ref()).await;
        self.metrics
            .record_cycle(start.elapsed().as_secs_f64(), &result);
        result
    }

    /// First cycle before serving. The caller decides whether a failure is fatal.
    #[instrument(skip(self))]
    pub async fn run_initial_cycle(&self) -> Result<(), CycleError> {
        info!("Performing initial fetch cycle");
        self.run_cycle().await?;
        info!("Initial fetch cycle completed successfully");
        Ok(())
    }

    /// Periodic cycle: failures are logged and the previously exported
    /// samples stay in place.
    #[instrument(skip(self))]
    pub async fn run_scheduled_cycle(&self) {
        debug!("Starting scheduled fetch cycle");
        match self.run_cycle().await {
            Ok(()) => debug!("Scheduled fetch cycle completed"),
            Err(e) => error!("Scheduled fetch cycle failed: {}", e),
        }
    }

    /// Drops the cached price catalog; the next fetcher run refetches it.
    pub async fn invalidate_prices(&self) {
        self.pricing.invalidate().await;
    }

    /// HTTP routes serving this exporter's registry.
    pub fn router(&self, http_timeout: Duration) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .with_state(AppState::new(self.registry.clone()))
            .layer(TimeoutLayer::new(http_timeout))
            .layer(TraceLayer::new_for_http())
    }
}
