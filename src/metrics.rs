//! Prometheus metrics describing the exporter itself.
//!
//! The cost gauges live with their fetchers; this module only covers fetch
//! cycle and price catalog bookkeeping.

use prometheus::{Gauge, IntCounterVec, Opts, Registry};

use crate::error::CycleError;

/// Self-metrics of the exporter.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub fetch_duration: Gauge,
    pub last_fetch_success: Gauge,
    pub fetcher_failures: IntCounterVec,
    pub price_fetches: IntCounterVec,
    pub price_catalog_fetched: Gauge,
}

impl ExporterMetrics {
    /// Creates and registers all exporter metrics with the registry.
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let fetch_duration = Gauge::new(
            "hcloud_pricing_exporter_fetch_duration_seconds",
            "Time spent in the last fetch cycle",
        )?;
        let last_fetch_success = Gauge::new(
            "hcloud_pricing_exporter_last_fetch_success",
            "Whether every fetcher succeeded in the last fetch cycle (1) or not (0)",
        )?;
        let fetcher_failures = IntCounterVec::new(
            Opts::new(
                "hcloud_pricing_exporter_fetcher_failures_total",
                "Number of failed fetcher runs",
            ),
            &["fetcher"],
        )?;
        let price_fetches = IntCounterVec::new(
            Opts::new(
                "hcloud_pricing_exporter_price_fetches_total",
                "Number of price catalog fetches from the HCloud API",
            ),
            &["result"],
        )?;
        let price_catalog_fetched = Gauge::new(
            "hcloud_pricing_exporter_price_catalog_fetched_timestamp_seconds",
            "Unix time at which the cached price catalog was fetched",
        )?;

        registry.register(Box::new(fetch_duration.clone()))?;
        registry.register(Box::new(last_fetch_success.clone()))?;
        registry.register(Box::new(fetcher_failures.clone()))?;
        registry.register(Box::new(price_fetches.clone()))?;
        registry.register(Box::new(price_catalog_fetched.clone()))?;

        Ok(Self {
            fetch_duration,
            last_fetch_success,
            fetcher_failures,
            price_fetches,
            price_catalog_fetched,
        })
    }

    /// Records the outcome of one fetch cycle.
    pub fn record_cycle(&self, duration_seconds: f64, result: &Result<(), CycleError>) {
        self.fetch_duration.set(duration_seconds);
        match result {
            Ok(()) => self.last_fetch_success.set(1.0),
            Err(err) => {
                self.last_fetch_success.set(0.0);
                for failure in err.failures() {
                    self.fetcher_failures
                        .with_label_values(&[failure.fetcher])
                        .inc();
                }
            }
        }
    }
}
