//! Lazily populated, explicitly invalidated cache of the price catalog.
//!
//! The cache holds at most one [`PriceSnapshot`]. Readers take the shared
//! lock and clone the `Arc` when the slot is populated. An empty slot is
//! filled under the exclusive lock after re-checking it, so concurrent
//! callers trigger at most one upstream fetch and wait for its outcome.
//!
//! A failed fetch is not cached. Callers that were already waiting when the
//! failing attempt ran receive that attempt's error; callers arriving after
//! it completed start a new attempt.

use prometheus::{Gauge, IntCounterVec};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

use super::snapshot::PriceSnapshot;
use crate::error::ExporterError;
use crate::hcloud::PricingSource;

#[derive(Default)]
struct Slot {
    snapshot: Option<Arc<PriceSnapshot>>,
    /// Error of the latest failed attempt, tagged with its attempt number.
    last_failure: Option<(u64, ExporterError)>,
}

/// Shared price catalog cache.
pub struct PriceCache {
    source: Arc<dyn PricingSource>,
    slot: RwLock<Slot>,
    /// Number of completed upstream fetch attempts.
    attempts: AtomicU64,
    fetch_counter: Option<IntCounterVec>,
    fetched_timestamp: Option<Gauge>,
}

impl PriceCache {
    /// Creates an empty cache backed by `source`.
    pub fn new(source: Arc<dyn PricingSource>) -> Self {
        Self {
            source,
            slot: RwLock::new(Slot::default()),
            attempts: AtomicU64::new(0),
            fetch_counter: None,
            fetched_timestamp: None,
        }
    }

    /// Counts upstream fetches by `result` label (`success` / `failure`).
    pub fn with_fetch_counter(mut self, counter: IntCounterVec) -> Self {
        self.fetch_counter = Some(counter);
        self
    }

    /// Records the `fetched_at` time of each new snapshot as Unix seconds.
    pub fn with_fetched_timestamp(mut self, gauge: Gauge) -> Self {
        self.fetched_timestamp = Some(gauge);
        self
    }

    /// Returns the cached snapshot, fetching it from upstream if the cache is empty.
    pub async fn get_or_fetch(&self) -> Result<Arc<PriceSnapshot>, ExporterError> {
        // Read before any lock so that waiting on the lock cannot hide an attempt.
        let observed = self.attempts.load(Ordering::SeqCst);

        {
            let slot = self.slot.read().await;
            if let Some(snapshot) = &slot.snapshot {
                return Ok(Arc::clone(snapshot));
            }
        }

        let mut slot = self.slot.write().await;
        if let Some(snapshot) = &slot.snapshot {
            return Ok(Arc::clone(snapshot));
        }
        if let Some((attempt, err)) = &slot.last_failure {
            if *attempt > observed {
                debug!("Sharing result of failed pricing fetch #{}", attempt);
                return Err(err.clone());
            }
        }

        self.fetch_locked(&mut slot).await
    }

    #[instrument(skip(self, slot))]
    async fn fetch_locked(&self, slot: &mut Slot) -> Result<Arc<PriceSnapshot>, ExporterError> {
        info!("Pricing cache empty or invalidated, fetching from HCloud API...");

        let result = match self.source.fetch_pricing().await {
            Ok(pricing) => PriceSnapshot::from_pricing(pricing),
            Err(e) => Err(e),
        };
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        match result {
            Ok(snapshot) => {
                info!(
                    "Successfully fetched pricing information from API ({} server types, currency {}).",
                    snapshot.server_types.len(),
                    snapshot.currency
                );
                self.count("success");
                if let Some(gauge) = &self.fetched_timestamp {
                    gauge.set(snapshot.fetched_at.timestamp_millis() as f64 / 1000.0);
                }
                let snapshot = Arc::new(snapshot);
                slot.snapshot = Some(Arc::clone(&snapshot));
                slot.last_failure = None;
                Ok(snapshot)
            }
            Err(e) => {
                error!("Error fetching pricing from HCloud API: {}", e);
                self.count("failure");
                let err = ExporterError::PricingFetch(Arc::new(e));
                slot.last_failure = Some((attempt, err.clone()));
                Err(err)
            }
        }
    }

    /// Drops the cached snapshot; the next lookup fetches a fresh one.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        info!("Invalidating pricing cache.");
        slot.snapshot = None;
        slot.last_failure = None;
    }

    pub async fn is_populated(&self) -> bool {
        self.slot.read().await.snapshot.is_some()
    }

    fn count(&self, result: &str) {
        if let Some(counter) = &self.fetch_counter {
            counter.with_label_values(&[result]).inc();
        }
    }
}
