//! Background loops: periodic fetch cycles and periodic price invalidation.
//!
//! The two loops are independent. Both skip the immediate first tick; the
//! initial cycle runs before the scheduler is started.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::exporter::Exporter;

/// Roughly thirty years.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Interval whose first tick fires one `period` from now.
///
/// A period too large to add to the current instant never ticks.
fn delayed_ticker(period: Duration) -> Interval {
    let start = Instant::now()
        .checked_add(period)
        .unwrap_or_else(|| Instant::now() + FAR_FUTURE);
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Handles of the running background loops.
pub struct Scheduler {
    fetch: JoinHandle<()>,
    invalidation: JoinHandle<()>,
}

impl Scheduler {
    /// Spawns both loops on the current runtime.
    pub fn spawn(
        exporter: Arc<Exporter>,
        fetch_interval: Duration,
        invalidation_interval: Duration,
    ) -> Self {
        let fetch_exporter = Arc::clone(&exporter);
        let fetch = tokio::spawn(async move {
            let mut ticker = delayed_ticker(fetch_interval);
            debug!(
                "Fetch loop started with {}s interval",
                fetch_interval.as_secs_f64()
            );

            loop {
                ticker.tick().await;
                fetch_exporter.run_scheduled_cycle().await;
            }
        });

        let invalidation = tokio::spawn(async move {
            let mut ticker = delayed_ticker(invalidation_interval);
            debug!(
                "Price invalidation loop started with {}s interval",
                invalidation_interval.as_secs_f64()
            );

            loop {
                ticker.tick().await;
                exporter.invalidate_prices().await;
            }
        });

        info!("Background schedulers started");
        Self {
            fetch,
            invalidation,
        }
    }

    /// Aborts both loops and waits for them to stop.
    pub async fn shutdown(self) {
        self.fetch.abort();
        self.invalidation.abort();
        let _ = self.fetch.await;
        let _ = self.invalidation.await;
        debug!("Background schedulers stopped");
    }
}
