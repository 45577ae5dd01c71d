//! Check command implementation.
//!
//! Fetches the price catalog and lists every resource kind once, without
//! starting the server.

use tracing::debug;

use crate::config::Settings;
use crate::hcloud::{CloudApi, HcloudClient, PricingSource};
use crate::pricing::PriceSnapshot;

/// Outcome of one check step.
#[derive(Debug)]
pub struct CheckStep {
    pub name: &'static str,
    pub result: Result<String, String>,
}

impl CheckStep {
    fn count<T, E: std::fmt::Display>(name: &'static str, result: Result<Vec<T>, E>) -> Self {
        Self {
            name,
            result: result
                .map(|items| format!("{} found", items.len()))
                .map_err(|e| e.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs every check step against the given API.
pub async fn run_checks(api: &dyn CloudApi, source: &dyn PricingSource) -> Vec<CheckStep> {
    let pricing = source
        .fetch_pricing()
        .await
        .and_then(PriceSnapshot::from_pricing)
        .map(|snapshot| {
            format!(
                "currency {}, {} server types, {} load balancer types, fetched at {}",
                snapshot.currency,
                snapshot.server_types.len(),
                snapshot.load_balancer_types.len(),
                snapshot.fetched_at.to_rfc3339()
            )
        })
        .map_err(|e| e.to_string());

    let steps = vec![
        CheckStep {
            name: "pricing",
            result: pricing,
        },
        CheckStep::count("floating IPs", api.list_floating_ips().await),
        CheckStep::count("primary IPs", api.list_primary_ips().await),
        CheckStep::count("servers", api.list_servers().await),
        CheckStep::count("load balancers", api.list_load_balancers().await),
        CheckStep::count("snapshots", api.list_snapshots().await),
        CheckStep::count("volumes", api.list_volumes().await),
    ];
    debug!("Completed {} check steps", steps.len());
    steps
}

/// Runs the checks against the configured HCloud API and prints a summary.
///
/// Exits with status 1 when any step failed.
pub async fn command_check(settings: &Settings) -> anyhow::Result<()> {
    println!("HCloud Pricing Exporter - API Check");
    println!("===================================");
    println!("Endpoint: {}", settings.api_endpoint);

    let client = HcloudClient::new(&settings.api_endpoint, &settings.token, settings.api_timeout)?;
    let steps = run_checks(&client, &client).await;

    println!();
    for step in &steps {
        match &step.result {
            Ok(detail) => println!("   ✅ {:15} {}", step.name, detail),
            Err(e) => println!("   ❌ {:15} {}", step.name, e),
        }
    }

    println!("\n📋 Summary:");
    if steps.iter().all(CheckStep::is_ok) {
        println!("   ✅ All checks passed");
        Ok(())
    } else {
        println!("   ❌ Some checks failed");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::tests::{SamplePricing, StaticApi};

    #[tokio::test]
    async fn test_all_steps_pass() {
        let steps = run_checks(&StaticApi::default(), &SamplePricing).await;
        assert_eq!(steps.len(), 7);
        assert!(steps.iter().all(CheckStep::is_ok));
        assert_eq!(steps[3].result.as_deref(), Ok("0 found"));
        let pricing = steps[0].result.as_deref().unwrap();
        assert!(pricing.starts_with("currency EUR, 1 server types"));
        assert!(pricing.contains("fetched at "));
    }

    #[tokio::test]
    async fn test_failing_listing_is_reported() {
        let api = StaticApi {
            fail_servers: true,
            ..Default::default()
        };
        let steps = run_checks(&api, &SamplePricing).await;

        let failed: Vec<&str> = steps
            .iter()
            .filter(|s| !s.is_ok())
            .map(|s| s.name)
            .collect();
        assert_eq!(failed, vec!["servers"]);
    }
}
