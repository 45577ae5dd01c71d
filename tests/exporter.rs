mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use common::{floating_ip_json, render, sample, server_json, CountingPricing, FakeApi};
use hcloud_pricing_exporter::{Exporter, ExporterError};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn exporter(api: &Arc<FakeApi>, pricing: &Arc<CountingPricing>, labels: &[&str]) -> Exporter {
    let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
    Exporter::new(api.clone(), pricing.clone(), &labels).unwrap()
}

#[tokio::test]
async fn floating_ip_cost_with_additional_labels() {
    let api = Arc::new(FakeApi::default());
    api.floating_ips.lock().unwrap().push(
        serde_json::from_value(floating_ip_json("ip-1", json!({"owner": "teamA"}))).unwrap(),
    );
    let pricing = Arc::new(CountingPricing::new());
    let exporter = exporter(&api, &pricing, &["owner", "env"]);

    exporter.run_initial_cycle().await.unwrap();

    let text = render(exporter.registry());
    let labels = [
        ("name", "ip-1"),
        ("location", "nbg1"),
        ("type", "ipv4"),
        ("owner", "teamA"),
        ("env", ""),
    ];
    let monthly = sample(&text, "hcloud_pricing_floatingip_monthly", &labels).unwrap();
    let hourly = sample(&text, "hcloud_pricing_floatingip_hourly", &labels).unwrap();
    assert_eq!(monthly, 1.00);
    assert!((hourly - 0.00137).abs() < 1e-5);
    assert_eq!(
        sample(&text, "hcloud_pricing_exporter_last_fetch_success", &[]),
        Some(1.0)
    );
}

#[tokio::test]
async fn price_catalog_is_fetched_once_per_invalidation() {
    let api = Arc::new(FakeApi::default());
    let pricing = Arc::new(CountingPricing::new());
    let exporter = exporter(&api, &pricing, &[]);

    exporter.run_initial_cycle().await.unwrap();
    exporter.run_scheduled_cycle().await;
    assert_eq!(pricing.calls(), 1);

    exporter.invalidate_prices().await;
    assert_eq!(pricing.calls(), 1);

    exporter.run_scheduled_cycle().await;
    assert_eq!(pricing.calls(), 2);

    let text = render(exporter.registry());
    assert_eq!(
        sample(
            &text,
            "hcloud_pricing_exporter_price_fetches_total",
            &[("result", "success")]
        ),
        Some(2.0)
    );
    let fetched = sample(
        &text,
        "hcloud_pricing_exporter_price_catalog_fetched_timestamp_seconds",
        &[],
    )
    .unwrap();
    assert!(fetched > 1.6e9);
}

#[tokio::test]
async fn failing_initial_cycle_is_reported() {
    let api = Arc::new(FakeApi::default());
    let pricing = Arc::new(CountingPricing::new());
    pricing.fail.store(true, Ordering::SeqCst);
    let exporter = exporter(&api, &pricing, &[]);

    let err = exporter.run_initial_cycle().await.unwrap_err();

    assert_eq!(err.failures().len(), 9);
    assert_eq!(err.first().fetcher, "floatingip");
    assert!(matches!(err.first().error, ExporterError::PricingFetch(_)));
    // Failures are not cached: every fetcher retried the catalog.
    assert_eq!(pricing.calls(), 9);
}

#[tokio::test]
async fn later_failure_keeps_previous_samples() {
    let api = Arc::new(FakeApi::default());
    api.servers
        .lock()
        .unwrap()
        .push(serde_json::from_value(server_json("web-1")).unwrap());
    let pricing = Arc::new(CountingPricing::new());
    let exporter = exporter(&api, &pricing, &[]);

    exporter.run_initial_cycle().await.unwrap();

    api.fail.store(true, Ordering::SeqCst);
    exporter.run_scheduled_cycle().await;

    let text = render(exporter.registry());
    let labels = [("name", "web-1"), ("location", "nbg1"), ("type", "cx22")];
    assert_eq!(
        sample(&text, "hcloud_pricing_server_monthly", &labels),
        Some(4.51)
    );
    assert_eq!(
        sample(&text, "hcloud_pricing_server_backup_monthly", &labels),
        Some(0.0)
    );
    assert_eq!(
        sample(&text, "hcloud_pricing_exporter_last_fetch_success", &[]),
        Some(0.0)
    );
    assert_eq!(
        sample(
            &text,
            "hcloud_pricing_exporter_fetcher_failures_total",
            &[("fetcher", "server")]
        ),
        Some(1.0)
    );
}

#[tokio::test]
async fn router_serves_health_and_metrics() {
    let api = Arc::new(FakeApi::default());
    api.floating_ips
        .lock()
        .unwrap()
        .push(serde_json::from_value(floating_ip_json("ip-1", json!({}))).unwrap());
    let pricing = Arc::new(CountingPricing::new());
    let exporter = exporter(&api, &pricing, &[]);
    exporter.run_initial_cycle().await.unwrap();

    let app = exporter.router(Duration::from_secs(5));

    let resp = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("# TYPE hcloud_pricing_floatingip_hourly gauge"));
    assert_eq!(
        sample(
            &text,
            "hcloud_pricing_floatingip_monthly",
            &[("name", "ip-1"), ("location", "nbg1"), ("type", "ipv4")]
        ),
        Some(1.0)
    );
    // Scrapes never reach upstream.
    assert_eq!(pricing.calls(), 1);
}
