#![allow(dead_code)]

use async_trait::async_trait;
use hcloud_pricing_exporter::hcloud::error::{ApiError, Result as ApiResult};
use hcloud_pricing_exporter::hcloud::models::{
    FloatingIp, Image, LoadBalancer, PrimaryIp, Pricing, Server, Volume,
};
use hcloud_pricing_exporter::hcloud::{CloudApi, PricingSource};
use prometheus::{Encoder, Registry, TextEncoder};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn pricing_json() -> Value {
    json!({
        "currency": "EUR",
        "vat_rate": "19.00",
        "image": {"price_per_gb_month": {"net": "0.0100", "gross": "0.0119"}},
        "floating_ips": [
            {"type": "ipv4", "prices": [
                {"location": "nbg1", "price_monthly": {"net": "0.84", "gross": "1.00"}}
            ]}
        ],
        "primary_ips": [],
        "traffic": {"price_per_tb": {"net": "1.00", "gross": "1.19"}},
        "server_backup": {"percentage": "20.00"},
        "server_types": [
            {"name": "cx22", "prices": [
                {"location": "nbg1",
                 "price_hourly": {"net": "0.0060", "gross": "0.0071"},
                 "price_monthly": {"net": "3.79", "gross": "4.51"}}
            ]}
        ],
        "load_balancer_types": [],
        "volume": {"price_per_gb_month": {"net": "0.0440", "gross": "0.0524"}}
    })
}

pub fn floating_ip_json(name: &str, labels: Value) -> Value {
    json!({
        "id": 1,
        "name": name,
        "type": "ipv4",
        "home_location": {"name": "nbg1"},
        "labels": labels
    })
}

pub fn server_json(name: &str) -> Value {
    json!({
        "id": 2,
        "name": name,
        "status": "running",
        "server_type": {"name": "cx22"},
        "datacenter": {"name": "nbg1-dc3", "location": {"name": "nbg1"}},
        "backup_window": null,
        "outgoing_traffic": 0,
        "included_traffic": 21990232555520u64
    })
}

/// Price catalog source counting upstream calls.
pub struct CountingPricing {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl CountingPricing {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PricingSource for CountingPricing {
    async fn fetch_pricing(&self) -> ApiResult<Pricing> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(serde_json::from_value(pricing_json())?)
    }
}

fn unavailable() -> ApiError {
    ApiError::Http {
        status: 503,
        body: "service unavailable".into(),
    }
}

/// Mutable in-memory inventory.
#[derive(Default)]
pub struct FakeApi {
    pub floating_ips: Mutex<Vec<FloatingIp>>,
    pub servers: Mutex<Vec<Server>>,
    pub fail: AtomicBool,
}

impl FakeApi {
    fn check(&self) -> ApiResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CloudApi for FakeApi {
    async fn list_floating_ips(&self) -> ApiResult<Vec<FloatingIp>> {
        self.check()?;
        Ok(self.floating_ips.lock().unwrap().clone())
    }

    async fn list_primary_ips(&self) -> ApiResult<Vec<PrimaryIp>> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn list_servers(&self) -> ApiResult<Vec<Server>> {
        self.check()?;
        Ok(self.servers.lock().unwrap().clone())
    }

    async fn list_load_balancers(&self) -> ApiResult<Vec<LoadBalancer>> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn list_snapshots(&self) -> ApiResult<Vec<Image>> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn list_volumes(&self) -> ApiResult<Vec<Volume>> {
        self.check()?;
        Ok(Vec::new())
    }
}

pub fn render(registry: &Registry) -> String {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Value of the `metric` sample with exactly `pairs` as labels, from rendered exposition text.
pub fn sample(text: &str, metric: &str, pairs: &[(&str, &str)]) -> Option<f64> {
    let mut pairs = pairs.to_vec();
    pairs.sort_by_key(|(name, _)| *name);
    let labels: Vec<String> = pairs
        .iter()
        .map(|(name, value)| format!("{name}=\"{value}\""))
        .collect();
    let prefix = if labels.is_empty() {
        format!("{metric} ")
    } else {
        format!("{metric}{{{}}} ", labels.join(","))
    };

    text.lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .and_then(|value| value.trim().parse().ok())
}
