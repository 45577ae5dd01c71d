//! Wire types for the subset of the HCloud API the exporter reads.
//!
//! Only the fields needed for cost calculation and labelling are modelled;
//! unknown fields are ignored by serde.

use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};

/// User-defined key/value labels attached to HCloud resources.
pub type Labels = HashMap<String, String>;

/// A decimal price string pair as returned by the pricing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAmount {
    pub net: String,
    pub gross: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePerGbMonth {
    pub price_per_gb_month: PriceAmount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficPricing {
    pub price_per_tb: PriceAmount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerBackupPricing {
    pub percentage: String,
}

/// Monthly-only price for one location (floating IPs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyLocationPrice {
    pub location: String,
    pub price_monthly: PriceAmount,
}

/// Hourly and monthly price for one location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPrice {
    pub location: String,
    pub price_hourly: PriceAmount,
    pub price_monthly: PriceAmount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingIpTypePricing {
    #[serde(rename = "type")]
    pub ip_type: String,
    #[serde(default)]
    pub prices: Vec<MonthlyLocationPrice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryIpTypePricing {
    #[serde(rename = "type")]
    pub ip_type: String,
    #[serde(default)]
    pub prices: Vec<LocationPrice>,
}

/// Per-location prices of a server type or load balancer type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedTypePricing {
    pub name: String,
    #[serde(default)]
    pub prices: Vec<LocationPrice>,
}

/// The full price catalog (`GET /pricing`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pricing {
    pub currency: String,
    #[serde(default)]
    pub vat_rate: String,
    pub image: PricePerGbMonth,
    #[serde(default)]
    pub floating_ips: Vec<FloatingIpTypePricing>,
    #[serde(default)]
    pub primary_ips: Vec<PrimaryIpTypePricing>,
    pub traffic: TrafficPricing,
    pub server_backup: ServerBackupPricing,
    #[serde(default)]
    pub server_types: Vec<NamedTypePricing>,
    #[serde(default)]
    pub load_balancer_types: Vec<NamedTypePricing>,
    pub volume: PricePerGbMonth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingResponse {
    pub pricing: Pricing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Datacenter {
    pub name: String,
    pub location: Location,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingIp {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub ip_type: String,
    pub home_location: Location,
    #[serde(default)]
    pub labels: Labels,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryIp {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub ip_type: String,
    pub datacenter: Datacenter,
    #[serde(default)]
    pub labels: Labels,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub status: String,
    pub server_type: TypeRef,
    pub datacenter: Datacenter,
    /// Set when backups are enabled for the server.
    #[serde(default)]
    pub backup_window: Option<String>,
    /// Outbound traffic of the current billing period in bytes.
    #[serde(default)]
    pub outgoing_traffic: Option<u64>,
    /// Free traffic of the current billing period in bytes.
    #[serde(default)]
    pub included_traffic: u64,
    #[serde(default)]
    pub labels: Labels,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub id: u64,
    pub name: String,
    pub load_balancer_type: TypeRef,
    pub location: Location,
    #[serde(default)]
    pub outgoing_traffic: Option<u64>,
    #[serde(default)]
    pub included_traffic: u64,
    #[serde(default)]
    pub labels: Labels,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub image_type: String,
    /// Size of the stored image in GB.
    #[serde(default)]
    pub image_size: Option<f64>,
    #[serde(default)]
    pub labels: Labels,
}

impl Image {
    /// Display name of the image: its name, or the description for unnamed snapshots.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    pub id: u64,
    pub name: String,
    /// Size in GB.
    pub size: u64,
    pub location: Location,
    #[serde(default)]
    pub labels: Labels,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    #[serde(default)]
    pub next_page: Option<u64>,
    #[serde(default)]
    pub last_page: Option<u64>,
    #[serde(default)]
    pub total_entries: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// HCloud error envelope: `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
