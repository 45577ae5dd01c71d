//! Pure price lookups over a [`PriceSnapshot`].
//!
//! Lookups match the exact (variant, location) pair. A missing pair is a
//! [`ExporterError::PriceNotFound`]; no fallback price is ever substituted.

use super::snapshot::{Price, PriceEntry, PriceSnapshot};
use crate::error::ExporterError;

/// Hours in the reference month used by HCloud (365 * 24 / 12).
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Bytes per terabyte as billed for traffic (2^40).
pub const SIZE_TB: u64 = 1 << 40;

/// Converts a monthly price to an hourly one.
pub fn pricing_per_hour(monthly: f64) -> f64 {
    monthly / HOURS_PER_MONTH
}

fn find<'a>(
    entries: &'a [PriceEntry],
    kind: &'static str,
    variant: &str,
    location: &str,
) -> Result<&'a PriceEntry, ExporterError> {
    entries
        .iter()
        .find(|e| e.variant == variant && e.location == location)
        .ok_or_else(|| ExporterError::PriceNotFound {
            kind,
            variant: variant.to_string(),
            location: location.to_string(),
        })
}

/// Monthly price of a floating IP of `ip_type` homed in `location`.
pub fn floating_ip(
    snapshot: &PriceSnapshot,
    ip_type: &str,
    location: &str,
) -> Result<f64, ExporterError> {
    find(&snapshot.floating_ips, "floating IP", ip_type, location).map(|e| e.price.monthly)
}

pub fn primary_ip(
    snapshot: &PriceSnapshot,
    ip_type: &str,
    location: &str,
) -> Result<Price, ExporterError> {
    find(&snapshot.primary_ips, "primary IP", ip_type, location).map(|e| e.price)
}

pub fn server_type(
    snapshot: &PriceSnapshot,
    name: &str,
    location: &str,
) -> Result<Price, ExporterError> {
    find(&snapshot.server_types, "server type", name, location).map(|e| e.price)
}

pub fn load_balancer_type(
    snapshot: &PriceSnapshot,
    name: &str,
    location: &str,
) -> Result<Price, ExporterError> {
    find(&snapshot.load_balancer_types, "load balancer type", name, location).map(|e| e.price)
}

/// Price of one TB of traffic beyond the included allowance.
pub fn traffic_per_tb(snapshot: &PriceSnapshot) -> f64 {
    snapshot.traffic_per_tb
}

/// Price of one GB of stored image per month.
pub fn image_per_gb_month(snapshot: &PriceSnapshot) -> f64 {
    snapshot.image_per_gb_month
}

pub fn volume_per_gb_month(snapshot: &PriceSnapshot) -> f64 {
    snapshot.volume_per_gb_month
}

/// Surcharge on the server price for enabled backups, in percent.
pub fn server_backup_percentage(snapshot: &PriceSnapshot) -> f64 {
    snapshot.server_backup_percentage
}

/// Monthly cost of traffic beyond the included allowance.
///
/// The overage is billed in whole terabytes, rounded up.
pub fn traffic_overage(outgoing_bytes: u64, included_bytes: u64, per_tb: f64) -> f64 {
    if outgoing_bytes <= included_bytes {
        return 0.0;
    }
    let excess = outgoing_bytes - included_bytes;
    let terabytes = excess.div_ceil(SIZE_TB);
    terabytes as f64 * per_tb
}

/// Backup surcharge for a server price.
pub fn backup_cost(server_price: f64, percentage: f64) -> f64 {
    if percentage <= 0.0 {
        return 0.0;
    }
    server_price * (percentage / 100.0)
}
