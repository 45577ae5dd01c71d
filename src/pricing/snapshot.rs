//! Parsed, immutable copy of the HCloud price catalog.

use chrono::{DateTime, Utc};

use super::lookup::pricing_per_hour;
use crate::hcloud::error::{ApiError, Result};
use crate::hcloud::models::{LocationPrice, PriceAmount, Pricing};

/// Hourly and monthly gross price.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Price {
    pub hourly: f64,
    pub monthly: f64,
}

impl Price {
    pub const ZERO: Price = Price {
        hourly: 0.0,
        monthly: 0.0,
    };

    /// Price derived from a monthly figure.
    pub fn from_monthly(monthly: f64) -> Self {
        Self {
            hourly: pricing_per_hour(monthly),
            monthly,
        }
    }
}

/// Price of one (variant, location) pair of a resource kind.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceEntry {
    pub variant: String,
    pub location: String,
    pub price: Price,
}

/// Point-in-time copy of the full price catalog, gross prices only.
#[derive(Debug, Clone)]
pub struct PriceSnapshot {
    pub currency: String,
    pub fetched_at: DateTime<Utc>,
    pub floating_ips: Vec<PriceEntry>,
    pub primary_ips: Vec<PriceEntry>,
    pub server_types: Vec<PriceEntry>,
    pub load_balancer_types: Vec<PriceEntry>,
    pub traffic_per_tb: f64,
    pub image_per_gb_month: f64,
    pub volume_per_gb_month: f64,
    pub server_backup_percentage: f64,
}

impl PriceSnapshot {
    /// Builds a snapshot from one catalog response.
    ///
    /// Fails on the first price string that is not a decimal number.
    pub fn from_pricing(pricing: Pricing) -> Result<Self> {
        let mut floating_ips = Vec::new();
        for by_type in &pricing.floating_ips {
            for p in &by_type.prices {
                let monthly = parse_amount("floating_ips.price_monthly", &p.price_monthly)?;
                floating_ips.push(PriceEntry {
                    variant: by_type.ip_type.clone(),
                    location: p.location.clone(),
                    price: Price::from_monthly(monthly),
                });
            }
        }

        let mut primary_ips = Vec::new();
        for by_type in &pricing.primary_ips {
            for p in &by_type.prices {
                primary_ips.push(entry("primary_ips", &by_type.ip_type, p)?);
            }
        }

        let mut server_types = Vec::new();
        for by_name in &pricing.server_types {
            for p in &by_name.prices {
                server_types.push(entry("server_types", &by_name.name, p)?);
            }
        }

        let mut load_balancer_types = Vec::new();
        for by_name in &pricing.load_balancer_types {
            for p in &by_name.prices {
                load_balancer_types.push(entry("load_balancer_types", &by_name.name, p)?);
            }
        }

        Ok(Self {
            currency: pricing.currency.clone(),
            fetched_at: Utc::now(),
            floating_ips,
            primary_ips,
            server_types,
            load_balancer_types,
            traffic_per_tb: parse_amount("traffic.price_per_tb", &pricing.traffic.price_per_tb)?,
            image_per_gb_month: parse_amount(
                "image.price_per_gb_month",
                &pricing.image.price_per_gb_month,
            )?,
            volume_per_gb_month: parse_amount(
                "volume.price_per_gb_month",
                &pricing.volume.price_per_gb_month,
            )?,
            server_backup_percentage: parse_decimal(
                "server_backup.percentage",
                &pricing.server_backup.percentage,
            )?,
        })
    }
}

fn entry(field: &str, variant: &str, p: &LocationPrice) -> Result<PriceEntry> {
    Ok(PriceEntry {
        variant: variant.to_string(),
        location: p.location.clone(),
        price: Price {
            hourly: parse_amount(field, &p.price_hourly)?,
            monthly: parse_amount(field, &p.price_monthly)?,
        },
    })
}

fn parse_amount(field: &str, amount: &PriceAmount) -> Result<f64> {
    parse_decimal(field, &amount.gross)
}

fn parse_decimal(field: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::InvalidPrice {
            field: field.to_string(),
            value: raw.to_string(),
        })
}
