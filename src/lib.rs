//! Prometheus exporter for the cost of Hetzner Cloud resources.
//!
//! Periodically lists the resources of a Hetzner Cloud project, prices every
//! instance against the provider's price catalog and exposes hourly and
//! monthly cost gauges. The catalog is fetched lazily, shared by all
//! fetchers through [`pricing::PriceCache`], and dropped on a fixed
//! interval so price changes are picked up.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exporter;
pub mod fetcher;
pub mod handlers;
pub mod hcloud;
pub mod metrics;
pub mod pricing;
pub mod scheduler;
pub mod state;

pub use error::{CycleError, ExporterError};
pub use exporter::Exporter;
