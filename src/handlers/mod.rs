//! HTTP endpoint handlers for the exporter.
//!
//! - `/metrics`: Prometheus metrics endpoint
//! - `/health`: Health check endpoint

pub mod health;
pub mod metrics;

// Re-export handlers
pub use health::health_handler;
pub use metrics::metrics_handler;
