//! Access to the Hetzner Cloud API.
//!
//! The rest of the crate only depends on the [`PricingSource`] and
//! [`CloudApi`] capabilities; [`HcloudClient`] is the production
//! implementation of both.

pub mod client;
pub mod error;
pub mod models;

use async_trait::async_trait;

pub use client::HcloudClient;
pub use error::ApiError;

use models::{FloatingIp, Image, LoadBalancer, PrimaryIp, Pricing, Server, Volume};

/// Source of the provider's full price catalog.
#[async_trait]
pub trait PricingSource: Send + Sync {
    async fn fetch_pricing(&self) -> error::Result<Pricing>;
}

/// Read-only resource inventory, one listing call per resource kind.
#[async_trait]
pub trait CloudApi: Send + Sync {
    async fn list_floating_ips(&self) -> error::Result<Vec<FloatingIp>>;

    async fn list_primary_ips(&self) -> error::Result<Vec<PrimaryIp>>;

    async fn list_servers(&self) -> error::Result<Vec<Server>>;

    async fn list_load_balancers(&self) -> error::Result<Vec<LoadBalancer>>;

    /// Lists images of type `snapshot` only.
    async fn list_snapshots(&self) -> error::Result<Vec<Image>>;

    async fn list_volumes(&self) -> error::Result<Vec<Volume>>;
}
