use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{BaseFetcher, Fetcher};
use crate::error::ExporterError;
use crate::hcloud::CloudApi;
use crate::pricing::{lookup, Price, PriceCache};

const RESOURCE: &str = "server_backup";

/// Backup surcharge of servers with backups enabled.
///
/// Servers without a backup window are not billed for backups and are
/// recorded with a zero price.
pub struct ServerBackupFetcher {
    base: BaseFetcher,
}

impl ServerBackupFetcher {
    pub fn new(
        pricing: Arc<PriceCache>,
        additional_labels: Arc<[String]>,
    ) -> prometheus::Result<Self> {
        Ok(Self {
            base: BaseFetcher::new(pricing, RESOURCE, &["location", "type"], additional_labels)?,
        })
    }
}

#[async_trait]
impl Fetcher for ServerBackupFetcher {
    fn name(&self) -> &'static str {
        RESOURCE
    }

    fn base(&self) -> &BaseFetcher {
        &self.base
    }

    async fn run(&self, api: &dyn CloudApi) -> Result<(), ExporterError> {
        let servers = api
            .list_servers()
            .await
            .map_err(|e| ExporterError::list("servers", e))?;
        let snapshot = self.base.snapshot().await?;
        let percentage = lookup::server_backup_percentage(&snapshot);

        for server in &servers {
            let location = server.datacenter.location.name.as_str();
            let server_type = server.server_type.name.as_str();

            let backups_enabled = server
                .backup_window
                .as_deref()
                .is_some_and(|window| !window.is_empty());

            let price = if backups_enabled {
                let server_price = lookup::server_type(&snapshot, server_type, location)
                    .map_err(|e| e.for_resource("server backup", &server.name))?;
                Price {
                    hourly: lookup::backup_cost(server_price.hourly, percentage),
                    monthly: lookup::backup_cost(server_price.monthly, percentage),
                }
            } else {
                Price::ZERO
            };

            self.base
                .publish(&[&server.name, location, server_type], &server.labels, price);
        }

        debug!("Published backup pricing for {} servers", servers.len());
        Ok(())
    }
}
