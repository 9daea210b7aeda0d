//! Catalog service - supported institutions and their known connections

use std::sync::Arc;

use crate::config::Config;
use crate::domain::result::Result;
use crate::domain::Institution;
use crate::ports::AggregatorApi;
use crate::services::CredentialManager;

pub struct CatalogService {
    api: Arc<dyn AggregatorApi>,
    credentials: Arc<CredentialManager>,
    config: Config,
}

impl CatalogService {
    pub fn new(
        api: Arc<dyn AggregatorApi>,
        credentials: Arc<CredentialManager>,
        config: &Config,
    ) -> Self {
        Self {
            api,
            credentials,
            config: config.clone(),
        }
    }

    /// Supported institutions, in the order the aggregator returned them
    ///
    /// Pinned connection identifiers are attached here. Every other
    /// institution starts without a connection, whatever the aggregator
    /// reported.
    pub fn list_institutions(&self) -> Result<Vec<Institution>> {
        let credential = self.credentials.ensure_valid()?;
        let catalog = self.api.list_institutions(&credential)?;
        let total = catalog.len();

        let supported: Vec<Institution> = catalog
            .into_iter()
            .filter(|inst| self.config.is_supported(&inst.name))
            .map(|mut inst| {
                inst.connection_id = self
                    .config
                    .pinned_connection(&inst.name)
                    .map(str::to_string);
                inst
            })
            .collect();

        tracing::info!(
            catalog = total,
            supported = supported.len(),
            "filtered institution catalog"
        );
        Ok(supported)
    }
}
