//! Connection resolver - fetch metadata for an institution's connection

use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::{Connection, Institution};
use crate::ports::AggregatorApi;
use crate::services::CredentialManager;

pub struct ConnectionResolver {
    api: Arc<dyn AggregatorApi>,
    credentials: Arc<CredentialManager>,
}

impl ConnectionResolver {
    pub fn new(api: Arc<dyn AggregatorApi>, credentials: Arc<CredentialManager>) -> Self {
        Self { api, credentials }
    }

    /// Resolve the institution's connection, if it has one
    ///
    /// Institutions without a connection identifier resolve to `None`
    /// without calling the aggregator.
    pub fn resolve(&self, institution: &Institution) -> Result<Option<Connection>> {
        let Some(connection_id) = institution.connection_id() else {
            tracing::debug!(institution = %institution.name, "no connection to resolve");
            return Ok(None);
        };

        let credential = self.credentials.ensure_valid()?;
        let connection = self.api.get_connection(&credential, connection_id)?;
        tracing::debug!(
            institution = %institution.name,
            status = %connection.status,
            "resolved connection"
        );
        Ok(Some(connection))
    }
}
