//! Bankhub Core - Open-banking aggregation client
//!
//! This crate implements the aggregation client following hexagonal architecture:
//!
//! - **domain**: Core entities (Institution, Account, Transaction, AggregateResult)
//! - **ports**: Trait definitions for external dependencies (AggregatorApi, AggregateSink, Clock)
//! - **services**: Credential management and the staged aggregation pipeline
//! - **adapters**: Concrete implementations (Pluggy, JSON snapshots, demo data)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use adapters::demo::{DemoAggregator, DEMO_CLIENT_ID};
use adapters::json_sink::JsonSnapshotSink;
use adapters::pluggy::PluggyClient;
use config::{ClientCredentials, Config};
use ports::{AggregatorApi, Clock, SystemClock};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{
    Account, AccountDetail, AggregateResult, AggregateSummary, Connection, Institution,
    InstitutionRecord, SkippedStage, Stage, Transaction,
};
pub use services::TransactionWindow;

const SNAPSHOT_DIR: &str = "snapshots";

/// Main context for Bankhub operations
///
/// Holds the configuration, the aggregator client, and every service,
/// all sharing one credential manager.
pub struct BankHubContext {
    pub config: Config,
    pub api: Arc<dyn AggregatorApi>,
    pub credentials: Arc<CredentialManager>,
    pub catalog: Arc<CatalogService>,
    pub resolver: Arc<ConnectionResolver>,
    pub accounts: Arc<AccountEnumerator>,
    pub transactions: Arc<TransactionFetcher>,
    pub pipeline: AggregationPipeline,
    pub snapshots: JsonSnapshotSink,
}

impl BankHubContext {
    /// Create a context from the settings in `bankhub_dir`
    pub fn new(bankhub_dir: &Path) -> Result<Self> {
        let config = Config::load(bankhub_dir)?;
        config.validate()?;

        let api: Arc<dyn AggregatorApi> = if config.demo_mode {
            Arc::new(DemoAggregator::new())
        } else {
            let client = PluggyClient::from_config(&config)
                .map_err(|e| Error::config(format!("{:#}", e)))?;
            Arc::new(client)
        };

        let mut context = Self::with_api(config, api, Arc::new(SystemClock))?;
        context.snapshots = JsonSnapshotSink::new(bankhub_dir.join(SNAPSHOT_DIR));
        Ok(context)
    }

    /// Create a context around an existing aggregator client
    ///
    /// Snapshots default to a `snapshots` directory relative to the
    /// working directory.
    pub fn with_api(
        config: Config,
        api: Arc<dyn AggregatorApi>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let client = if config.demo_mode {
            ClientCredentials {
                client_id: DEMO_CLIENT_ID.to_string(),
                client_secret: String::new(),
            }
        } else {
            config.client_credentials()?
        };

        let credentials = Arc::new(CredentialManager::new(
            Arc::clone(&api),
            client,
            Arc::clone(&clock),
            config.credential_ttl()?,
        ));
        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&api),
            Arc::clone(&credentials),
            &config,
        ));
        let resolver = Arc::new(ConnectionResolver::new(
            Arc::clone(&api),
            Arc::clone(&credentials),
        ));
        let accounts = Arc::new(AccountEnumerator::new(
            Arc::clone(&api),
            Arc::clone(&credentials),
        ));
        let transactions = Arc::new(TransactionFetcher::new(
            Arc::clone(&api),
            Arc::clone(&credentials),
            config.page_size,
        ));
        let pipeline = AggregationPipeline::new(
            clock,
            Arc::clone(&catalog),
            Arc::clone(&resolver),
            Arc::clone(&accounts),
            Arc::clone(&transactions),
        );

        Ok(Self {
            config,
            api,
            credentials,
            catalog,
            resolver,
            accounts,
            transactions,
            pipeline,
            snapshots: JsonSnapshotSink::new(SNAPSHOT_DIR),
        })
    }
}
