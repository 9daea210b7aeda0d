//! Aggregator API port
//!
//! Defines the interface for talking to the open-banking aggregator.
//! Implementations decode responses at the boundary and hand back domain
//! types; nothing downstream sees raw JSON.

use chrono::NaiveDate;

use crate::config::ClientCredentials;
use crate::domain::result::Result;
use crate::domain::{Account, Connection, Credential, Institution, Transaction};

/// Maximum page size accepted by the transactions endpoint
pub const MAX_PAGE_SIZE: u32 = 500;

/// Result of listing the accounts of one connection
#[derive(Debug, Default)]
pub struct AccountsPage {
    /// Total reported by the aggregator
    pub total: i64,
    pub accounts: Vec<Account>,
    pub warnings: Vec<String>,
}

/// Result of listing transactions for one account
#[derive(Debug, Default)]
pub struct TransactionsPage {
    /// Total reported by the aggregator
    pub total: i64,
    pub transactions: Vec<Transaction>,
    pub warnings: Vec<String>,
}

/// Query for the transactions endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    pub account_id: String,
    /// Inclusive lower bound
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound
    pub to: Option<NaiveDate>,
    pub page_size: u32,
}

impl TransactionQuery {
    /// Whole history, single page
    pub fn all(account_id: impl Into<String>, page_size: u32) -> Self {
        Self {
            account_id: account_id.into(),
            from: None,
            to: None,
            page_size: page_size.min(MAX_PAGE_SIZE),
        }
    }

    /// Inclusive date range, single page
    pub fn range(
        account_id: impl Into<String>,
        from: NaiveDate,
        to: NaiveDate,
        page_size: u32,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            from: Some(from),
            to: Some(to),
            page_size: page_size.min(MAX_PAGE_SIZE),
        }
    }
}

/// Aggregator API trait
///
/// Token exchange failures are reported as `Error::Auth`; every other
/// remote failure or unexpected response is `Error::Upstream`.
pub trait AggregatorApi: Send + Sync {
    /// Provider name (e.g., "pluggy")
    fn name(&self) -> &str;

    /// Exchange client credentials for an access token
    fn exchange_token(&self, credentials: &ClientCredentials) -> Result<String>;

    /// List every institution the aggregator knows, in response order
    fn list_institutions(&self, credential: &Credential) -> Result<Vec<Institution>>;

    /// Fetch connection metadata by identifier
    fn get_connection(&self, credential: &Credential, connection_id: &str) -> Result<Connection>;

    /// List the accounts of one connection
    fn list_accounts(&self, credential: &Credential, connection_id: &str) -> Result<AccountsPage>;

    /// List transactions for one account
    fn list_transactions(
        &self,
        credential: &Credential,
        query: &TransactionQuery,
    ) -> Result<TransactionsPage>;

    /// Fetch a single transaction by identifier
    fn get_transaction(&self, credential: &Credential, transaction_id: &str)
        -> Result<Transaction>;
}
