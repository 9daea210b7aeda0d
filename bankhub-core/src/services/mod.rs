//! Service layer - aggregation stages and their orchestration
//!
//! Each stage is a small service sharing the aggregator port and the
//! credential manager. The pipeline sequences them per institution.

mod accounts;
mod catalog;
mod connection;
mod credential;
mod pipeline;
mod transactions;

pub use accounts::AccountEnumerator;
pub use catalog::CatalogService;
pub use connection::ConnectionResolver;
pub use credential::CredentialManager;
pub use pipeline::AggregationPipeline;
pub use transactions::{TransactionFetcher, TransactionWindow};
