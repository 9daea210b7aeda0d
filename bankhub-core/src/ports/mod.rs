//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod aggregator;
mod clock;
mod storage;

pub use aggregator::{
    AccountsPage, AggregatorApi, TransactionQuery, TransactionsPage, MAX_PAGE_SIZE,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use storage::AggregateSink;
