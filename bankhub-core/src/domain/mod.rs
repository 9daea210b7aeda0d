//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
pub mod aggregate;
mod credential;
mod institution;
mod transaction;
pub mod result;

pub use account::{Account, AccountDetail};
pub use aggregate::{AggregateResult, AggregateSummary, InstitutionRecord, SkippedStage, Stage};
pub use credential::{Credential, DEFAULT_VALIDITY_MINUTES};
pub use institution::{Connection, Institution};
pub use transaction::Transaction;
