//! Storage collaborator port

use crate::domain::result::Result;
use crate::domain::AggregateResult;

/// Receives one aggregate per run and persists it
///
/// Persistence is best-effort: the pipeline makes no assumption about
/// transactional behaviour of the sink.
pub trait AggregateSink: Send + Sync {
    /// Sink name (e.g., "json", "memory")
    fn name(&self) -> &str;

    /// Upsert the institutions, connections, accounts and transactions of `aggregate`
    fn store(&self, aggregate: &AggregateResult) -> Result<()>;
}
