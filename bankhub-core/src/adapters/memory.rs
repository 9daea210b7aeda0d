//! In-memory storage, used for dry runs and tests

use std::sync::Mutex;

use crate::domain::result::{Error, Result};
use crate::domain::AggregateResult;
use crate::ports::AggregateSink;

#[derive(Debug, Default)]
pub struct MemorySink {
    stored: Mutex<Vec<AggregateResult>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything stored so far, oldest first
    pub fn stored(&self) -> Vec<AggregateResult> {
        self.stored.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.stored.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AggregateSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn store(&self, aggregate: &AggregateResult) -> Result<()> {
        let mut stored = self
            .stored
            .lock()
            .map_err(|e| Error::Storage(format!("Lock poisoned: {}", e)))?;
        stored.push(aggregate.clone());
        Ok(())
    }
}
