//! Aggregation pipeline - runs every stage for every supported institution
//!
//! Institutions are processed one at a time, in catalog order. The catalog
//! stage runs once per run and its failure aborts the run. Failures inside
//! an institution's stages are recorded on that institution's record and
//! the run moves on; only fatal errors (authentication, local I/O) abort.

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{AggregateResult, InstitutionRecord, Stage};
use crate::ports::{AggregateSink, Clock};
use crate::services::{
    AccountEnumerator, CatalogService, ConnectionResolver, TransactionFetcher, TransactionWindow,
};

pub struct AggregationPipeline {
    clock: Arc<dyn Clock>,
    catalog: Arc<CatalogService>,
    resolver: Arc<ConnectionResolver>,
    accounts: Arc<AccountEnumerator>,
    transactions: Arc<TransactionFetcher>,
}

impl AggregationPipeline {
    pub fn new(
        clock: Arc<dyn Clock>,
        catalog: Arc<CatalogService>,
        resolver: Arc<ConnectionResolver>,
        accounts: Arc<AccountEnumerator>,
        transactions: Arc<TransactionFetcher>,
    ) -> Self {
        Self {
            clock,
            catalog,
            resolver,
            accounts,
            transactions,
        }
    }

    /// Run every stage and assemble the aggregate
    pub fn run(&self, window: TransactionWindow) -> Result<AggregateResult> {
        let mut aggregate = AggregateResult::new(self.clock.now());
        tracing::info!(run_id = %aggregate.run_id, "starting aggregation run");

        let institutions = self.catalog.list_institutions()?;

        for institution in institutions {
            let mut record = InstitutionRecord::new(institution);
            self.process(&mut record, window)?;
            aggregate.institutions.push(record);
        }

        aggregate.finished_at = Some(self.clock.now());
        let summary = aggregate.summary();
        tracing::info!(
            run_id = %aggregate.run_id,
            institutions = summary.institutions,
            accounts = summary.accounts,
            transactions = summary.transactions,
            skipped = summary.skipped,
            "aggregation run finished"
        );
        Ok(aggregate)
    }

    /// Run, then hand the aggregate to `sink`
    pub fn run_and_store(
        &self,
        window: TransactionWindow,
        sink: &dyn AggregateSink,
    ) -> Result<AggregateResult> {
        let aggregate = self.run(window)?;
        sink.store(&aggregate)?;
        tracing::debug!(sink = sink.name(), run_id = %aggregate.run_id, "aggregate stored");
        Ok(aggregate)
    }

    fn process(&self, record: &mut InstitutionRecord, window: TransactionWindow) -> Result<()> {
        if !record.institution.has_connection() {
            tracing::info!(
                institution = %record.institution.name,
                "no connection, skipping stages"
            );
            record.finish();
            return Ok(());
        }

        match self.resolver.resolve(&record.institution) {
            Ok(connection) => {
                record.connection = connection;
                record.advance(Stage::ConnectionResolved);
            }
            Err(e) => return Self::skip(record, Stage::ConnectionResolved, e),
        }

        match self.accounts.enumerate_into(record) {
            Ok(_) => record.advance(Stage::AccountsEnumerated),
            Err(e) => return Self::skip(record, Stage::AccountsEnumerated, e),
        }

        match self.transactions.fetch_into(record, window) {
            Ok(_) => record.advance(Stage::TransactionsFetched),
            Err(e) => return Self::skip(record, Stage::TransactionsFetched, e),
        }

        record.finish();
        Ok(())
    }

    /// Record a failed stage, or propagate if the error is fatal
    fn skip(record: &mut InstitutionRecord, stage: Stage, error: Error) -> Result<()> {
        if error.is_fatal() {
            return Err(error);
        }
        tracing::warn!(
            institution = %record.institution.name,
            stage = stage.as_str(),
            error = %error,
            "skipping remaining stages"
        );
        record.skip(stage, error.to_string());
        Ok(())
    }
}
