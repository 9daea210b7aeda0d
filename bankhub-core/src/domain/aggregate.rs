//! Aggregate result handed to the storage collaborator
//!
//! One `AggregateResult` is produced per pipeline run. It holds an ordered
//! list of institution records, each carrying whatever the pipeline managed
//! to fetch for it: partial data is expected and kept as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Account, Connection, Institution, Transaction};

/// Pipeline stage reached by an institution
///
/// Stages are ordered; a record only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pending,
    CatalogFiltered,
    ConnectionResolved,
    AccountsEnumerated,
    TransactionsFetched,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Pending => "pending",
            Stage::CatalogFiltered => "catalog_filtered",
            Stage::ConnectionResolved => "connection_resolved",
            Stage::AccountsEnumerated => "accounts_enumerated",
            Stage::TransactionsFetched => "transactions_fetched",
            Stage::Done => "done",
        }
    }
}

/// A stage that failed for one institution, abandoning its remaining stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedStage {
    pub stage: Stage,
    pub reason: String,
}

/// Everything fetched for one institution during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionRecord {
    pub institution: Institution,
    pub connection: Option<Connection>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub stage: Stage,
    pub skipped: Option<SkippedStage>,
    /// Data-shape problems that were resolved with defaults
    pub warnings: Vec<String>,
}

impl InstitutionRecord {
    /// Records start right after catalog filtering
    pub fn new(institution: Institution) -> Self {
        Self {
            institution,
            connection: None,
            accounts: Vec::new(),
            transactions: Vec::new(),
            stage: Stage::CatalogFiltered,
            skipped: None,
            warnings: Vec::new(),
        }
    }

    /// Move forward to `stage`; moving backwards is ignored
    pub fn advance(&mut self, stage: Stage) {
        if stage > self.stage {
            self.stage = stage;
        }
    }

    /// Record a failed stage and terminate this record
    pub fn skip(&mut self, stage: Stage, reason: impl Into<String>) {
        self.skipped = Some(SkippedStage {
            stage,
            reason: reason.into(),
        });
        self.stage = Stage::Done;
    }

    pub fn finish(&mut self) {
        self.stage = Stage::Done;
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Accounts accumulate across calls within a run
    pub fn append_accounts(&mut self, accounts: Vec<Account>) {
        self.accounts.extend(accounts);
    }

    /// Each fetch replaces the previous transaction list
    pub fn replace_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
    }

    /// Account whose history is fetched: the first one enumerated
    pub fn primary_account_id(&self) -> Option<&str> {
        self.accounts
            .first()
            .map(|a| a.id.trim())
            .filter(|id| !id.is_empty())
    }

    pub fn add_warnings(&mut self, warnings: impl IntoIterator<Item = String>) {
        self.warnings.extend(warnings);
    }
}

/// Output of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub institutions: Vec<InstitutionRecord>,
}

/// Counts over an aggregate, for reporting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateSummary {
    pub institutions: usize,
    pub connections: usize,
    pub accounts: usize,
    pub transactions: usize,
    pub skipped: usize,
    pub warnings: usize,
}

impl AggregateResult {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: None,
            institutions: Vec::new(),
        }
    }

    pub fn summary(&self) -> AggregateSummary {
        self.institutions
            .iter()
            .fold(AggregateSummary::default(), |mut acc, record| {
                acc.institutions += 1;
                acc.connections += usize::from(record.connection.is_some());
                acc.accounts += record.accounts.len();
                acc.transactions += record.transactions.len();
                acc.skipped += usize::from(record.skipped.is_some());
                acc.warnings += record.warnings.len();
                acc
            })
    }

    pub fn find(&self, institution_name: &str) -> Option<&InstitutionRecord> {
        self.institutions
            .iter()
            .find(|r| r.institution.name == institution_name)
    }
}
