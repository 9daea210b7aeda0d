//! Transaction fetcher - account history, whole or by date range

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::result::{Error, Result};
use crate::domain::{InstitutionRecord, Transaction};
use crate::ports::{AggregatorApi, TransactionQuery, MAX_PAGE_SIZE};
use crate::services::CredentialManager;

/// Which part of an account's history to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionWindow {
    #[default]
    All,
    /// Inclusive on both ends
    Range { from: NaiveDate, to: NaiveDate },
}

impl TransactionWindow {
    pub fn range(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(Error::validation(format!(
                "start date {} is after end date {}",
                from, to
            )));
        }
        Ok(Self::Range { from, to })
    }
}

pub struct TransactionFetcher {
    api: Arc<dyn AggregatorApi>,
    credentials: Arc<CredentialManager>,
    page_size: u32,
}

impl TransactionFetcher {
    pub fn new(
        api: Arc<dyn AggregatorApi>,
        credentials: Arc<CredentialManager>,
        page_size: u32,
    ) -> Self {
        Self {
            api,
            credentials,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Whole history of one account, as a single page
    pub fn fetch_all(&self, account_id: &str) -> Result<Vec<Transaction>> {
        self.fetch(TransactionQuery::all(account_id, self.page_size))
    }

    /// History of one account between two dates, inclusive
    pub fn fetch_range(
        &self,
        account_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        TransactionWindow::range(from, to)?;
        self.fetch(TransactionQuery::range(account_id, from, to, self.page_size))
    }

    pub fn fetch_window(
        &self,
        account_id: &str,
        window: TransactionWindow,
    ) -> Result<Vec<Transaction>> {
        match window {
            TransactionWindow::All => self.fetch_all(account_id),
            TransactionWindow::Range { from, to } => self.fetch_range(account_id, from, to),
        }
    }

    /// Fetch for the record's primary account and replace its transactions
    ///
    /// The replacement happens even when the result is empty. Fails with
    /// `Error::NoAccount` when the record has no usable account.
    pub fn fetch_into(
        &self,
        record: &mut InstitutionRecord,
        window: TransactionWindow,
    ) -> Result<usize> {
        let account_id = record
            .primary_account_id()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::NoAccount(format!(
                    "{} has no account to fetch transactions for",
                    record.institution.name
                ))
            })?;

        let mut transactions = self.fetch_window(&account_id, window)?;
        for tx in &mut transactions {
            tx.institution_id = Some(record.institution.id.clone());
        }

        let count = transactions.len();
        record.replace_transactions(transactions);
        tracing::info!(
            institution = %record.institution.name,
            transactions = count,
            "fetched transactions"
        );
        Ok(count)
    }

    pub fn fetch_all_into(&self, record: &mut InstitutionRecord) -> Result<usize> {
        self.fetch_into(record, TransactionWindow::All)
    }

    pub fn fetch_range_into(
        &self,
        record: &mut InstitutionRecord,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<usize> {
        self.fetch_into(record, TransactionWindow::range(from, to)?)
    }

    /// Look up one transaction by identifier
    pub fn get(&self, transaction_id: &str) -> Result<Transaction> {
        if transaction_id.trim().is_empty() {
            return Err(Error::validation("transaction id cannot be empty"));
        }
        let credential = self.credentials.ensure_valid()?;
        self.api.get_transaction(&credential, transaction_id.trim())
    }

    fn fetch(&self, query: TransactionQuery) -> Result<Vec<Transaction>> {
        if query.account_id.trim().is_empty() {
            return Err(Error::NoAccount("account id is empty".to_string()));
        }

        let credential = self.credentials.ensure_valid()?;
        let page = self.api.list_transactions(&credential, &query)?;
        for warning in &page.warnings {
            tracing::warn!("{}", warning);
        }
        if page.total == 0 {
            return Ok(Vec::new());
        }
        Ok(page.transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;

    use crate::adapters::demo::{DemoAggregator, DEMO_CLIENT_ID};
    use crate::config::ClientCredentials;
    use crate::domain::{Account, Institution};
    use crate::ports::SystemClock;

    fn fetcher(api: Arc<DemoAggregator>) -> TransactionFetcher {
        let credentials = Arc::new(CredentialManager::new(
            api.clone(),
            ClientCredentials {
                client_id: DEMO_CLIENT_ID.to_string(),
                client_secret: String::new(),
            },
            Arc::new(SystemClock),
            Duration::hours(2),
        ));
        TransactionFetcher::new(api, credentials, MAX_PAGE_SIZE)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(id: &str, on: NaiveDate) -> Transaction {
        let mut tx = Transaction::new(id, "acc-1", Decimal::new(-1000, 2));
        tx.transaction_date = Some(on);
        tx
    }

    fn record_with_account(id: &str) -> InstitutionRecord {
        let mut rec = InstitutionRecord::new(Institution::new("201", "Nubank"));
        rec.append_accounts(vec![Account::new(id, "Conta")]);
        rec
    }

    #[test]
    fn test_fetch_all() {
        let api = Arc::new(DemoAggregator::empty().with_transactions(
            "acc-1",
            vec![tx("t1", date(2024, 1, 1)), tx("t2", date(2024, 2, 1))],
        ));
        let txs = fetcher(api).fetch_all("acc-1").unwrap();
        assert_eq!(txs.len(), 2);
    }

    #[test]
    fn test_fetch_range_is_inclusive() {
        let api = Arc::new(DemoAggregator::empty().with_transactions(
            "acc-1",
            vec![
                tx("t1", date(2024, 1, 1)),
                tx("t2", date(2024, 1, 31)),
                tx("t3", date(2024, 2, 1)),
            ],
        ));
        let txs = fetcher(api)
            .fetch_range("acc-1", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        let ids: Vec<&str> = txs.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[test]
    fn test_inverted_range_rejected_before_any_call() {
        let api = Arc::new(DemoAggregator::empty());
        let err = fetcher(api.clone())
            .fetch_range("acc-1", date(2024, 2, 1), date(2024, 1, 1))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_fetch_into_replaces() {
        let api = Arc::new(
            DemoAggregator::empty().with_transactions(
                "acc-1",
                vec![tx("t1", date(2024, 1, 1)), tx("t2", date(2024, 1, 2))],
            ),
        );
        let svc = fetcher(api.clone());
        let mut rec = record_with_account("acc-1");

        assert_eq!(svc.fetch_all_into(&mut rec).unwrap(), 2);
        api.set_transactions("acc-1", vec![tx("t9", date(2024, 3, 1))]);
        assert_eq!(svc.fetch_all_into(&mut rec).unwrap(), 1);

        assert_eq!(rec.transactions.len(), 1);
        assert_eq!(rec.transactions[0].id, "t9");
        assert_eq!(rec.transactions[0].institution_id.as_deref(), Some("201"));
    }

    #[test]
    fn test_empty_result_clears_previous() {
        let api = Arc::new(
            DemoAggregator::empty().with_transactions("acc-1", vec![tx("t1", date(2024, 1, 1))]),
        );
        let svc = fetcher(api.clone());
        let mut rec = record_with_account("acc-1");
        svc.fetch_all_into(&mut rec).unwrap();

        api.set_transactions("acc-1", Vec::new());
        assert_eq!(svc.fetch_all_into(&mut rec).unwrap(), 0);
        assert!(rec.transactions.is_empty());
    }

    #[test]
    fn test_zero_total_yields_nothing() {
        let api = Arc::new(
            DemoAggregator::empty()
                .with_transactions("acc-1", vec![tx("t1", date(2024, 1, 1))])
                .reporting_zero_totals(),
        );
        assert!(fetcher(api).fetch_all("acc-1").unwrap().is_empty());
    }

    #[test]
    fn test_no_account_is_reported() {
        let api = Arc::new(DemoAggregator::empty());
        let svc = fetcher(api.clone());

        let mut rec = InstitutionRecord::new(Institution::new("201", "Nubank"));
        assert!(matches!(svc.fetch_all_into(&mut rec), Err(Error::NoAccount(_))));

        let mut rec = record_with_account("");
        assert!(matches!(svc.fetch_all_into(&mut rec), Err(Error::NoAccount(_))));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_range_uses_primary_account() {
        let api = Arc::new(
            DemoAggregator::empty()
                .with_transactions("acc-1", vec![tx("t1", date(2024, 1, 10))])
                .with_transactions("acc-2", vec![tx("t2", date(2024, 1, 10))]),
        );
        let mut rec = record_with_account("acc-1");
        rec.append_accounts(vec![Account::new("acc-2", "Cartão")]);

        fetcher(api.clone())
            .fetch_range_into(&mut rec, date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        assert_eq!(rec.transactions[0].id, "t1");
        assert_eq!(api.count_calls("transactions:"), 1);
    }

    #[test]
    fn test_get_transaction() {
        let api = Arc::new(
            DemoAggregator::empty().with_transactions("acc-1", vec![tx("t1", date(2024, 1, 1))]),
        );
        let svc = fetcher(api);
        assert_eq!(svc.get("t1").unwrap().id, "t1");
        assert!(matches!(svc.get(" "), Err(Error::Validation(_))));
        assert!(matches!(svc.get("nope"), Err(Error::Upstream(_))));
    }
}
