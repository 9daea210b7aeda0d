//! Demo aggregator
//!
//! Serves a fixed Brazilian banking catalog from memory so the pipeline can
//! run without aggregator credentials. Every call is logged by key
//! (`auth`, `institutions`, `connection:<id>`, `accounts:<id>`,
//! `transactions:<account id>`, `transaction:<id>`) and any key can be
//! scripted to fail.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::config::{ClientCredentials, DEFAULT_PINNED_CONNECTION};
use crate::domain::result::{Error, Result};
use crate::domain::{Account, AccountDetail, Connection, Credential, Institution, Transaction};
use crate::ports::{AccountsPage, AggregatorApi, TransactionQuery, TransactionsPage};

pub const DEMO_CLIENT_ID: &str = "demo-client";
pub const DEMO_CHECKING_ACCOUNT: &str = "demo-nu-checking";
pub const DEMO_CREDIT_ACCOUNT: &str = "demo-nu-credit";

#[derive(Debug, Default)]
struct DemoData {
    institutions: Vec<Institution>,
    connections: HashMap<String, Connection>,
    accounts: HashMap<String, Vec<Account>>,
    transactions: HashMap<String, Vec<Transaction>>,
    failing: HashSet<String>,
    zero_totals: bool,
}

/// In-memory `AggregatorApi`
#[derive(Debug, Default)]
pub struct DemoAggregator {
    data: Mutex<DemoData>,
    calls: Mutex<Vec<String>>,
    token_seq: AtomicUsize,
}

impl DemoAggregator {
    /// Aggregator that knows nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Aggregator preloaded with the demo catalog
    pub fn new() -> Self {
        let nubank_connection = DEFAULT_PINNED_CONNECTION.1;

        let mut connection = Connection::new(nubank_connection);
        connection.products = vec!["ACCOUNTS".to_string(), "TRANSACTIONS".to_string()];
        connection.status = "UPDATED".to_string();
        connection.execution_status = "SUCCESS".to_string();
        connection.created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single();

        Self::empty()
            .with_institution(demo_institution("201", "Nubank"))
            .with_institution(demo_institution("202", "Inter"))
            .with_institution(demo_institution("999", "Banco Exemplo"))
            .with_institution(demo_institution("203", "PicPay"))
            .with_connection(connection)
            .with_accounts(nubank_connection, demo_accounts())
            .with_transactions(DEMO_CHECKING_ACCOUNT, demo_transactions())
    }

    pub fn with_institution(self, institution: Institution) -> Self {
        self.update(|d| d.institutions.push(institution));
        self
    }

    pub fn with_connection(self, connection: Connection) -> Self {
        self.update(|d| {
            d.connections.insert(connection.id.clone(), connection);
        });
        self
    }

    /// Accounts are appended to whatever the connection already has
    pub fn with_accounts(self, connection_id: &str, accounts: Vec<Account>) -> Self {
        self.update(|d| {
            d.accounts
                .entry(connection_id.to_string())
                .or_default()
                .extend(accounts)
        });
        self
    }

    pub fn with_transactions(self, account_id: &str, transactions: Vec<Transaction>) -> Self {
        self.set_transactions(account_id, transactions);
        self
    }

    /// Make every call with this key fail
    pub fn failing(self, call_key: &str) -> Self {
        self.update(|d| {
            d.failing.insert(call_key.to_string());
        });
        self
    }

    /// Report a zero total on every list call, regardless of contents
    pub fn reporting_zero_totals(self) -> Self {
        self.update(|d| d.zero_totals = true);
        self
    }

    /// Replace the history served for an account
    pub fn set_transactions(&self, account_id: &str, transactions: Vec<Transaction>) {
        self.update(|d| {
            d.transactions.insert(account_id.to_string(), transactions);
        });
    }

    /// Every call key seen so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls whose key starts with `prefix`
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn token_exchanges(&self) -> usize {
        self.token_seq.load(Ordering::SeqCst)
    }

    fn update(&self, f: impl FnOnce(&mut DemoData)) {
        if let Ok(mut data) = self.data.lock() {
            f(&mut data);
        }
    }

    /// Log the call, then fail it if scripted to
    fn enter(&self, key: String) -> Result<MutexGuard<'_, DemoData>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(key.clone());
        }
        let data = self
            .data
            .lock()
            .map_err(|e| Error::Other(format!("Lock poisoned: {}", e)))?;
        if data.failing.contains(&key) {
            return Err(if key == "auth" {
                Error::auth("demo credentials rejected")
            } else {
                Error::upstream(format!("{}: HTTP 500", key))
            });
        }
        Ok(data)
    }

    fn check_token(credential: &Credential) -> Result<()> {
        if credential.token().starts_with("demo-token-") {
            Ok(())
        } else {
            Err(Error::upstream("authentication failed"))
        }
    }
}

impl AggregatorApi for DemoAggregator {
    fn name(&self) -> &str {
        "demo"
    }

    fn exchange_token(&self, credentials: &ClientCredentials) -> Result<String> {
        let _data = self.enter("auth".to_string())?;
        if credentials.client_id.trim().is_empty() {
            return Err(Error::auth("client id is empty"));
        }
        let seq = self.token_seq.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("demo-token-{}", seq))
    }

    fn list_institutions(&self, credential: &Credential) -> Result<Vec<Institution>> {
        let data = self.enter("institutions".to_string())?;
        Self::check_token(credential)?;
        Ok(data.institutions.clone())
    }

    fn get_connection(&self, credential: &Credential, connection_id: &str) -> Result<Connection> {
        let data = self.enter(format!("connection:{}", connection_id))?;
        Self::check_token(credential)?;
        data.connections
            .get(connection_id)
            .cloned()
            .ok_or_else(|| {
                Error::upstream(format!("connection {} not found: HTTP 404", connection_id))
            })
    }

    fn list_accounts(&self, credential: &Credential, connection_id: &str) -> Result<AccountsPage> {
        let data = self.enter(format!("accounts:{}", connection_id))?;
        Self::check_token(credential)?;
        let accounts = data.accounts.get(connection_id).cloned().unwrap_or_default();
        Ok(AccountsPage {
            total: if data.zero_totals { 0 } else { accounts.len() as i64 },
            accounts,
            warnings: Vec::new(),
        })
    }

    fn list_transactions(
        &self,
        credential: &Credential,
        query: &TransactionQuery,
    ) -> Result<TransactionsPage> {
        let data = self.enter(format!("transactions:{}", query.account_id))?;
        Self::check_token(credential)?;
        let in_window = |date: Option<NaiveDate>| match (query.from, query.to, date) {
            (None, None, _) => true,
            (_, _, None) => false,
            (from, to, Some(d)) => from.map_or(true, |f| d >= f) && to.map_or(true, |t| d <= t),
        };
        let matching: Vec<Transaction> = data
            .transactions
            .get(&query.account_id)
            .map(|txs| {
                txs.iter()
                    .filter(|tx| in_window(tx.transaction_date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let total = if data.zero_totals { 0 } else { matching.len() as i64 };
        Ok(TransactionsPage {
            total,
            transactions: matching.into_iter().take(query.page_size as usize).collect(),
            warnings: Vec::new(),
        })
    }

    fn get_transaction(
        &self,
        credential: &Credential,
        transaction_id: &str,
    ) -> Result<Transaction> {
        let data = self.enter(format!("transaction:{}", transaction_id))?;
        Self::check_token(credential)?;
        data.transactions
            .values()
            .flatten()
            .find(|tx| tx.id == transaction_id)
            .cloned()
            .ok_or_else(|| {
                Error::upstream(format!("transaction {} not found: HTTP 404", transaction_id))
            })
    }
}

fn demo_institution(id: &str, name: &str) -> Institution {
    let mut institution = Institution::new(id, name);
    institution.health_status = "ONLINE".to_string();
    institution
}

fn demo_accounts() -> Vec<Account> {
    let mut checking = Account::new(DEMO_CHECKING_ACCOUNT, "Conta Corrente");
    checking.account_type = "BANK".to_string();
    checking.balance = Decimal::new(482347, 2);
    checking.owner = Some("Demo Customer".to_string());
    checking.detail = AccountDetail {
        transfer_number: "0001/12345678-9".to_string(),
        closing_balance: Decimal::new(482347, 2),
        automatically_invested_balance: Decimal::new(150000, 2),
        overdraft_contracted_limit: Decimal::new(100000, 2),
        ..AccountDetail::default()
    };

    // Credit accounts carry no bank data
    let mut credit = Account::new(DEMO_CREDIT_ACCOUNT, "Cartão de Crédito");
    credit.account_type = "CREDIT".to_string();
    credit.balance = Decimal::new(-128763, 2);

    vec![checking, credit]
}

fn demo_transactions() -> Vec<Transaction> {
    let entries: [(&str, &str, i64, (i32, u32, u32), &str); 6] = [
        ("demo-tx-1", "CREDIT", 850000, (2024, 3, 5), "Salário"),
        ("demo-tx-2", "DEBIT", -18990, (2024, 3, 7), "Supermercado"),
        ("demo-tx-3", "DEBIT", -4500, (2024, 3, 9), "Uber"),
        ("demo-tx-4", "DEBIT", -220000, (2024, 3, 10), "Aluguel"),
        ("demo-tx-5", "CREDIT", 12000, (2024, 3, 15), "Pix recebido"),
        ("demo-tx-6", "DEBIT", -7990, (2024, 4, 2), "Farmácia"),
    ];

    entries
        .iter()
        .map(|(id, kind, cents, (y, m, d), description)| {
            let mut tx = Transaction::new(*id, DEMO_CHECKING_ACCOUNT, Decimal::new(*cents, 2));
            tx.transaction_type = kind.to_string();
            tx.description = Some(description.to_string());
            tx.transaction_date = NaiveDate::from_ymd_opt(*y, *m, *d);
            tx
        })
        .collect()
}
