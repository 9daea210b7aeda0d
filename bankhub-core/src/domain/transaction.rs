//! Transaction domain model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single transaction pulled from an account's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Aggregator transaction ID
    pub id: String,
    /// "DEBIT" or "CREDIT"
    pub transaction_type: String,
    pub amount: Decimal,
    pub currency_code: String,
    pub description: Option<String>,
    /// None when the aggregator sent no parsable date
    pub transaction_date: Option<NaiveDate>,
    /// Aggregator account the transaction belongs to
    pub account_id: String,
    /// Owning institution, set once the transaction is attached to one
    pub institution_id: Option<String>,
}

impl Transaction {
    /// Create a new transaction with required fields
    pub fn new(id: impl Into<String>, account_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: id.into(),
            transaction_type: String::new(),
            amount,
            currency_code: String::new(),
            description: None,
            transaction_date: None,
            account_id: account_id.into(),
            institution_id: None,
        }
    }

    pub fn is_debit(&self) -> bool {
        self.transaction_type.eq_ignore_ascii_case("DEBIT")
    }
}
