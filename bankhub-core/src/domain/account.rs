//! Account domain model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A bank account exposed through one connection
/// Note: account_type follows the aggregator's nomenclature, e.g. "BANK" or "CREDIT".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Aggregator account ID
    pub id: String,
    pub account_type: String,
    pub name: String,
    pub balance: Decimal,
    /// ISO 4217 currency code, normalized to uppercase
    pub currency_code: String,
    pub owner: Option<String>,
    /// Always fully populated; absent source data yields zeros
    pub detail: AccountDetail,
}

/// Bank-specific figures attached to an account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetail {
    pub transfer_number: String,
    pub closing_balance: Decimal,
    pub automatically_invested_balance: Decimal,
    pub overdraft_contracted_limit: Decimal,
    pub overdraft_used_limit: Decimal,
    pub unarranged_overdraft_amount: Decimal,
}

impl Account {
    /// Create a new account with required fields
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            account_type: String::new(),
            name: name.into(),
            balance: Decimal::ZERO,
            currency_code: String::new(),
            owner: None,
            detail: AccountDetail::default(),
        }
    }

    /// Normalize currency code to uppercase
    pub fn normalize_currency(currency: &str) -> String {
        currency.trim().to_uppercase()
    }
}

impl AccountDetail {
    pub fn is_zero(&self) -> bool {
        self.transfer_number.is_empty()
            && self.closing_balance.is_zero()
            && self.automatically_invested_balance.is_zero()
            && self.overdraft_contracted_limit.is_zero()
            && self.overdraft_used_limit.is_zero()
            && self.unarranged_overdraft_amount.is_zero()
    }
}
