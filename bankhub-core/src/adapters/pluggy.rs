//! Pluggy API client
//!
//! Handles communication with the Pluggy open-banking API: token exchange,
//! connector catalog, items, accounts and transactions.
//!
//! API Documentation: https://docs.pluggy.ai

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use url::Url;

use crate::config::{ClientCredentials, Config};
use crate::domain::result::{Error as DomainError, Result as DomainResult};
use crate::domain::{Account, AccountDetail, Connection, Credential, Institution, Transaction};
use crate::ports::{AccountsPage, AggregatorApi, TransactionQuery, TransactionsPage};

// =============================================================================
// API Response Models (matching Pluggy API responses)
// =============================================================================

/// Response of POST /auth
#[derive(Debug, Clone, Deserialize)]
struct AuthResponse {
    #[serde(default, rename = "apiKey")]
    api_key: Option<String>,
}

/// Wrapper for connectors list response
#[derive(Debug, Clone, Deserialize)]
struct ConnectorsResponse {
    #[serde(default)]
    results: Vec<PluggyConnector>,
}

/// Pluggy connector (institution) from API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluggyConnector {
    /// Connector ID (API returns number, we accept both)
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub health: Option<PluggyHealth>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluggyHealth {
    #[serde(default)]
    pub status: Option<String>,
}

/// Pluggy item (connection) from API
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluggyItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub products: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub execution_status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Wrapper for accounts list response
#[derive(Debug, Clone, Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    total: i64,
    #[serde(default)]
    results: Vec<PluggyAccount>,
}

/// Pluggy account from API
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluggyAccount {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, rename = "type")]
    pub account_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub bank_data: Option<PluggyBankData>,
}

/// Nested bank-specific data on an account; every field may be missing
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluggyBankData {
    #[serde(default)]
    pub transfer_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub closing_balance: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub automatically_invested_balance: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub overdraft_contracted_limit: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub overdraft_used_limit: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub unarranged_overdraft_amount: Option<Decimal>,
}

/// Wrapper for transactions list response
#[derive(Debug, Clone, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    total: i64,
    #[serde(default)]
    results: Vec<PluggyTransaction>,
}

/// Pluggy transaction from API
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluggyTransaction {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, rename = "type")]
    pub transaction_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// ISO 8601 timestamp, e.g. "2024-03-01T00:00:00.000Z"
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Deserialize ID that can be number, string or null (null becomes "")
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::String(s) => Ok(s),
        JsonValue::Null => Ok(String::new()),
        _ => Err(D::Error::custom("expected number or string for id")),
    }
}

/// Deserialize optional amount that can be number, string or null
fn deserialize_optional_amount<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<JsonValue> = Option::deserialize(deserializer)?;
    match value {
        Some(JsonValue::Number(n)) => n
            .to_string()
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e))),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e))),
        Some(JsonValue::Null) | None => Ok(None),
        _ => Err(D::Error::custom("expected number or string for amount")),
    }
}

// =============================================================================
// Mapping (wire -> domain). Total: every absent field has a documented default.
// =============================================================================

/// Map a connector to an Institution. Missing health status becomes "".
pub fn map_institution(connector: &PluggyConnector) -> Institution {
    Institution {
        id: connector.id.clone(),
        name: connector.name.clone(),
        health_status: connector
            .health
            .as_ref()
            .and_then(|h| h.status.clone())
            .unwrap_or_default(),
        connection_id: None,
    }
}

/// Map an item to a Connection. The requested id wins when the body has none.
pub fn map_connection(requested_id: &str, item: &PluggyItem) -> (Connection, Vec<String>) {
    let mut warnings = Vec::new();

    let created_at = item.created_at.as_deref().and_then(|raw| {
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            warnings.push(format!(
                "Connection {} has unparsable createdAt '{}'",
                requested_id, raw
            ));
        }
        parsed
    });

    let connection = Connection {
        id: if item.id.is_empty() {
            requested_id.to_string()
        } else {
            item.id.clone()
        },
        products: item.products.clone().unwrap_or_default(),
        status: item.status.clone().unwrap_or_default(),
        execution_status: item.execution_status.clone().unwrap_or_default(),
        created_at,
    };

    (connection, warnings)
}

/// Map an account. A missing `bankData` object yields an all-zero detail;
/// missing fields inside it default individually to zero / "".
pub fn map_account(pf_account: &PluggyAccount) -> (Account, Vec<String>) {
    let mut warnings = Vec::new();

    if pf_account.id.is_empty() {
        warnings.push(format!(
            "Account '{}' has no id",
            pf_account.name.as_deref().unwrap_or_default()
        ));
    }

    let detail = match &pf_account.bank_data {
        Some(data) => AccountDetail {
            transfer_number: data.transfer_number.clone().unwrap_or_default(),
            closing_balance: data.closing_balance.unwrap_or_default(),
            automatically_invested_balance: data
                .automatically_invested_balance
                .unwrap_or_default(),
            overdraft_contracted_limit: data.overdraft_contracted_limit.unwrap_or_default(),
            overdraft_used_limit: data.overdraft_used_limit.unwrap_or_default(),
            unarranged_overdraft_amount: data.unarranged_overdraft_amount.unwrap_or_default(),
        },
        None => {
            warnings.push(format!(
                "Account {} has no bankData; detail defaulted to zero",
                pf_account.id
            ));
            AccountDetail::default()
        }
    };

    if pf_account.balance.is_none() {
        warnings.push(format!(
            "Account {} has no balance; defaulted to zero",
            pf_account.id
        ));
    }

    let account = Account {
        id: pf_account.id.clone(),
        account_type: pf_account.account_type.clone().unwrap_or_default(),
        name: pf_account.name.clone().unwrap_or_default(),
        balance: pf_account.balance.unwrap_or_default(),
        currency_code: pf_account
            .currency_code
            .as_deref()
            .map(Account::normalize_currency)
            .unwrap_or_default(),
        owner: pf_account.owner.clone().filter(|o| !o.trim().is_empty()),
        detail,
    };

    (account, warnings)
}

/// Map a transaction. `fallback_account_id` is used when the body omits accountId.
pub fn map_transaction(
    pf_tx: &PluggyTransaction,
    fallback_account_id: &str,
) -> (Transaction, Vec<String>) {
    let mut warnings = Vec::new();

    if pf_tx.id.is_empty() {
        warnings.push(format!(
            "Transaction without id on account {}",
            pf_tx.account_id.as_deref().unwrap_or(fallback_account_id)
        ));
    }

    let transaction_date = match pf_tx.date.as_deref() {
        Some(raw) => {
            let parsed = parse_date(raw);
            if parsed.is_none() {
                warnings.push(format!(
                    "Transaction {} has unparsable date '{}'",
                    pf_tx.id, raw
                ));
            }
            parsed
        }
        None => {
            warnings.push(format!("Transaction {} has no date", pf_tx.id));
            None
        }
    };

    if pf_tx.amount.is_none() {
        warnings.push(format!(
            "Transaction {} has no amount; defaulted to zero",
            pf_tx.id
        ));
    }

    let description = pf_tx
        .description
        .as_ref()
        .filter(|d| !d.trim().is_empty())
        .cloned();

    let tx = Transaction {
        id: pf_tx.id.clone(),
        transaction_type: pf_tx.transaction_type.clone().unwrap_or_default(),
        amount: pf_tx.amount.unwrap_or_default(),
        currency_code: pf_tx
            .currency_code
            .as_deref()
            .map(Account::normalize_currency)
            .unwrap_or_default(),
        description,
        transaction_date,
        account_id: pf_tx
            .account_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| fallback_account_id.to_string()),
        institution_id: None,
    };

    (tx, warnings)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Accepts full RFC 3339 timestamps or bare YYYY-MM-DD dates
fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_timestamp(raw)
        .map(|dt| dt.date_naive())
        .or_else(|| NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok())
}

// =============================================================================
// Pluggy HTTP Client
// =============================================================================

/// Pluggy API client
#[derive(Debug)]
pub struct PluggyClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl PluggyClient {
    /// Create a client from configuration (base URL and timeout)
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new_with_base_url(&config.base_url, config.timeout)
    }

    /// Create a client with a custom base URL
    pub fn new_with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url).context("Invalid aggregator base URL")?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            anyhow::bail!("Aggregator base URL must use HTTP(S)");
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange client credentials for an API key
    pub fn authenticate(&self, credentials: &ClientCredentials) -> Result<String> {
        let url = format!("{}/auth", self.base_url);
        let payload = serde_json::json!({
            "clientId": credentials.client_id,
            "clientSecret": credentials.client_secret,
        });

        let response = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .json(&payload)
            .send()
            .map_err(|e| self.map_request_error(e))?;

        self.check_response_status(&response)?;

        let auth: AuthResponse = response
            .json()
            .context("Failed to parse Pluggy auth response")?;

        auth.api_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Pluggy auth response has no apiKey"))
    }

    /// Fetch all connectors
    pub fn get_connectors(&self, api_key: &str) -> Result<Vec<PluggyConnector>> {
        let url = format!("{}/connectors", self.base_url);
        let response = self.send(self.client.get(&url), api_key)?;

        let body: ConnectorsResponse = response
            .json()
            .context("Failed to parse Pluggy connectors response")?;
        Ok(body.results)
    }

    /// Fetch one item by ID
    pub fn get_item(&self, api_key: &str, item_id: &str) -> Result<PluggyItem> {
        let url = format!("{}/items/{}", self.base_url, item_id);
        let response = self.send(self.client.get(&url), api_key)?;

        response
            .json()
            .context("Failed to parse Pluggy item response")
    }

    /// Fetch accounts for one item; returns (total, accounts)
    pub fn get_accounts(&self, api_key: &str, item_id: &str) -> Result<(i64, Vec<PluggyAccount>)> {
        let url = format!("{}/accounts", self.base_url);
        let request = self.client.get(&url).query(&[("itemId", item_id)]);
        let response = self.send(request, api_key)?;

        let body: AccountsResponse = response
            .json()
            .context("Failed to parse Pluggy accounts response")?;
        Ok((body.total, body.results))
    }

    /// Fetch one page of transactions; returns (total, transactions)
    pub fn get_transactions(
        &self,
        api_key: &str,
        query: &TransactionQuery,
    ) -> Result<(i64, Vec<PluggyTransaction>)> {
        let url = format!("{}/transactions", self.base_url);

        let mut params = vec![
            ("accountId", query.account_id.clone()),
            ("pageSize", query.page_size.to_string()),
        ];
        if let Some(from) = query.from {
            params.push(("from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = query.to {
            params.push(("to", to.format("%Y-%m-%d").to_string()));
        }

        let response = self.send(self.client.get(&url).query(&params), api_key)?;

        let body: TransactionsResponse = response
            .json()
            .context("Failed to parse Pluggy transactions response")?;
        Ok((body.total, body.results))
    }

    /// Fetch a single transaction by ID
    pub fn get_transaction_by_id(
        &self,
        api_key: &str,
        transaction_id: &str,
    ) -> Result<PluggyTransaction> {
        let url = format!("{}/transactions/{}", self.base_url, transaction_id);
        let response = self.send(self.client.get(&url), api_key)?;

        response
            .json()
            .context("Failed to parse Pluggy transaction response")
    }

    fn send(&self, request: RequestBuilder, api_key: &str) -> Result<Response> {
        let response = request
            .header("accept", "application/json")
            .header("X-API-KEY", api_key)
            .send()
            .map_err(|e| self.map_request_error(e))?;

        self.check_response_status(&response)?;
        Ok(response)
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> anyhow::Error {
        if error.is_timeout() {
            anyhow::anyhow!(
                "Connection timed out after {} seconds",
                self.timeout.as_secs()
            )
        } else if error.is_connect() {
            anyhow::anyhow!("Unable to connect to Pluggy servers")
        } else {
            anyhow::anyhow!("Pluggy request failed: {}", error)
        }
    }

    /// Check response status and return appropriate errors
    fn check_response_status(&self, response: &Response) -> Result<()> {
        match response.status().as_u16() {
            200..=299 => Ok(()),
            400 => anyhow::bail!("Pluggy rejected the request as malformed."),
            401 => anyhow::bail!(
                "Pluggy authentication failed. Client credentials or API key may be invalid or expired."
            ),
            403 => anyhow::bail!("Pluggy access denied. Please check your client permissions."),
            404 => anyhow::bail!("Pluggy resource not found."),
            429 => anyhow::bail!("Pluggy rate limit exceeded. Please wait a moment and try again."),
            status @ 500..=599 => anyhow::bail!("Pluggy server error: HTTP {}", status),
            status => anyhow::bail!("Pluggy API error: HTTP {}", status),
        }
    }
}

// =============================================================================
// AggregatorApi implementation
// =============================================================================

fn upstream(e: anyhow::Error) -> DomainError {
    DomainError::Upstream(format!("{:#}", e))
}

impl AggregatorApi for PluggyClient {
    fn name(&self) -> &str {
        "pluggy"
    }

    fn exchange_token(&self, credentials: &ClientCredentials) -> DomainResult<String> {
        self.authenticate(credentials)
            .map_err(|e| DomainError::Auth(format!("{:#}", e)))
    }

    fn list_institutions(&self, credential: &Credential) -> DomainResult<Vec<Institution>> {
        let connectors = self.get_connectors(credential.token()).map_err(upstream)?;
        Ok(connectors.iter().map(map_institution).collect())
    }

    fn get_connection(
        &self,
        credential: &Credential,
        connection_id: &str,
    ) -> DomainResult<Connection> {
        let item = self
            .get_item(credential.token(), connection_id)
            .map_err(upstream)?;
        let (connection, warnings) = map_connection(connection_id, &item);
        for warning in warnings {
            tracing::warn!(connection_id, "{}", warning);
        }
        Ok(connection)
    }

    fn list_accounts(
        &self,
        credential: &Credential,
        connection_id: &str,
    ) -> DomainResult<AccountsPage> {
        let (total, results) = self
            .get_accounts(credential.token(), connection_id)
            .map_err(upstream)?;

        let mut page = AccountsPage {
            total,
            ..Default::default()
        };
        for pf_account in &results {
            let (account, warnings) = map_account(pf_account);
            page.accounts.push(account);
            page.warnings.extend(warnings);
        }
        Ok(page)
    }

    fn list_transactions(
        &self,
        credential: &Credential,
        query: &TransactionQuery,
    ) -> DomainResult<TransactionsPage> {
        let (total, results) = self
            .get_transactions(credential.token(), query)
            .map_err(upstream)?;

        let mut page = TransactionsPage {
            total,
            ..Default::default()
        };
        for pf_tx in &results {
            let (tx, warnings) = map_transaction(pf_tx, &query.account_id);
            page.transactions.push(tx);
            page.warnings.extend(warnings);
        }
        Ok(page)
    }

    fn get_transaction(
        &self,
        credential: &Credential,
        transaction_id: &str,
    ) -> DomainResult<Transaction> {
        let pf_tx = self
            .get_transaction_by_id(credential.token(), transaction_id)
            .map_err(upstream)?;
        let (tx, warnings) = map_transaction(&pf_tx, "");
        for warning in warnings {
            tracing::warn!(transaction_id, "{}", warning);
        }
        Ok(tx)
    }
}

// =============================================================================
// Tests
// =============================================================================
