//! Account enumerator - list the accounts behind a connection

use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::{Account, InstitutionRecord};
use crate::ports::{AccountsPage, AggregatorApi};
use crate::services::CredentialManager;

pub struct AccountEnumerator {
    api: Arc<dyn AggregatorApi>,
    credentials: Arc<CredentialManager>,
}

impl AccountEnumerator {
    pub fn new(api: Arc<dyn AggregatorApi>, credentials: Arc<CredentialManager>) -> Self {
        Self { api, credentials }
    }

    /// Accounts of one connection
    ///
    /// A zero reported total yields no accounts, whatever the body held.
    pub fn enumerate(&self, connection_id: &str) -> Result<Vec<Account>> {
        let page = self.fetch(connection_id)?;
        for warning in &page.warnings {
            tracing::warn!(connection = connection_id, "{}", warning);
        }
        Ok(page.accounts)
    }

    /// Enumerate the record's connection and append to its accounts
    ///
    /// Returns how many accounts were added. Shape warnings are kept on
    /// the record.
    pub fn enumerate_into(&self, record: &mut InstitutionRecord) -> Result<usize> {
        let Some(connection_id) = record.institution.connection_id().map(str::to_string) else {
            return Ok(0);
        };

        let page = self.fetch(&connection_id)?;
        let added = page.accounts.len();
        record.add_warnings(page.warnings);
        record.append_accounts(page.accounts);

        tracing::info!(
            institution = %record.institution.name,
            accounts = added,
            "enumerated accounts"
        );
        Ok(added)
    }

    fn fetch(&self, connection_id: &str) -> Result<AccountsPage> {
        if connection_id.trim().is_empty() {
            return Ok(AccountsPage::default());
        }

        let credential = self.credentials.ensure_valid()?;
        let page = self.api.list_accounts(&credential, connection_id)?;
        if page.total == 0 {
            return Ok(AccountsPage::default());
        }
        Ok(page)
    }
}
