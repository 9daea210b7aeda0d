//! Credential service - owns the aggregator access token

use std::sync::{Arc, Mutex};

use chrono::Duration;

use crate::config::ClientCredentials;
use crate::domain::result::{Error, Result};
use crate::domain::Credential;
use crate::ports::{AggregatorApi, Clock};

/// Keeps one access token alive for every other service
///
/// The token is reused until its validity window has passed, then
/// exchanged again. Refreshes are serialized: concurrent callers wait on
/// the slot lock and see the refreshed credential.
pub struct CredentialManager {
    api: Arc<dyn AggregatorApi>,
    client: ClientCredentials,
    clock: Arc<dyn Clock>,
    validity: Duration,
    slot: Mutex<Option<Credential>>,
}

impl CredentialManager {
    pub fn new(
        api: Arc<dyn AggregatorApi>,
        client: ClientCredentials,
        clock: Arc<dyn Clock>,
        validity: Duration,
    ) -> Self {
        Self {
            api,
            client,
            clock,
            validity,
            slot: Mutex::new(None),
        }
    }

    /// Return a credential valid at the current instant
    ///
    /// An exchange failure leaves any previous credential in place and is
    /// returned as `Error::Auth`.
    pub fn ensure_valid(&self) -> Result<Credential> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| Error::Other(format!("Lock poisoned: {}", e)))?;

        let now = self.clock.now();
        if let Some(current) = slot.as_ref() {
            if current.is_valid_at(now) {
                return Ok(current.clone());
            }
            tracing::debug!(expired_at = %current.expires_at(), "access token expired");
        }

        let token = self.api.exchange_token(&self.client).map_err(|e| match e {
            Error::Auth(msg) => Error::Auth(msg),
            other => Error::auth(other.to_string()),
        })?;
        if token.trim().is_empty() {
            return Err(Error::auth("aggregator returned an empty access token"));
        }

        let credential = Credential::new(token, now, self.validity);
        tracing::debug!(
            provider = self.api.name(),
            expires_at = %credential.expires_at(),
            "obtained access token"
        );
        *slot = Some(credential.clone());
        Ok(credential)
    }

    /// Current credential, without refreshing
    pub fn current(&self) -> Option<Credential> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }

    /// Drop the held credential so the next call exchanges again
    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::adapters::demo::{DemoAggregator, DEMO_CLIENT_ID};
    use crate::ports::ManualClock;

    fn setup(api: DemoAggregator) -> (Arc<DemoAggregator>, Arc<ManualClock>, CredentialManager) {
        let api = Arc::new(api);
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        ));
        let manager = CredentialManager::new(
            api.clone(),
            ClientCredentials {
                client_id: DEMO_CLIENT_ID.to_string(),
                client_secret: "secret".to_string(),
            },
            clock.clone(),
            Duration::hours(2),
        );
        (api, clock, manager)
    }

    #[test]
    fn test_first_call_exchanges() {
        let (api, clock, manager) = setup(DemoAggregator::empty());
        assert!(manager.current().is_none());

        let cred = manager.ensure_valid().unwrap();
        assert_eq!(api.token_exchanges(), 1);
        assert_eq!(cred.issued_at(), clock.now());
    }

    #[test]
    fn test_token_reused_within_window() {
        let (api, clock, manager) = setup(DemoAggregator::empty());
        let first = manager.ensure_valid().unwrap();

        clock.advance(Duration::minutes(119));
        let second = manager.ensure_valid().unwrap();

        assert_eq!(api.token_exchanges(), 1);
        assert_eq!(first.token(), second.token());
    }

    #[test]
    fn test_boundary_is_still_valid() {
        let (api, clock, manager) = setup(DemoAggregator::empty());
        manager.ensure_valid().unwrap();

        clock.advance(Duration::hours(2));
        manager.ensure_valid().unwrap();
        assert_eq!(api.token_exchanges(), 1);
    }

    #[test]
    fn test_refresh_after_expiry() {
        let (api, clock, manager) = setup(DemoAggregator::empty());
        let first = manager.ensure_valid().unwrap();

        clock.advance(Duration::minutes(121));
        let second = manager.ensure_valid().unwrap();

        assert_eq!(api.token_exchanges(), 2);
        assert_ne!(first.token(), second.token());
        assert_eq!(second.issued_at(), clock.now());
    }

    #[test]
    fn test_exchange_failure_is_auth_error() {
        let (_api, _clock, manager) = setup(DemoAggregator::empty().failing("auth"));
        let err = manager.ensure_valid().unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_invalidate_forces_exchange() {
        let (api, _clock, manager) = setup(DemoAggregator::empty());
        manager.ensure_valid().unwrap();
        manager.invalidate();
        manager.ensure_valid().unwrap();
        assert_eq!(api.token_exchanges(), 2);
    }
}
