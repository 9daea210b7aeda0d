//! Access credential domain model

use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Default lifetime of an aggregator access token, in minutes
pub const DEFAULT_VALIDITY_MINUTES: i64 = 120;

/// Short-lived bearer token issued by the aggregator
///
/// A credential is replaced wholesale on refresh and never mutated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    issued_at: DateTime<Utc>,
    validity: Duration,
}

impl Credential {
    pub fn new(token: impl Into<String>, issued_at: DateTime<Utc>, validity: Duration) -> Self {
        Self {
            token: token.into(),
            issued_at,
            validity,
        }
    }

    /// Opaque token value, sent as the API key header
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + self.validity
    }

    /// Valid up to and including `issued_at + validity`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("validity", &self.validity)
            .finish()
    }
}
