//! Institution and connection domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A financial institution known to the aggregator (a "connector")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub id: String,
    pub name: String,
    /// Health status reported by the aggregator, e.g. "ONLINE"
    pub health_status: String,
    /// Connection ("item") identifier, when one is known for this run
    pub connection_id: Option<String>,
}

impl Institution {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            health_status: String::new(),
            connection_id: None,
        }
    }

    /// Connection identifier, treating an empty string as absent
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn has_connection(&self) -> bool {
        self.connection_id().is_some()
    }
}

/// The aggregator's link between a user and one institution (an "item")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    /// Products enabled on this connection, e.g. "ACCOUNTS", "TRANSACTIONS"
    pub products: Vec<String>,
    /// e.g. "UPDATED", "UPDATING", "LOGIN_ERROR"
    pub status: String,
    /// e.g. "SUCCESS", "ERROR"
    pub execution_status: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Connection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            products: Vec::new(),
            status: String::new(),
            execution_status: String::new(),
            created_at: None,
        }
    }

    pub fn supports(&self, product: &str) -> bool {
        self.products.iter().any(|p| p.eq_ignore_ascii_case(product))
    }
}
