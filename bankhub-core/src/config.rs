//! Configuration management
//!
//! Settings live in `settings.json` inside the bankhub directory:
//! ```json
//! {
//!   "aggregator": { "baseUrl": "https://api.pluggy.ai", "clientId": "..", "clientSecret": ".." },
//!   "institutions": { "allowList": ["Nubank", "Inter"], "connections": { "Nubank": "<uuid>" } },
//!   "transactions": { "pageSize": 500 },
//!   "app": { "demoMode": false }
//! }
//! ```
//! Every section is optional. Client credentials and the base URL can be
//! overridden from the environment.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::DEFAULT_VALIDITY_MINUTES;
use crate::ports::MAX_PAGE_SIZE;

pub const CLIENT_ID_ENV: &str = "BANKHUB_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "BANKHUB_CLIENT_SECRET";
pub const BASE_URL_ENV: &str = "BANKHUB_BASE_URL";
pub const DEMO_MODE_ENV: &str = "BANKHUB_DEMO_MODE";

/// Default production API URL
pub const DEFAULT_BASE_URL: &str = "https://api.pluggy.ai";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upper bound on the access token lifetime (one day)
pub const MAX_CREDENTIAL_TTL_MINUTES: i64 = 24 * 60;

/// Institutions supported out of the box
const DEFAULT_ALLOW_LIST: [&str; 5] = ["Nubank", "Inter", "PicPay", "Itaú", "Neon"];

/// Nubank offers no self-service linking, so its connection is pinned
pub const DEFAULT_PINNED_CONNECTION: (&str, &str) =
    ("Nubank", "0553c99a-9462-4200-bb69-d28aa70f79d8");

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    aggregator: AggregatorSettings,
    #[serde(default)]
    institutions: InstitutionSettings,
    #[serde(default)]
    transactions: TransactionSettings,
    #[serde(default)]
    app: AppSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    demo_mode: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregatorSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credential_ttl_minutes: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstitutionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    allow_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connections: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_size: Option<u32>,
}

/// Client identifier and secret exchanged for an access token
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Bankhub configuration (resolved view of settings + environment)
#[derive(Clone)]
pub struct Config {
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Per-request timeout for aggregator calls
    pub timeout: Duration,
    pub credential_ttl_minutes: i64,
    /// Institution names retained after catalog filtering (exact match)
    pub allow_list: Vec<String>,
    /// Institution name -> known connection identifier
    pub pinned_connections: BTreeMap<String, String>,
    pub page_size: u32,
    /// Serve built-in sample data instead of calling the aggregator
    pub demo_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: None,
            client_secret: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credential_ttl_minutes: DEFAULT_VALIDITY_MINUTES,
            allow_list: DEFAULT_ALLOW_LIST.iter().map(|s| s.to_string()).collect(),
            pinned_connections: BTreeMap::from([(
                DEFAULT_PINNED_CONNECTION.0.to_string(),
                DEFAULT_PINNED_CONNECTION.1.to_string(),
            )]),
            page_size: MAX_PAGE_SIZE,
            demo_mode: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("credential_ttl_minutes", &self.credential_ttl_minutes)
            .field("allow_list", &self.allow_list)
            .field("pinned_connections", &self.pinned_connections)
            .field("page_size", &self.page_size)
            .field("demo_mode", &self.demo_mode)
            .finish()
    }
}

impl Config {
    /// Load config from the bankhub directory
    ///
    /// A missing or unreadable settings file falls back to defaults.
    /// Environment variables win over the file.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(dir)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load only what settings.json holds, ignoring the environment
    ///
    /// Use this before `save` so environment secrets never reach disk.
    pub fn load_file(dir: &Path) -> Result<Self> {
        let settings_path = dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            match serde_json::from_str(&content) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(
                        path = %settings_path.display(),
                        error = %e,
                        "ignoring unreadable settings file"
                    );
                    SettingsFile::default()
                }
            }
        } else {
            SettingsFile::default()
        };

        Ok(Self::from_settings(raw))
    }

    /// Parse a settings document without touching the environment
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: SettingsFile = serde_json::from_str(content)?;
        Ok(Self::from_settings(raw))
    }

    fn from_settings(raw: SettingsFile) -> Self {
        let defaults = Self::default();
        let allow_list = raw.institutions.allow_list.unwrap_or(defaults.allow_list);
        // Default pins only apply to institutions that are still allowed
        let pinned_connections = raw.institutions.connections.unwrap_or_else(|| {
            defaults
                .pinned_connections
                .into_iter()
                .filter(|(name, _)| allow_list.contains(name))
                .collect()
        });
        Self {
            base_url: raw.aggregator.base_url.unwrap_or(defaults.base_url),
            client_id: raw.aggregator.client_id.filter(|s| !s.trim().is_empty()),
            client_secret: raw.aggregator.client_secret.filter(|s| !s.trim().is_empty()),
            timeout: raw
                .aggregator
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            credential_ttl_minutes: raw
                .aggregator
                .credential_ttl_minutes
                .unwrap_or(defaults.credential_ttl_minutes),
            allow_list,
            pinned_connections,
            page_size: raw.transactions.page_size.unwrap_or(defaults.page_size),
            demo_mode: raw.app.demo_mode,
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(id) = non_empty(CLIENT_ID_ENV) {
            self.client_id = Some(id);
        }
        if let Some(secret) = non_empty(CLIENT_SECRET_ENV) {
            self.client_secret = Some(secret);
        }
        if let Some(url) = non_empty(BASE_URL_ENV) {
            self.base_url = url;
        }
        // Demo mode override (for CI/testing)
        match lookup(DEMO_MODE_ENV).as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => self.demo_mode = true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => self.demo_mode = false,
            _ => {}
        }
    }

    /// Save config to the bankhub directory
    pub fn save(&self, dir: &Path) -> Result<()> {
        let settings = SettingsFile {
            aggregator: AggregatorSettings {
                base_url: Some(self.base_url.clone()),
                client_id: self.client_id.clone(),
                client_secret: self.client_secret.clone(),
                timeout_secs: Some(self.timeout.as_secs()),
                credential_ttl_minutes: Some(self.credential_ttl_minutes),
            },
            institutions: InstitutionSettings {
                allow_list: Some(self.allow_list.clone()),
                connections: Some(self.pinned_connections.clone()),
            },
            transactions: TransactionSettings {
                page_size: Some(self.page_size),
            },
            app: AppSettings {
                demo_mode: self.demo_mode,
            },
        };

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(dir.join("settings.json"), content)?;
        Ok(())
    }

    /// Check invariants that would otherwise surface mid-run
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("aggregator base URL cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than zero"));
        }
        self.credential_ttl()?;
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::config(format!(
                "page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        for (name, id) in &self.pinned_connections {
            if !self.is_supported(name) {
                return Err(Error::config(format!(
                    "pinned connection for '{}' which is not in the allow-list",
                    name
                )));
            }
            Uuid::parse_str(id).map_err(|e| {
                Error::config(format!("pinned connection for '{}' is not a UUID: {}", name, e))
            })?;
        }
        Ok(())
    }

    /// Exact, case-sensitive allow-list membership
    pub fn is_supported(&self, institution_name: &str) -> bool {
        self.allow_list.iter().any(|n| n == institution_name)
    }

    pub fn pinned_connection(&self, institution_name: &str) -> Option<&str> {
        self.pinned_connections
            .get(institution_name)
            .map(String::as_str)
    }

    pub fn client_credentials(&self) -> Result<ClientCredentials> {
        let client_id = self.client_id.clone().ok_or_else(|| {
            Error::config(format!("client id not configured (set {})", CLIENT_ID_ENV))
        })?;
        let client_secret = self.client_secret.clone().ok_or_else(|| {
            Error::config(format!(
                "client secret not configured (set {})",
                CLIENT_SECRET_ENV
            ))
        })?;
        Ok(ClientCredentials {
            client_id,
            client_secret,
        })
    }

    /// Enable demo mode
    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }

    /// Disable demo mode
    pub fn disable_demo_mode(&mut self) {
        self.demo_mode = false;
    }

    /// Token lifetime, bounded to 1..=MAX_CREDENTIAL_TTL_MINUTES
    pub fn credential_ttl(&self) -> Result<chrono::Duration> {
        let minutes = self.credential_ttl_minutes;
        if !(1..=MAX_CREDENTIAL_TTL_MINUTES).contains(&minutes) {
            return Err(Error::config(format!(
                "credential TTL must be between 1 and {} minutes, got {}",
                MAX_CREDENTIAL_TTL_MINUTES, minutes
            )));
        }
        chrono::Duration::try_minutes(minutes).ok_or_else(|| {
            Error::config(format!("credential TTL of {} minutes is out of range", minutes))
        })
    }
}
