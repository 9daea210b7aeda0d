//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// `Auth` is fatal to a run. `Upstream` and `NoAccount` are scoped to the
/// institution being processed; the pipeline records them as a skipped
/// stage and moves on to the next institution.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("No account available: {0}")]
    NoAccount(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create an upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error must abort the whole run rather than one institution
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Upstream(_) | Self::NoAccount(_))
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
