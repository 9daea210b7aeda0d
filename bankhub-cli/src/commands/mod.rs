//! CLI command implementations

pub mod config;
pub mod demo;
pub mod institutions;
pub mod sync;
pub mod transaction;

use std::path::PathBuf;

use anyhow::{Context, Result};
use bankhub_core::BankHubContext;

/// Get the bankhub directory from environment or default
pub fn get_bankhub_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("BANKHUB_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".bankhub"))
        .context("Could not find home directory (set BANKHUB_DIR)")
}

/// Get or create bankhub context
pub fn get_context() -> Result<BankHubContext> {
    let bankhub_dir = get_bankhub_dir()?;

    std::fs::create_dir_all(&bankhub_dir)
        .with_context(|| format!("Failed to create bankhub directory: {:?}", bankhub_dir))?;
    tracing::debug!(dir = %bankhub_dir.display(), "using bankhub directory");

    BankHubContext::new(&bankhub_dir).context("Failed to initialize bankhub context")
}
