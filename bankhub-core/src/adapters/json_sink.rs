//! JSON snapshot storage
//!
//! Writes each aggregate to `aggregate-<started_at>-<run_id>.json` and
//! refreshes `latest.json` alongside it. Files are written to a temporary
//! name first and renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::result::{Error, Result};
use crate::domain::AggregateResult;
use crate::ports::AggregateSink;

const LATEST_FILE: &str = "latest.json";

/// Stores aggregates as pretty-printed JSON files in a directory
#[derive(Debug, Clone)]
pub struct JsonSnapshotSink {
    dir: PathBuf,
}

impl JsonSnapshotSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name used for one run
    pub fn file_name(aggregate: &AggregateResult) -> String {
        format!(
            "aggregate-{}-{}.json",
            aggregate.started_at.format("%Y%m%dT%H%M%SZ"),
            aggregate.run_id
        )
    }

    /// Load the most recently stored aggregate, if any
    pub fn load_latest(&self) -> Result<Option<AggregateResult>> {
        let path = self.dir.join(LATEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn write_atomic(&self, name: &str, content: &str) -> Result<PathBuf> {
        let target = self.dir.join(name);
        let tmp = self.dir.join(format!(".{}.tmp", name));
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &target)?;
        Ok(target)
    }
}

impl AggregateSink for JsonSnapshotSink {
    fn name(&self) -> &str {
        "json"
    }

    fn store(&self, aggregate: &AggregateResult) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            Error::Storage(format!(
                "Failed to create snapshot directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let content = serde_json::to_string_pretty(aggregate)?;
        let path = self
            .write_atomic(&Self::file_name(aggregate), &content)
            .map_err(|e| Error::Storage(format!("Failed to write snapshot: {}", e)))?;
        self.write_atomic(LATEST_FILE, &content)
            .map_err(|e| Error::Storage(format!("Failed to update latest snapshot: {}", e)))?;

        tracing::info!(
            path = %path.display(),
            run_id = %aggregate.run_id,
            "stored aggregate snapshot"
        );
        Ok(())
    }
}
