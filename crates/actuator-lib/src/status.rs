//! Status snapshot publishing
//!
//! Each control cycle the controller serializes its state for external
//! observers. The write goes to a sibling temp file first and is moved into
//! place, so a reader never sees a partially written snapshot.

use crate::models::StatusSnapshot;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Writes status snapshots to the external status resource
pub struct StatusPublisher {
    path: PathBuf,
}

impl StatusPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the status resource with the given snapshot
    pub async fn publish(&self, snapshot: &StatusSnapshot) -> Result<()> {
        let body = serde_json::to_vec_pretty(snapshot).context("Failed to serialize status")?;

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, &body)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }
}
