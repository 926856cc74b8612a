//! Disk ballast actuator
//!
//! Maintains a single filler file. Growth appends pattern-filled bytes (one
//! marker byte per 4KB page, the rest zero); shrink truncates, and a target
//! of zero removes the file entirely.

use super::{target_bytes, BallastAction, HYSTERESIS_BYTES};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Maximum bytes appended per grow step
pub const DEFAULT_GROW_STEP_BYTES: u64 = 500 * 1024 * 1024;

const PAGE_BYTES: usize = 4096;

/// Bound on the in-memory buffer used while appending filler
const WRITE_SLICE_BYTES: u64 = 4 * 1024 * 1024;

/// On-disk ballast file, owned by the controller task only
pub struct DiskBallast {
    path: PathBuf,
    grow_step_bytes: u64,
    hysteresis_bytes: u64,
}

impl DiskBallast {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_limits(path, DEFAULT_GROW_STEP_BYTES, HYSTERESIS_BYTES)
    }

    /// Create with custom step/hysteresis sizes (for testing)
    pub fn with_limits(
        path: impl Into<PathBuf>,
        grow_step_bytes: u64,
        hysteresis_bytes: u64,
    ) -> Self {
        Self {
            path: path.into(),
            grow_step_bytes,
            hysteresis_bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current ballast file size, 0 when the file does not exist
    pub async fn current_bytes(&self) -> u64 {
        fs::metadata(&self.path).await.map(|m| m.len()).unwrap_or(0)
    }

    /// Move the ballast file one step toward `target_percent` of
    /// `total_bytes`.
    ///
    /// No-op when `total_bytes` is zero or the delta is within the
    /// hysteresis band. A shrink that would reach zero removes the file.
    pub async fn adjust(&self, target_percent: f64, total_bytes: u64) -> Result<BallastAction> {
        if total_bytes == 0 {
            return Ok(BallastAction::Idle);
        }

        let target = target_bytes(total_bytes, target_percent);
        let current = self.current_bytes().await;
        let delta = target as i64 - current as i64;

        if delta.unsigned_abs() <= self.hysteresis_bytes {
            return Ok(BallastAction::Idle);
        }

        if delta > 0 {
            let step = (delta as u64).min(self.grow_step_bytes);
            self.append_filler(step).await?;
            Ok(BallastAction::Grew(step))
        } else {
            let new_len = current - delta.unsigned_abs().min(current);
            if new_len == 0 {
                fs::remove_file(&self.path)
                    .await
                    .with_context(|| format!("Failed to remove {}", self.path.display()))?;
                Ok(BallastAction::Shrank(current))
            } else {
                let file = fs::OpenOptions::new()
                    .write(true)
                    .open(&self.path)
                    .await
                    .with_context(|| format!("Failed to open {}", self.path.display()))?;
                file.set_len(new_len)
                    .await
                    .with_context(|| format!("Failed to truncate {}", self.path.display()))?;
                Ok(BallastAction::Shrank(current - new_len))
            }
        }
    }

    /// Remove the ballast file if present. Idempotent; used at shutdown.
    pub async fn remove(&self) -> Result<bool> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to remove {}", self.path.display()))
            }
        }
    }

    async fn append_filler(&self, bytes: u64) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let mut written = 0u64;
        while written < bytes {
            let len = (bytes - written).min(WRITE_SLICE_BYTES) as usize;
            let mut buf = vec![0u8; len];
            let mut offset = 0;
            while offset < len {
                buf[offset] = ((written as usize + offset) % 256) as u8;
                offset += PAGE_BYTES;
            }
            file.write_all(&buf)
                .await
                .with_context(|| format!("Failed to append to {}", self.path.display()))?;
            written += len as u64;
        }

        file.flush()
            .await
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;
        Ok(())
    }
}
