//! Target config polling
//!
//! The actuator is steered through a mutable JSON file. Any subset of the
//! target fields may be present; absent fields retain their prior value.
//! A missing or malformed file never propagates an error to the controller.

use crate::models::LoadTargets;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Partial target overrides as written by operators
#[derive(Debug, Deserialize)]
struct TargetOverrides {
    target_cpu: Option<f64>,
    target_memory: Option<f64>,
    target_disk: Option<f64>,
    #[serde(default)]
    #[allow(dead_code)]
    updated_at: Option<String>,
}

/// Polls the external target config resource
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config resource, merging present fields over `current`.
    ///
    /// Returns `None` when the file is absent or malformed; the controller
    /// then retains its prior targets.
    pub async fn poll(&self, current: &LoadTargets) -> Option<LoadTargets> {
        let raw = tokio::fs::read_to_string(&self.path).await.ok()?;

        let overrides: TargetOverrides = match serde_json::from_str(&raw) {
            Ok(overrides) => overrides,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring malformed target config"
                );
                return None;
            }
        };

        Some(LoadTargets {
            cpu: clamp_percent(overrides.target_cpu.unwrap_or(current.cpu)),
            memory: clamp_percent(overrides.target_memory.unwrap_or(current.memory)),
            disk: clamp_percent(overrides.target_disk.unwrap_or(current.disk)),
        })
    }
}

fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> ConfigWatcher {
        let path = dir.path().join("targets.json");
        std::fs::write(&path, body).unwrap();
        ConfigWatcher::new(path)
    }

    #[tokio::test]
    async fn test_poll_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = ConfigWatcher::new(dir.path().join("absent.json"));

        assert!(watcher.poll(&LoadTargets::default()).await.is_none());
    }

    #[tokio::test]
    async fn test_poll_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = write_config(
            &dir,
            r#"{"target_cpu": 80.0, "target_memory": 60.0, "target_disk": 40.0}"#,
        );

        let targets = watcher.poll(&LoadTargets::default()).await.unwrap();
        assert_eq!(targets.cpu, 80.0);
        assert_eq!(targets.memory, 60.0);
        assert_eq!(targets.disk, 40.0);
    }

    #[tokio::test]
    async fn test_poll_partial_config_retains_prior_values() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = write_config(&dir, r#"{"target_cpu": 75.0}"#);

        let current = LoadTargets {
            cpu: 50.0,
            memory: 33.0,
            disk: 20.0,
        };
        let targets = watcher.poll(&current).await.unwrap();
        assert_eq!(targets.cpu, 75.0);
        assert_eq!(targets.memory, 33.0);
        assert_eq!(targets.disk, 20.0);
    }

    #[tokio::test]
    async fn test_poll_malformed_config() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = write_config(&dir, "{not json");

        assert!(watcher.poll(&LoadTargets::default()).await.is_none());
    }

    #[tokio::test]
    async fn test_poll_clamps_out_of_range_targets() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = write_config(&dir, r#"{"target_cpu": 250.0, "target_memory": -5.0}"#);

        let targets = watcher.poll(&LoadTargets::default()).await.unwrap();
        assert_eq!(targets.cpu, 100.0);
        assert_eq!(targets.memory, 0.0);
    }

    #[tokio::test]
    async fn test_poll_ignores_updated_at() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = write_config(
            &dir,
            r#"{"target_cpu": 10.0, "updated_at": "2024-06-01T00:00:00Z"}"#,
        );

        let targets = watcher.poll(&LoadTargets::default()).await.unwrap();
        assert_eq!(targets.cpu, 10.0);
    }
}
