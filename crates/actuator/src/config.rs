//! Actuator configuration

use actuator_lib::{ControllerConfig, LoadTargets};
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Actuator configuration, loaded from `ACTUATOR_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ActuatorConfig {
    /// Base URL of the exercised endpoint service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// URL of the node-exporter style metrics endpoint
    #[serde(default = "default_metrics_url")]
    pub metrics_url: String,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Path of the polled target config file
    #[serde(default = "default_config_path")]
    pub config_path: PathBuf,

    /// Path of the published status file
    #[serde(default = "default_status_path")]
    pub status_path: PathBuf,

    /// Path of the disk ballast file
    #[serde(default = "default_ballast_path")]
    pub ballast_path: PathBuf,

    /// Control loop period in seconds
    #[serde(default = "default_control_period")]
    pub control_period_secs: u64,

    /// Worker replicas per endpoint
    #[serde(default = "default_workers_per_endpoint")]
    pub workers_per_endpoint: usize,

    /// Initial CPU utilization target percent
    #[serde(default = "default_target")]
    pub target_cpu: f64,

    /// Initial memory utilization target percent
    #[serde(default = "default_target")]
    pub target_memory: f64,

    /// Initial disk utilization target percent
    #[serde(default = "default_target")]
    pub target_disk: f64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_metrics_url() -> String {
    "http://localhost:9100/metrics".to_string()
}

fn default_api_port() -> u16 {
    8090
}

fn default_config_path() -> PathBuf {
    PathBuf::from("/tmp/load_actuator_config.json")
}

fn default_status_path() -> PathBuf {
    PathBuf::from("/tmp/load_actuator_status.json")
}

fn default_ballast_path() -> PathBuf {
    PathBuf::from("/tmp/load_actuator_disk_ballast.bin")
}

fn default_control_period() -> u64 {
    5
}

fn default_workers_per_endpoint() -> usize {
    2
}

fn default_target() -> f64 {
    50.0
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            metrics_url: default_metrics_url(),
            api_port: default_api_port(),
            config_path: default_config_path(),
            status_path: default_status_path(),
            ballast_path: default_ballast_path(),
            control_period_secs: default_control_period(),
            workers_per_endpoint: default_workers_per_endpoint(),
            target_cpu: default_target(),
            target_memory: default_target(),
            target_disk: default_target(),
        }
    }
}

impl ActuatorConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ACTUATOR").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// Controller view of this configuration
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            base_url: self.base_url.clone(),
            period: Duration::from_secs(self.control_period_secs),
            config_path: self.config_path.clone(),
            status_path: self.status_path.clone(),
            ballast_path: self.ballast_path.clone(),
            workers_per_endpoint: self.workers_per_endpoint,
            initial_targets: LoadTargets {
                cpu: self.target_cpu,
                memory: self.target_memory,
                disk: self.target_disk,
            },
        }
    }
}
