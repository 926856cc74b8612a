//! HTTP reader for a node-exporter style metrics endpoint

use super::{parse, MetricsSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Per-request timeout for the metrics endpoint
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads utilization metrics from a local node-exporter endpoint.
///
/// Every failure (timeout, non-200, parse error) is logged and collapsed to
/// a zero reading; the controller treats zero as "no signal".
pub struct NodeExporterReader {
    client: reqwest::Client,
    endpoint: String,
}

impl NodeExporterReader {
    /// Create a reader for the given exposition URL
    /// (e.g. `http://localhost:9100/metrics`)
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("Failed to create metrics HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .with_context(|| format!("Failed to fetch metrics from {}", self.endpoint))?;

        if !response.status().is_success() {
            anyhow::bail!("Metrics endpoint returned {}", response.status());
        }

        response
            .text()
            .await
            .context("Failed to read metrics response body")
    }

    async fn read_percent(
        &self,
        what: &'static str,
        extract: fn(&str) -> Result<f64, parse::ExpositionError>,
    ) -> f64 {
        match self.fetch().await {
            Ok(text) => match extract(&text) {
                Ok(value) => value,
                Err(e) => {
                    warn!(reading = what, error = %e, "Failed to parse metrics exposition");
                    0.0
                }
            },
            Err(e) => {
                warn!(reading = what, error = %e, "Failed to fetch metrics");
                0.0
            }
        }
    }

    async fn read_bytes(
        &self,
        what: &'static str,
        extract: fn(&str) -> Result<u64, parse::ExpositionError>,
    ) -> u64 {
        match self.fetch().await {
            Ok(text) => match extract(&text) {
                Ok(value) => value,
                Err(e) => {
                    warn!(reading = what, error = %e, "Failed to parse metrics exposition");
                    0
                }
            },
            Err(e) => {
                warn!(reading = what, error = %e, "Failed to fetch metrics");
                0
            }
        }
    }
}

#[async_trait]
impl MetricsSource for NodeExporterReader {
    async fn cpu_percent(&self) -> f64 {
        self.read_percent("cpu_percent", parse::cpu_percent).await
    }

    async fn memory_percent(&self) -> f64 {
        self.read_percent("memory_percent", parse::memory_percent)
            .await
    }

    async fn disk_percent(&self) -> f64 {
        self.read_percent("disk_percent", parse::disk_percent).await
    }

    async fn total_memory_bytes(&self) -> u64 {
        self.read_bytes("total_memory_bytes", parse::total_memory_bytes)
            .await
    }

    async fn total_disk_bytes(&self) -> u64 {
        self.read_bytes("total_disk_bytes", parse::total_disk_bytes)
            .await
    }
}
