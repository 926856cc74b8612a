//! Utilization metrics reading
//!
//! The controller steers against readings from an external node-exporter
//! style metrics endpoint. Parsing is split into pure functions over the
//! text exposition format so it can be tested without a live endpoint.
//!
//! A reading of `0.0` (or `0` bytes) always means "no signal", never "idle":
//! every failure mode of the reader collapses to it and downstream consumers
//! treat it as the absence of a measurement.

mod parse;
mod reader;

pub use parse::ExpositionError;
pub use reader::NodeExporterReader;

pub use async_trait::async_trait;

/// Source of current utilization readings
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Current CPU utilization percent, 0.0 on failure
    async fn cpu_percent(&self) -> f64;

    /// Current memory utilization percent, 0.0 on failure
    async fn memory_percent(&self) -> f64;

    /// Current root-filesystem utilization percent, 0.0 on failure
    async fn disk_percent(&self) -> f64;

    /// Total system memory in bytes, 0 on failure
    async fn total_memory_bytes(&self) -> u64;

    /// Total root-filesystem size in bytes, 0 on failure
    async fn total_disk_bytes(&self) -> u64;
}
