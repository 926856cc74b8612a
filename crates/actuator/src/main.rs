//! Load Actuator - closed-loop synthetic load generator
//!
//! Runs as a long-lived process that steers a machine toward operator-set
//! CPU/memory/disk utilization targets: a worker pool paces HTTP requests
//! against a fleet of test endpoints while ballast actuators hold memory
//! and disk directly.

use actuator_lib::{
    health::components, metrics::NodeExporterReader, Controller, HealthRegistry, StructuredLogger,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const ACTUATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = ACTUATOR_VERSION, "Starting load-actuator");

    // Load configuration
    let config = config::ActuatorConfig::load()?;
    info!(
        base_url = %config.base_url,
        metrics_url = %config.metrics_url,
        "Actuator configured"
    );

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::METRICS_READER).await;
    health_registry.register(components::CONFIG_WATCHER).await;
    health_registry.register(components::WORKERS).await;
    health_registry.register(components::BALLAST).await;

    // Structured logging for lifecycle events
    let logger = StructuredLogger::new(&config.base_url);

    // Build the controller against the external metrics source
    let reader = Arc::new(NodeExporterReader::new(&config.metrics_url)?);
    let controller = Controller::new(
        config.controller_config(),
        reader,
        health_registry.clone(),
    )?;

    // Mark actuator as ready once the controller is about to run
    health_registry.set_ready(true).await;

    // Start health and metrics server
    let app_state = Arc::new(api::AppState::new(health_registry.clone()));
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Run the control loop until a termination signal arrives
    let (shutdown_tx, _) = broadcast::channel(1);
    let controller_handle = tokio::spawn(controller.run(shutdown_tx.clone()));

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    // The controller stops the workers and releases all ballast before
    // returning; the API server is torn down after it.
    let _ = shutdown_tx.send(());
    controller_handle.await?;
    api_handle.abort();

    info!("Shutdown complete");
    Ok(())
}
