//! Feedback control loop
//!
//! The controller runs a fixed-period cycle: pick up target changes, read
//! current utilization, publish status, retune the shared request interval
//! from the CPU target, and step the memory/disk ballast actuators. Every
//! per-cycle failure is contained and logged; only the shutdown signal stops
//! the loop.

use crate::ballast::{DiskBallast, MemoryBallast};
use crate::config_watch::ConfigWatcher;
use crate::health::{components, HealthRegistry};
use crate::metrics::MetricsSource;
use crate::models::{
    default_endpoints, EndpointSpec, LoadTargets, RequestStats, SharedInterval, StatusSnapshot,
    MAX_INTERVAL_SECS, MIN_INTERVAL_SECS,
};
use crate::observability::{ActuatorMetrics, StructuredLogger};
use crate::status::StatusPublisher;
use crate::worker;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{info, warn};

/// Minimum interval change worth applying; smaller deltas are churn
pub const INTERVAL_DEADBAND_SECS: f64 = 0.01;

/// Absolute CPU error above which the proportional correction takes over
const LARGE_ERROR_PERCENT: f64 = 10.0;

/// Gain of the proportional correction branch
const PROPORTIONAL_GAIN: f64 = 0.5;

/// Interval the piecewise law maps a CPU target to.
///
/// The bands are empirically tuned; endpoint cost is highly nonlinear in
/// request frequency near saturation.
pub fn target_interval(cpu_target: f64) -> f64 {
    if cpu_target <= 0.0 {
        // Near-silent: one request every 10s per unit weight
        10.0
    } else if cpu_target <= 50.0 {
        10.0 - (cpu_target / 50.0) * 9.0
    } else if cpu_target <= 75.0 {
        1.0 - ((cpu_target - 50.0) / 25.0) * 0.5
    } else if cpu_target <= 85.0 {
        0.5 - ((cpu_target - 75.0) / 10.0) * 0.2
    } else if cpu_target <= 95.0 {
        0.3 - ((cpu_target - 85.0) / 10.0) * 0.2
    } else {
        0.1 - ((cpu_target - 95.0) / 5.0) * 0.05
    }
}

/// Next request interval given the current one and a CPU reading.
///
/// Far off target (|error| > 10) a proportional correction is applied to the
/// current interval for fast convergence; close to target the interval snaps
/// to the piecewise law for smooth tracking. The two branches meet with a
/// small discontinuity at the threshold. The result is always clamped to
/// [0.05, 10.0].
pub fn next_interval(current: f64, cpu_target: f64, measured_cpu: f64) -> f64 {
    let error = cpu_target - measured_cpu;

    let raw = if error.abs() > LARGE_ERROR_PERCENT {
        current * (1.0 - error / 100.0 * PROPORTIONAL_GAIN)
    } else {
        target_interval(cpu_target)
    };

    raw.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS)
}

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Base URL of the exercised endpoint service
    pub base_url: String,
    /// Control loop period
    pub period: Duration,
    /// Path of the polled target config resource
    pub config_path: PathBuf,
    /// Path of the published status resource
    pub status_path: PathBuf,
    /// Path of the disk ballast file
    pub ballast_path: PathBuf,
    /// Worker replicas per endpoint
    pub workers_per_endpoint: usize,
    /// Targets applied until the config resource overrides them
    pub initial_targets: LoadTargets,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            period: Duration::from_secs(5),
            config_path: PathBuf::from("/tmp/load_actuator_config.json"),
            status_path: PathBuf::from("/tmp/load_actuator_status.json"),
            ballast_path: PathBuf::from("/tmp/load_actuator_disk_ballast.bin"),
            workers_per_endpoint: 2,
            initial_targets: LoadTargets::default(),
        }
    }
}

/// The load controller: owns targets, ballast, and the shared interval;
/// coordinates the worker pool and both actuators.
pub struct Controller {
    config: ControllerConfig,
    targets: LoadTargets,
    endpoints: Vec<EndpointSpec>,
    interval: Arc<SharedInterval>,
    stats: Arc<RequestStats>,
    metrics: Arc<dyn MetricsSource>,
    watcher: ConfigWatcher,
    publisher: StatusPublisher,
    memory_ballast: MemoryBallast,
    disk_ballast: DiskBallast,
    client: reqwest::Client,
    health: HealthRegistry,
    logger: StructuredLogger,
    gauges: ActuatorMetrics,
    workers_count: usize,
    started_at: Instant,
}

impl Controller {
    pub fn new(
        config: ControllerConfig,
        metrics: Arc<dyn MetricsSource>,
        health: HealthRegistry,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(worker::REQUEST_TIMEOUT)
            .build()
            .context("Failed to create worker HTTP client")?;

        let watcher = ConfigWatcher::new(&config.config_path);
        let publisher = StatusPublisher::new(&config.status_path);
        let disk_ballast = DiskBallast::new(&config.ballast_path);
        let logger = StructuredLogger::new(&config.base_url);
        let targets = config.initial_targets;

        Ok(Self {
            config,
            targets,
            endpoints: default_endpoints(),
            interval: Arc::new(SharedInterval::default()),
            stats: Arc::new(RequestStats::new()),
            metrics,
            watcher,
            publisher,
            memory_ballast: MemoryBallast::new(),
            disk_ballast,
            client,
            health,
            logger,
            gauges: ActuatorMetrics::new(),
            workers_count: 0,
            started_at: Instant::now(),
        })
    }

    pub fn targets(&self) -> LoadTargets {
        self.targets
    }

    pub fn interval(&self) -> Arc<SharedInterval> {
        self.interval.clone()
    }

    pub fn endpoints(&self) -> &[EndpointSpec] {
        &self.endpoints
    }

    /// Run the control loop until the shutdown channel fires, then stop the
    /// workers and release all ballast.
    pub async fn run(mut self, shutdown: broadcast::Sender<()>) {
        self.started_at = Instant::now();

        let handles = worker::spawn_workers(
            self.client.clone(),
            &self.config.base_url,
            &self.endpoints,
            self.config.workers_per_endpoint,
            self.interval.clone(),
            self.stats.clone(),
            &shutdown,
        );
        self.workers_count = handles.len();
        self.health.set_healthy(components::WORKERS).await;

        self.logger.log_startup(
            env!("CARGO_PKG_VERSION"),
            &self.targets,
            self.endpoints.len(),
            self.workers_count,
        );

        let mut ticker = tokio::time::interval(self.config.period);
        let mut shutdown_rx = shutdown.subscribe();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.cycle().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Stopping control loop");
                    break;
                }
            }
        }

        // Workers exit on the same broadcast; await them before releasing
        // the resources they no longer drive.
        for handle in handles {
            let _ = handle.await;
        }
        self.cleanup().await;
    }

    /// One control cycle. Never fails; every error is contained here.
    async fn cycle(&mut self) {
        if let Some(next) = self.watcher.poll(&self.targets).await {
            if next != self.targets {
                self.logger.log_target_update(&self.targets, &next);
            }
            self.targets = next;
        }

        let cpu = self.metrics.cpu_percent().await;
        let memory = self.metrics.memory_percent().await;
        let disk = self.metrics.disk_percent().await;

        let snapshot = self.snapshot(cpu, memory, disk).await;
        if let Err(e) = self.publisher.publish(&snapshot).await {
            warn!(error = %e, "Failed to publish status snapshot");
        }

        self.adjust_interval(cpu);
        self.adjust_memory(memory).await;
        self.adjust_disk(disk).await;

        let (total, success, failed) = self.stats.snapshot();
        self.gauges.set_request_counts(total, success, failed);
        self.gauges.set_targets(&self.targets);
        self.gauges.inc_control_cycles();

        self.logger.log_cycle(
            self.started_at.elapsed().as_secs(),
            (cpu, memory, disk),
            &self.targets,
            total,
            self.interval.get(),
        );
    }

    /// Apply the CPU control law to the shared interval
    fn adjust_interval(&mut self, measured_cpu: f64) {
        let current = self.interval.get();
        let next = next_interval(current, self.targets.cpu, measured_cpu);

        if (next - current).abs() > INTERVAL_DEADBAND_SECS {
            self.interval.set(next);
            self.gauges.set_request_interval(next);
            self.logger
                .log_interval_change(current, next, measured_cpu, self.targets.cpu);
        }
    }

    async fn adjust_memory(&mut self, measured_percent: f64) {
        let total = self.metrics.total_memory_bytes().await;
        if total == 0 {
            self.health
                .set_degraded(components::METRICS_READER, "No signal from metrics source")
                .await;
        } else {
            self.health.set_healthy(components::METRICS_READER).await;
        }

        let action = self.memory_ballast.adjust(self.targets.memory, total);
        let held = self.memory_ballast.total_bytes();
        self.gauges.set_memory_ballast_bytes(held);
        self.logger
            .log_ballast("memory", action, held, measured_percent, self.targets.memory);
    }

    async fn adjust_disk(&mut self, measured_percent: f64) {
        let total = self.metrics.total_disk_bytes().await;

        match self.disk_ballast.adjust(self.targets.disk, total).await {
            Ok(action) => {
                let held = self.disk_ballast.current_bytes().await;
                self.gauges.set_disk_ballast_bytes(held);
                self.health.set_healthy(components::BALLAST).await;
                self.logger
                    .log_ballast("disk", action, held, measured_percent, self.targets.disk);
            }
            Err(e) => {
                self.health
                    .set_unhealthy(components::BALLAST, e.to_string())
                    .await;
                self.logger.log_ballast_error("disk", &e);
            }
        }
    }

    async fn snapshot(&self, cpu: f64, memory: f64, disk: f64) -> StatusSnapshot {
        let (total, success, failed) = self.stats.snapshot();
        let memory_mb = self.memory_ballast.total_bytes() as f64 / 1024.0 / 1024.0;
        let disk_mb = self.disk_ballast.current_bytes().await as f64 / 1024.0 / 1024.0;

        StatusSnapshot {
            running: true,
            target_cpu: self.targets.cpu,
            target_memory: self.targets.memory,
            target_disk: self.targets.disk,
            current_request_interval: round_to(self.interval.get(), 3),
            memory_ballast_mb: round_to(memory_mb, 1),
            disk_ballast_mb: round_to(disk_mb, 1),
            active_endpoints: self.endpoints.iter().map(|e| e.name.to_string()).collect(),
            workers_count: self.workers_count,
            uptime_seconds: round_to(self.started_at.elapsed().as_secs_f64(), 1),
            total_requests: total,
            successful_requests: success,
            failed_requests: failed,
            current_cpu: round_to(cpu, 1),
            current_memory: round_to(memory, 1),
            current_disk: round_to(disk, 1),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Release all ballast. Idempotent; nothing leaks on the happy path.
    async fn cleanup(&mut self) {
        let released = self.memory_ballast.release_all();
        info!(
            released_mb = released as f64 / 1024.0 / 1024.0,
            "Released memory ballast"
        );

        match self.disk_ballast.remove().await {
            Ok(true) => info!(
                path = %self.disk_ballast.path().display(),
                "Removed disk ballast file"
            ),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Failed to remove disk ballast file"),
        }

        info!("Load controller stopped");
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
