//! Observability infrastructure for the load actuator
//!
//! Provides:
//! - Prometheus self-metrics (request counts, request interval, ballast sizes)
//! - Structured event logging with tracing

use crate::ballast::BallastAction;
use crate::models::LoadTargets;
use prometheus::{
    register_counter, register_gauge, register_int_gauge, Counter, Gauge, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ActuatorMetricsInner> = OnceLock::new();

struct ActuatorMetricsInner {
    request_interval_seconds: Gauge,
    requests_total: IntGauge,
    requests_successful: IntGauge,
    requests_failed: IntGauge,
    memory_ballast_bytes: IntGauge,
    disk_ballast_bytes: IntGauge,
    target_cpu_percent: Gauge,
    target_memory_percent: Gauge,
    target_disk_percent: Gauge,
    control_cycles_total: Counter,
}

impl ActuatorMetricsInner {
    fn new() -> Self {
        Self {
            request_interval_seconds: register_gauge!(
                "load_actuator_request_interval_seconds",
                "Current base pause between worker requests"
            )
            .expect("Failed to register request_interval_seconds"),

            requests_total: register_int_gauge!(
                "load_actuator_requests_total",
                "Total requests issued against the exercised endpoints"
            )
            .expect("Failed to register requests_total"),

            requests_successful: register_int_gauge!(
                "load_actuator_requests_successful_total",
                "Requests that returned HTTP 200"
            )
            .expect("Failed to register requests_successful"),

            requests_failed: register_int_gauge!(
                "load_actuator_requests_failed_total",
                "Requests that errored or returned a non-200 status"
            )
            .expect("Failed to register requests_failed"),

            memory_ballast_bytes: register_int_gauge!(
                "load_actuator_memory_ballast_bytes",
                "Bytes currently held as in-process memory ballast"
            )
            .expect("Failed to register memory_ballast_bytes"),

            disk_ballast_bytes: register_int_gauge!(
                "load_actuator_disk_ballast_bytes",
                "Size of the on-disk ballast file"
            )
            .expect("Failed to register disk_ballast_bytes"),

            target_cpu_percent: register_gauge!(
                "load_actuator_target_cpu_percent",
                "Operator CPU utilization target"
            )
            .expect("Failed to register target_cpu_percent"),

            target_memory_percent: register_gauge!(
                "load_actuator_target_memory_percent",
                "Operator memory utilization target"
            )
            .expect("Failed to register target_memory_percent"),

            target_disk_percent: register_gauge!(
                "load_actuator_target_disk_percent",
                "Operator disk utilization target"
            )
            .expect("Failed to register target_disk_percent"),

            control_cycles_total: register_counter!(
                "load_actuator_control_cycles_total",
                "Completed control loop cycles"
            )
            .expect("Failed to register control_cycles_total"),
        }
    }
}

/// Prometheus metrics for the actuator
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct ActuatorMetrics {
    _private: (),
}

impl Default for ActuatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorMetrics {
    /// Create a metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ActuatorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ActuatorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn set_request_interval(&self, secs: f64) {
        self.inner().request_interval_seconds.set(secs);
    }

    /// Mirror the worker-side request counters into the exposition
    pub fn set_request_counts(&self, total: u64, successful: u64, failed: u64) {
        self.inner().requests_total.set(total as i64);
        self.inner().requests_successful.set(successful as i64);
        self.inner().requests_failed.set(failed as i64);
    }

    pub fn set_memory_ballast_bytes(&self, bytes: u64) {
        self.inner().memory_ballast_bytes.set(bytes as i64);
    }

    pub fn set_disk_ballast_bytes(&self, bytes: u64) {
        self.inner().disk_ballast_bytes.set(bytes as i64);
    }

    pub fn set_targets(&self, targets: &LoadTargets) {
        self.inner().target_cpu_percent.set(targets.cpu);
        self.inner().target_memory_percent.set(targets.memory);
        self.inner().target_disk_percent.set(targets.disk);
    }

    pub fn inc_control_cycles(&self) {
        self.inner().control_cycles_total.inc();
    }
}

/// Structured logger for actuator events
///
/// Consistent event-tagged logging for target changes, interval changes,
/// ballast adjustments, and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    base_url: String,
}

impl StructuredLogger {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Log actuator startup
    pub fn log_startup(&self, version: &str, targets: &LoadTargets, endpoints: usize, workers: usize) {
        info!(
            event = "actuator_started",
            base_url = %self.base_url,
            actuator_version = %version,
            target_cpu = targets.cpu,
            target_memory = targets.memory,
            target_disk = targets.disk,
            endpoints = endpoints,
            workers = workers,
            "Load actuator started"
        );
    }

    /// Log actuator shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "actuator_shutdown",
            base_url = %self.base_url,
            reason = %reason,
            "Load actuator shutting down"
        );
    }

    /// Log a target update picked up from the config resource
    pub fn log_target_update(&self, previous: &LoadTargets, next: &LoadTargets) {
        info!(
            event = "targets_updated",
            base_url = %self.base_url,
            target_cpu = next.cpu,
            target_memory = next.memory,
            target_disk = next.disk,
            previous_cpu = previous.cpu,
            previous_memory = previous.memory,
            previous_disk = previous.disk,
            "Utilization targets updated"
        );
    }

    /// Log a request-interval change from the CPU control law
    pub fn log_interval_change(&self, previous: f64, next: f64, measured_cpu: f64, target_cpu: f64) {
        info!(
            event = "interval_adjusted",
            base_url = %self.base_url,
            previous_secs = previous,
            next_secs = next,
            measured_cpu = measured_cpu,
            target_cpu = target_cpu,
            "Adjusted request interval"
        );
    }

    /// Log a ballast adjustment
    pub fn log_ballast(
        &self,
        kind: &'static str,
        action: BallastAction,
        ballast_bytes: u64,
        measured_percent: f64,
        target_percent: f64,
    ) {
        let mb = |bytes: u64| bytes as f64 / 1024.0 / 1024.0;
        match action {
            BallastAction::Idle => {}
            BallastAction::Grew(bytes) => info!(
                event = "ballast_grew",
                kind = kind,
                grew_mb = mb(bytes),
                ballast_mb = mb(ballast_bytes),
                measured_percent = measured_percent,
                target_percent = target_percent,
                "Grew ballast"
            ),
            BallastAction::Shrank(bytes) => info!(
                event = "ballast_shrank",
                kind = kind,
                shrank_mb = mb(bytes),
                ballast_mb = mb(ballast_bytes),
                measured_percent = measured_percent,
                target_percent = target_percent,
                "Released ballast"
            ),
        }
    }

    /// Log a ballast actuation failure (skipped this cycle, retried next)
    pub fn log_ballast_error(&self, kind: &'static str, error: &anyhow::Error) {
        warn!(
            event = "ballast_error",
            kind = kind,
            error = %error,
            "Ballast adjustment failed, retrying next cycle"
        );
    }

    /// Log the per-cycle status summary
    pub fn log_cycle(
        &self,
        uptime_secs: u64,
        measured: (f64, f64, f64),
        targets: &LoadTargets,
        total_requests: u64,
        interval_secs: f64,
    ) {
        let (cpu, memory, disk) = measured;
        info!(
            event = "control_cycle",
            uptime_secs = uptime_secs,
            cpu = cpu,
            target_cpu = targets.cpu,
            memory = memory,
            target_memory = targets.memory,
            disk = disk,
            target_disk = targets.disk,
            total_requests = total_requests,
            interval_secs = interval_secs,
            "Control cycle complete"
        );
    }
}
