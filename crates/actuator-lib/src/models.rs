//! Core data model for the load actuator

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lower clamp for the request interval in seconds
pub const MIN_INTERVAL_SECS: f64 = 0.05;
/// Upper clamp for the request interval in seconds
pub const MAX_INTERVAL_SECS: f64 = 10.0;

/// Operator-specified utilization targets, percent of total capacity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadTargets {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

impl Default for LoadTargets {
    fn default() -> Self {
        Self {
            cpu: 50.0,
            memory: 50.0,
            disk: 50.0,
        }
    }
}

/// HTTP method used against a test endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

/// One exercised test endpoint
///
/// Invariant: `weight > 0`. Higher weight means a shorter per-worker sleep
/// and therefore more frequent calls.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointSpec {
    pub name: &'static str,
    pub method: HttpMethod,
    pub path: &'static str,
    pub weight: f64,
}

impl EndpointSpec {
    pub const fn new(name: &'static str, method: HttpMethod, path: &'static str, weight: f64) -> Self {
        Self {
            name,
            method,
            path,
            weight,
        }
    }
}

/// The fixed endpoint table, descending weight. The heaviest endpoints
/// (browser-backed search) carry the lowest weight.
pub fn default_endpoints() -> Vec<EndpointSpec> {
    vec![
        EndpointSpec::new("health", HttpMethod::Get, "/health", 5.0),
        EndpointSpec::new("network", HttpMethod::Post, "/network", 4.0),
        EndpointSpec::new("action", HttpMethod::Post, "/action", 3.0),
        EndpointSpec::new("terminal", HttpMethod::Post, "/terminal", 2.0),
        EndpointSpec::new("sum", HttpMethod::Get, "/sum", 1.0),
        EndpointSpec::new("search", HttpMethod::Post, "/search", 0.5),
    ]
}

/// The request interval shared between the controller and the worker pool.
///
/// Single writer (controller), many readers (workers). Stored as the bit
/// pattern of an `f64` in an `AtomicU64` with relaxed ordering: a worker may
/// pace one cycle on a stale value, which is an accepted approximation.
/// Blocking synchronization here would change worker pacing semantics.
#[derive(Debug)]
pub struct SharedInterval(AtomicU64);

impl SharedInterval {
    pub fn new(secs: f64) -> Self {
        Self(AtomicU64::new(secs.to_bits()))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, secs: f64) {
        self.0.store(secs.to_bits(), Ordering::Relaxed);
    }
}

impl Default for SharedInterval {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Request counters, incremented concurrently by all workers and read by the
/// controller. Counts may lag in-flight increments; they never tear.
#[derive(Debug, Default)]
pub struct RequestStats {
    total: AtomicU64,
    success: AtomicU64,
    failed: AtomicU64,
}

impl RequestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed request by response status
    pub fn record_response(&self, ok: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if ok {
            self.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a request that failed before producing a response
    pub fn record_error(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Current (total, successful, failed) counts
    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.total.load(Ordering::Relaxed),
            self.success.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }
}

/// Point-in-time controller state written to the status resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub running: bool,
    pub target_cpu: f64,
    pub target_memory: f64,
    pub target_disk: f64,
    pub current_request_interval: f64,
    pub memory_ballast_mb: f64,
    pub disk_ballast_mb: f64,
    pub active_endpoints: Vec<String>,
    pub workers_count: usize,
    pub uptime_seconds: f64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub current_cpu: f64,
    pub current_memory: f64,
    pub current_disk: f64,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets() {
        let targets = LoadTargets::default();
        assert_eq!(targets.cpu, 50.0);
        assert_eq!(targets.memory, 50.0);
        assert_eq!(targets.disk, 50.0);
    }

    #[test]
    fn test_endpoint_table() {
        let endpoints = default_endpoints();
        assert_eq!(endpoints.len(), 6);

        // Weights strictly descending, all positive
        for pair in endpoints.windows(2) {
            assert!(pair[0].weight > pair[1].weight);
        }
        assert!(endpoints.iter().all(|e| e.weight > 0.0));

        assert_eq!(endpoints[0].name, "health");
        assert_eq!(endpoints[0].method, HttpMethod::Get);
        assert_eq!(endpoints[5].name, "search");
        assert_eq!(endpoints[5].weight, 0.5);
    }

    #[test]
    fn test_shared_interval_round_trip() {
        let interval = SharedInterval::new(1.0);
        assert_eq!(interval.get(), 1.0);

        interval.set(0.05);
        assert_eq!(interval.get(), 0.05);

        interval.set(10.0);
        assert_eq!(interval.get(), 10.0);
    }

    #[test]
    fn test_shared_interval_across_tasks() {
        use std::sync::Arc;

        let interval = Arc::new(SharedInterval::new(1.0));
        let reader = interval.clone();

        interval.set(0.25);
        let handle = std::thread::spawn(move || reader.get());
        assert_eq!(handle.join().unwrap(), 0.25);
    }

    #[test]
    fn test_request_stats_counting() {
        let stats = RequestStats::new();
        stats.record_response(true);
        stats.record_response(true);
        stats.record_response(false);
        stats.record_error();

        let (total, success, failed) = stats.snapshot();
        assert_eq!(total, 3);
        assert_eq!(success, 2);
        assert_eq!(failed, 2);
    }

    #[test]
    fn test_status_snapshot_field_names() {
        let snapshot = StatusSnapshot {
            running: true,
            target_cpu: 50.0,
            target_memory: 50.0,
            target_disk: 50.0,
            current_request_interval: 1.0,
            memory_ballast_mb: 0.0,
            disk_ballast_mb: 0.0,
            active_endpoints: vec!["health".to_string()],
            workers_count: 12,
            uptime_seconds: 5.0,
            total_requests: 10,
            successful_requests: 9,
            failed_requests: 1,
            current_cpu: 42.0,
            current_memory: 30.0,
            current_disk: 12.0,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["running"], true);
        assert_eq!(json["current_request_interval"], 1.0);
        assert_eq!(json["workers_count"], 12);
        assert_eq!(json["successful_requests"], 9);
    }

    #[test]
    fn test_http_method_serialization() {
        assert_eq!(serde_json::to_string(&HttpMethod::Get).unwrap(), "\"GET\"");
        assert_eq!(serde_json::to_string(&HttpMethod::Post).unwrap(), "\"POST\"");
    }
}
