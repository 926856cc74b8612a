//! Request worker pool
//!
//! One long-lived task per (endpoint, replica). Each cycle issues a single
//! HTTP call, records the outcome, and sleeps for the shared request
//! interval divided by the endpoint weight. Workers never talk to each
//! other; their only coupling to the controller is the shared interval and
//! the stat counters.

use crate::models::{EndpointSpec, HttpMethod, RequestStats, SharedInterval};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Per-request timeout for exercised endpoints
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum sleep after a request that failed to produce a response
pub const FAILURE_BACKOFF: Duration = Duration::from_secs(1);

/// Sleep between requests for a worker of the given weight
pub fn pause_for(interval_secs: f64, weight: f64) -> Duration {
    Duration::from_secs_f64(interval_secs / weight)
}

/// Spawn `replicas` workers for every endpoint.
///
/// Workers exit when the shutdown channel fires; a network error never
/// terminates a worker.
pub fn spawn_workers(
    client: reqwest::Client,
    base_url: &str,
    endpoints: &[EndpointSpec],
    replicas: usize,
    interval: Arc<SharedInterval>,
    stats: Arc<RequestStats>,
    shutdown: &broadcast::Sender<()>,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(endpoints.len() * replicas);

    for endpoint in endpoints {
        for replica in 0..replicas {
            let worker = Worker {
                client: client.clone(),
                url: format!("{}{}", base_url, endpoint.path),
                name: endpoint.name,
                method: endpoint.method,
                weight: endpoint.weight,
                replica,
                interval: interval.clone(),
                stats: stats.clone(),
            };
            handles.push(tokio::spawn(worker.run(shutdown.subscribe())));
        }
    }

    info!(workers = handles.len(), replicas_per_endpoint = replicas, "Spawned request workers");
    handles
}

struct Worker {
    client: reqwest::Client,
    url: String,
    name: &'static str,
    method: HttpMethod,
    weight: f64,
    replica: usize,
    interval: Arc<SharedInterval>,
    stats: Arc<RequestStats>,
}

impl Worker {
    async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        debug!(endpoint = self.name, replica = self.replica, "Request worker started");

        loop {
            let errored = match invoke(&self.client, &self.url, self.method).await {
                Ok(status) => {
                    self.stats.record_response(status == reqwest::StatusCode::OK);
                    false
                }
                Err(e) => {
                    self.stats.record_error();
                    debug!(
                        endpoint = self.name,
                        replica = self.replica,
                        error = %e,
                        "Request failed"
                    );
                    true
                }
            };

            let mut pause = pause_for(self.interval.get(), self.weight);
            if errored {
                pause = pause.max(FAILURE_BACKOFF);
            }

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = shutdown.recv() => {
                    debug!(endpoint = self.name, replica = self.replica, "Request worker stopping");
                    break;
                }
            }
        }
    }
}

/// Issue one call with the endpoint's method; every endpoint goes through
/// this same path, the method is data rather than a per-endpoint branch.
async fn invoke(
    client: &reqwest::Client,
    url: &str,
    method: HttpMethod,
) -> reqwest::Result<reqwest::StatusCode> {
    let request = match method {
        HttpMethod::Get => client.get(url),
        HttpMethod::Post => client.post(url),
    };
    let response = request.send().await?;
    Ok(response.status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_endpoints;

    #[test]
    fn test_pause_scales_inversely_with_weight() {
        // Higher weight => shorter sleep => more frequent calls
        assert_eq!(pause_for(1.0, 5.0), Duration::from_millis(200));
        assert_eq!(pause_for(1.0, 0.5), Duration::from_secs(2));
        assert_eq!(pause_for(10.0, 1.0), Duration::from_secs(10));
    }

    #[test]
    fn test_pause_at_interval_bounds() {
        // Fastest pacing: clamped interval floor on the heaviest weight
        let fastest = pause_for(0.05, 5.0);
        assert_eq!(fastest, Duration::from_millis(10));

        let slowest = pause_for(10.0, 0.5);
        assert_eq!(slowest, Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_workers_stop_on_shutdown() {
        let (shutdown_tx, _) = broadcast::channel(1);
        let interval = Arc::new(SharedInterval::new(10.0));
        let stats = Arc::new(RequestStats::new());

        // Unreachable base URL: every request errors, workers must keep
        // looping until told to stop
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let handles = spawn_workers(
            client,
            "http://127.0.0.1:1",
            &default_endpoints(),
            2,
            interval,
            stats.clone(),
            &shutdown_tx,
        );
        assert_eq!(handles.len(), 12);

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(()).unwrap();

        for handle in handles {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("worker did not stop after shutdown")
                .unwrap();
        }

        // Failures were counted, nothing succeeded
        let (_, success, failed) = stats.snapshot();
        assert_eq!(success, 0);
        assert!(failed > 0);
    }
}
