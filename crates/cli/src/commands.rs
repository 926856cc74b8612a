//! CLI command implementations

use crate::output::{format_mb, format_percent_pair, print_error, print_success, OutputFormat};
use actuator_lib::models::StatusSnapshot;
use anyhow::{Context, Result};
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Row for the status table
#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Write target updates into the config file polled by the actuator.
///
/// Unspecified targets already present in the file are preserved; the
/// actuator itself keeps prior values for fields that remain absent.
pub fn set_targets(
    config_path: &Path,
    cpu: Option<f64>,
    memory: Option<f64>,
    disk: Option<f64>,
) -> Result<()> {
    if cpu.is_none() && memory.is_none() && disk.is_none() {
        anyhow::bail!("Nothing to set: pass at least one of --cpu, --memory, --disk");
    }

    let mut config = match std::fs::read_to_string(config_path) {
        Ok(raw) => serde_json::from_str::<serde_json::Value>(&raw)
            .unwrap_or_else(|_| serde_json::json!({})),
        Err(_) => serde_json::json!({}),
    };
    let fields = config
        .as_object_mut()
        .context("Config file is not a JSON object")?;

    for (key, value) in [
        ("target_cpu", cpu),
        ("target_memory", memory),
        ("target_disk", disk),
    ] {
        if let Some(percent) = value {
            if !(0.0..=100.0).contains(&percent) {
                anyhow::bail!("{} must be between 0 and 100, got {}", key, percent);
            }
            fields.insert(key.to_string(), serde_json::json!(percent));
        }
    }
    fields.insert(
        "updated_at".to_string(),
        serde_json::json!(chrono::Utc::now().to_rfc3339()),
    );

    let body = serde_json::to_string_pretty(&config)?;
    std::fs::write(config_path, body)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    print_success(&format!("Targets written to {}", config_path.display()));
    Ok(())
}

/// Read and render the status snapshot published by the actuator
pub fn show_status(status_path: &Path, format: OutputFormat) -> Result<()> {
    let raw = std::fs::read_to_string(status_path).with_context(|| {
        format!(
            "No status at {} (is the actuator running?)",
            status_path.display()
        )
    })?;

    match format {
        OutputFormat::Json => {
            println!("{}", raw.trim_end());
        }
        OutputFormat::Table => {
            let status: StatusSnapshot =
                serde_json::from_str(&raw).context("Malformed status snapshot")?;
            let table = Table::new(status_rows(&status))
                .with(Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }
    Ok(())
}

fn status_rows(status: &StatusSnapshot) -> Vec<StatusRow> {
    vec![
        StatusRow {
            field: "Running",
            value: status.running.to_string(),
        },
        StatusRow {
            field: "CPU (now/target)",
            value: format_percent_pair(status.current_cpu, status.target_cpu),
        },
        StatusRow {
            field: "Memory (now/target)",
            value: format_percent_pair(status.current_memory, status.target_memory),
        },
        StatusRow {
            field: "Disk (now/target)",
            value: format_percent_pair(status.current_disk, status.target_disk),
        },
        StatusRow {
            field: "Request interval",
            value: format!("{:.3}s", status.current_request_interval),
        },
        StatusRow {
            field: "Memory ballast",
            value: format_mb(status.memory_ballast_mb),
        },
        StatusRow {
            field: "Disk ballast",
            value: format_mb(status.disk_ballast_mb),
        },
        StatusRow {
            field: "Workers",
            value: status.workers_count.to_string(),
        },
        StatusRow {
            field: "Endpoints",
            value: status.active_endpoints.join(", "),
        },
        StatusRow {
            field: "Requests (ok/failed)",
            value: format!(
                "{} ({}/{})",
                status.total_requests, status.successful_requests, status.failed_requests
            ),
        },
        StatusRow {
            field: "Uptime",
            value: format!("{:.0}s", status.uptime_seconds),
        },
        StatusRow {
            field: "As of",
            value: status.timestamp.clone(),
        },
    ]
}

/// Probe the actuator's health endpoint
pub async fn check_health(api_url: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .context("Failed to create HTTP client")?;

    let url = format!("{}/healthz", api_url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status.is_success() {
        print_success(&format!("Actuator healthy ({})", status));
    } else {
        print_error(&format!("Actuator unhealthy ({})", status));
    }
    if !body.is_empty() {
        println!("{}", body);
    }
    Ok(())
}
