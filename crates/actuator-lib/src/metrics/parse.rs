//! Prometheus text-exposition parsing
//!
//! Extracts the handful of series the controller needs:
//! - `node_cpu_seconds_total` time accumulators, split by the `mode="idle"` label
//! - `node_memory_MemTotal_bytes` / `node_memory_MemAvailable_bytes` gauges
//! - `node_filesystem_size_bytes` / `node_filesystem_avail_bytes` gauges,
//!   filtered to the root mountpoint

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExpositionError {
    #[error("no usable {0} samples in exposition payload")]
    MissingSeries(&'static str),
    #[error("{0} reported a zero total")]
    ZeroTotal(&'static str),
}

/// CPU utilization percent from accumulated per-mode CPU seconds
pub fn cpu_percent(text: &str) -> Result<f64, ExpositionError> {
    let mut idle = 0.0;
    let mut total = 0.0;

    for line in text.lines() {
        if !line.starts_with("node_cpu_seconds_total") {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() >= 2 {
            if let Ok(value) = parts[1].parse::<f64>() {
                total += value;
                if parts[0].contains("mode=\"idle\"") {
                    idle += value;
                }
            }
        }
    }

    if total <= 0.0 {
        return Err(ExpositionError::ZeroTotal("node_cpu_seconds_total"));
    }
    Ok((total - idle) / total * 100.0)
}

/// Memory utilization percent from MemTotal/MemAvailable
pub fn memory_percent(text: &str) -> Result<f64, ExpositionError> {
    let total = gauge_value(text, "node_memory_MemTotal_bytes")
        .ok_or(ExpositionError::MissingSeries("node_memory_MemTotal_bytes"))?;
    let available = gauge_value(text, "node_memory_MemAvailable_bytes").ok_or(
        ExpositionError::MissingSeries("node_memory_MemAvailable_bytes"),
    )?;

    if total <= 0.0 {
        return Err(ExpositionError::ZeroTotal("node_memory_MemTotal_bytes"));
    }
    Ok((total - available) / total * 100.0)
}

/// Root-filesystem utilization percent from size/avail gauges
pub fn disk_percent(text: &str) -> Result<f64, ExpositionError> {
    let size = root_fs_value(text, "node_filesystem_size_bytes")
        .ok_or(ExpositionError::MissingSeries("node_filesystem_size_bytes"))?;
    let avail = root_fs_value(text, "node_filesystem_avail_bytes").ok_or(
        ExpositionError::MissingSeries("node_filesystem_avail_bytes"),
    )?;

    if size <= 0.0 {
        return Err(ExpositionError::ZeroTotal("node_filesystem_size_bytes"));
    }
    Ok((size - avail) / size * 100.0)
}

/// Total system memory in bytes
pub fn total_memory_bytes(text: &str) -> Result<u64, ExpositionError> {
    gauge_value(text, "node_memory_MemTotal_bytes")
        .map(|v| v as u64)
        .ok_or(ExpositionError::MissingSeries("node_memory_MemTotal_bytes"))
}

/// Total root-filesystem size in bytes
pub fn total_disk_bytes(text: &str) -> Result<u64, ExpositionError> {
    root_fs_value(text, "node_filesystem_size_bytes")
        .map(|v| v as u64)
        .ok_or(ExpositionError::MissingSeries("node_filesystem_size_bytes"))
}

/// First sample value for a plain (label-free lookup) gauge
fn gauge_value(text: &str, name: &str) -> Option<f64> {
    for line in text.lines() {
        if line.starts_with(name) {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2 {
                if let Ok(value) = parts[1].parse::<f64>() {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// First sample value for a filesystem gauge on the root mountpoint
fn root_fs_value(text: &str, name: &str) -> Option<f64> {
    for line in text.lines() {
        if !line.starts_with(name) {
            continue;
        }
        if !(line.contains("mountpoint=\"/\"") && line.contains("fstype=")) {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() >= 2 {
            if let Ok(value) = parts[1].parse::<f64>() {
                return Some(value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# HELP node_cpu_seconds_total Seconds the CPUs spent in each mode.
# TYPE node_cpu_seconds_total counter
node_cpu_seconds_total{cpu="0",mode="idle"} 300.0
node_cpu_seconds_total{cpu="0",mode="user"} 80.0
node_cpu_seconds_total{cpu="0",mode="system"} 20.0
node_cpu_seconds_total{cpu="1",mode="idle"} 300.0
node_cpu_seconds_total{cpu="1",mode="user"} 90.0
node_cpu_seconds_total{cpu="1",mode="system"} 10.0
# HELP node_memory_MemTotal_bytes Memory information field MemTotal_bytes.
node_memory_MemTotal_bytes 8.589934592e+09
node_memory_MemAvailable_bytes 4.294967296e+09
# HELP node_filesystem_size_bytes Filesystem size in bytes.
node_filesystem_size_bytes{device="tmpfs",fstype="tmpfs",mountpoint="/run"} 1.0e+09
node_filesystem_size_bytes{device="/dev/sda1",fstype="ext4",mountpoint="/"} 1.07374182e+11
node_filesystem_avail_bytes{device="tmpfs",fstype="tmpfs",mountpoint="/run"} 9.0e+08
node_filesystem_avail_bytes{device="/dev/sda1",fstype="ext4",mountpoint="/"} 8.589934592e+10
"#;

    #[test]
    fn test_cpu_percent() {
        // total = 800, idle = 600 => 25% busy
        let cpu = cpu_percent(SAMPLE).unwrap();
        assert!((cpu - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_cpu_percent_no_samples() {
        assert!(matches!(
            cpu_percent("node_memory_MemTotal_bytes 1\n"),
            Err(ExpositionError::ZeroTotal(_))
        ));
    }

    #[test]
    fn test_memory_percent() {
        // 8GiB total, 4GiB available => 50% used
        let mem = memory_percent(SAMPLE).unwrap();
        assert!((mem - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_memory_percent_missing_series() {
        assert!(matches!(
            memory_percent("node_memory_MemTotal_bytes 100\n"),
            Err(ExpositionError::MissingSeries(_))
        ));
    }

    #[test]
    fn test_disk_percent_filters_root_mountpoint() {
        // Root fs: 100GiB size, 80GiB avail => 20% used; /run must be ignored
        let disk = disk_percent(SAMPLE).unwrap();
        assert!((disk - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_bytes() {
        assert_eq!(total_memory_bytes(SAMPLE).unwrap(), 8_589_934_592);
        assert_eq!(total_disk_bytes(SAMPLE).unwrap(), 107_374_182_000);
    }

    #[test]
    fn test_malformed_values_are_skipped() {
        let text = "node_cpu_seconds_total{mode=\"idle\"} not-a-number\n\
                    node_cpu_seconds_total{mode=\"user\"} 100.0\n";
        let cpu = cpu_percent(text).unwrap();
        assert!((cpu - 100.0).abs() < 1e-9);
    }
}
