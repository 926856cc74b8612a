//! Resource ballast actuators
//!
//! Ballast is capacity held purely to raise a utilization metric: owned,
//! touched memory buffers and a single filler file on disk. Both actuators
//! are level-triggered: every cycle recomputes grow/shrink/idle from the
//! sign and magnitude of `target_bytes - current_bytes`, with a shared
//! hysteresis band so small deltas never cause thrash.

mod disk;
mod memory;

pub use disk::{DiskBallast, DEFAULT_GROW_STEP_BYTES};
pub use memory::{MemoryBallast, DEFAULT_CHUNK_BYTES};

/// Dead-zone below which an actuator leaves the ballast untouched
pub const HYSTERESIS_BYTES: u64 = 100 * 1024 * 1024;

/// Outcome of one actuation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallastAction {
    /// Inside the hysteresis band, or no capacity signal
    Idle,
    /// Grew the ballast by this many bytes
    Grew(u64),
    /// Released this many bytes
    Shrank(u64),
}

/// Absolute byte target for a percentage of total capacity
pub(crate) fn target_bytes(total_bytes: u64, target_percent: f64) -> u64 {
    (total_bytes as f64 * target_percent / 100.0) as u64
}
