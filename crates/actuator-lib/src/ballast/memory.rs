//! Memory ballast actuator
//!
//! Holds an ordered list of owned byte buffers. Growth appends one chunk per
//! cycle; shrink pops the most recently added chunk (LIFO), which releases in
//! O(1) without partial-chunk accounting. Every 4KB page of a new chunk is
//! written so the allocation is physically committed rather than lazily
//! mapped.

use super::{target_bytes, BallastAction, HYSTERESIS_BYTES};

/// Maximum bytes allocated per grow step
pub const DEFAULT_CHUNK_BYTES: usize = 100 * 1024 * 1024;

const PAGE_BYTES: usize = 4096;

/// In-process memory ballast, owned by the controller task only
pub struct MemoryBallast {
    chunks: Vec<Vec<u8>>,
    chunk_bytes: usize,
    hysteresis_bytes: u64,
}

impl MemoryBallast {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CHUNK_BYTES, HYSTERESIS_BYTES)
    }

    /// Create with custom step/hysteresis sizes (for testing)
    pub fn with_limits(chunk_bytes: usize, hysteresis_bytes: u64) -> Self {
        Self {
            chunks: Vec::new(),
            chunk_bytes,
            hysteresis_bytes,
        }
    }

    /// Total bytes currently held
    pub fn total_bytes(&self) -> u64 {
        self.chunks.iter().map(|c| c.len() as u64).sum()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Move the ballast one step toward `target_percent` of `total_bytes`.
    ///
    /// No-op when `total_bytes` is zero (no capacity signal) or the delta is
    /// within the hysteresis band.
    pub fn adjust(&mut self, target_percent: f64, total_bytes: u64) -> BallastAction {
        if total_bytes == 0 {
            return BallastAction::Idle;
        }

        let target = target_bytes(total_bytes, target_percent);
        let current = self.total_bytes();
        let delta = target as i64 - current as i64;

        if delta.unsigned_abs() <= self.hysteresis_bytes {
            return BallastAction::Idle;
        }

        if delta > 0 {
            let size = (delta as u64).min(self.chunk_bytes as u64) as usize;
            self.chunks.push(allocate_touched(size));
            BallastAction::Grew(size as u64)
        } else {
            match self.chunks.pop() {
                Some(chunk) => BallastAction::Shrank(chunk.len() as u64),
                None => BallastAction::Idle,
            }
        }
    }

    /// Drop all held chunks, returning the number of bytes released
    pub fn release_all(&mut self) -> u64 {
        let released = self.total_bytes();
        self.chunks.clear();
        released
    }
}

impl Default for MemoryBallast {
    fn default() -> Self {
        Self::new()
    }
}

/// Allocate a zeroed buffer and write one byte per page to force commit
fn allocate_touched(size: usize) -> Vec<u8> {
    let mut chunk = vec![0u8; size];
    let mut offset = 0;
    while offset < chunk.len() {
        chunk[offset] = 1;
        offset += PAGE_BYTES;
    }
    chunk
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn small_ballast() -> MemoryBallast {
        // 1MB steps, 512KB hysteresis, same shape as production
        MemoryBallast::with_limits(MB as usize, 512 * 1024)
    }

    #[test]
    fn test_no_op_without_capacity_signal() {
        let mut ballast = small_ballast();
        assert_eq!(ballast.adjust(50.0, 0), BallastAction::Idle);
        assert_eq!(ballast.total_bytes(), 0);
    }

    #[test]
    fn test_grow_is_capped_at_one_chunk() {
        let mut ballast = small_ballast();

        // Target 50MB, far above hysteresis: exactly one 1MB chunk per call
        assert_eq!(ballast.adjust(50.0, 100 * MB), BallastAction::Grew(MB));
        assert_eq!(ballast.total_bytes(), MB);
        assert_eq!(ballast.adjust(50.0, 100 * MB), BallastAction::Grew(MB));
        assert_eq!(ballast.chunk_count(), 2);
    }

    #[test]
    fn test_final_grow_step_is_partial() {
        let mut ballast = MemoryBallast::with_limits(MB as usize, 0);

        // Target 1.5MB: one full chunk, then a half chunk
        assert_eq!(ballast.adjust(1.5, 100 * MB), BallastAction::Grew(MB));
        assert_eq!(ballast.adjust(1.5, 100 * MB), BallastAction::Grew(MB / 2));
        assert_eq!(ballast.total_bytes(), MB + MB / 2);
    }

    #[test]
    fn test_hysteresis_is_idempotent() {
        let mut ballast = small_ballast();
        while ballast.adjust(2.0, 100 * MB) != BallastAction::Idle {}

        let settled = ballast.total_bytes();
        // Converged within hysteresis of the 2MB target
        assert!((settled as i64 - 2 * MB as i64).unsigned_abs() <= 512 * 1024);

        // Repeated calls without a metrics change stay idle
        assert_eq!(ballast.adjust(2.0, 100 * MB), BallastAction::Idle);
        assert_eq!(ballast.adjust(2.0, 100 * MB), BallastAction::Idle);
        assert_eq!(ballast.total_bytes(), settled);
    }

    #[test]
    fn test_shrink_pops_most_recent_chunk() {
        let mut ballast = small_ballast();
        while ballast.adjust(5.0, 100 * MB) != BallastAction::Idle {}
        let chunks_before = ballast.chunk_count();

        assert_eq!(ballast.adjust(0.0, 100 * MB), BallastAction::Shrank(MB));
        assert_eq!(ballast.chunk_count(), chunks_before - 1);
    }

    #[test]
    fn test_shrink_with_no_chunks_is_idle() {
        let mut ballast = MemoryBallast::with_limits(MB as usize, 0);
        // Target below current (0) but nothing to pop
        assert_eq!(ballast.adjust(0.0, 100 * MB), BallastAction::Idle);
    }

    #[test]
    fn test_release_all() {
        let mut ballast = small_ballast();
        ballast.adjust(50.0, 100 * MB);
        ballast.adjust(50.0, 100 * MB);

        assert_eq!(ballast.release_all(), 2 * MB);
        assert_eq!(ballast.total_bytes(), 0);
        assert_eq!(ballast.release_all(), 0);
    }

    #[test]
    fn test_chunks_are_page_touched() {
        let chunk = allocate_touched(3 * PAGE_BYTES + 100);
        assert_eq!(chunk[0], 1);
        assert_eq!(chunk[PAGE_BYTES], 1);
        assert_eq!(chunk[2 * PAGE_BYTES], 1);
        assert_eq!(chunk[1], 0);
    }
}
