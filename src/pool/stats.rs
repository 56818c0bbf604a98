//! Buffer pool statistics

use std::sync::atomic::{AtomicUsize, Ordering};

/// Statistics for the buffer pool
#[derive(Debug, Default)]
pub struct PoolStats {
    /// Total buffers allocated
    pub total_created: AtomicUsize,
    /// Total buffers handed out
    pub total_acquired: AtomicUsize,
    /// Total buffers put back for reuse
    pub total_returned: AtomicUsize,
    /// Total buffers freed because the pool was full
    pub total_discarded: AtomicUsize,
    /// Buffers currently held by copy tasks
    pub in_use_count: AtomicUsize,
}

impl PoolStats {
    /// Create new pool stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a buffer allocation
    pub fn record_created(&self) {
        self.total_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a buffer acquisition
    pub fn record_acquired(&self) {
        self.total_acquired.fetch_add(1, Ordering::Relaxed);
        self.in_use_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a buffer going back to the idle list
    pub fn record_returned(&self) {
        self.total_returned.fetch_add(1, Ordering::Relaxed);
        self.in_use_count.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a buffer being freed instead of pooled
    pub fn record_discarded(&self) {
        self.total_discarded.fetch_add(1, Ordering::Relaxed);
        self.in_use_count.fetch_sub(1, Ordering::Relaxed);
    }

    /// Get current stats snapshot
    pub fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            total_created: self.total_created.load(Ordering::Relaxed),
            total_acquired: self.total_acquired.load(Ordering::Relaxed),
            total_returned: self.total_returned.load(Ordering::Relaxed),
            total_discarded: self.total_discarded.load(Ordering::Relaxed),
            in_use_count: self.in_use_count.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct PoolStatsSnapshot {
    pub total_created: usize,
    pub total_acquired: usize,
    pub total_returned: usize,
    pub total_discarded: usize,
    pub in_use_count: usize,
}
