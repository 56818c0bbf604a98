//! Fixed-size buffer pool
//!
//! Buffers are allocated lazily, handed out behind a [`PooledBuffer`] guard
//! and kept for reuse once released. Released buffers are not zeroed.

use super::{PoolStats, PooledBuffer};
use std::sync::{Arc, Mutex, MutexGuard};

/// Pool of equally sized byte buffers
#[derive(Debug)]
pub struct BufferPool {
    /// Size of every buffer in bytes
    buffer_size: usize,
    /// Maximum number of idle buffers retained
    max_idle: usize,
    /// Idle buffers ready for reuse
    idle: Mutex<Vec<Box<[u8]>>>,
    /// Statistics
    stats: PoolStats,
}

impl BufferPool {
    /// Create a new pool handing out buffers of `buffer_size` bytes
    pub fn new(buffer_size: usize, max_idle: usize) -> Arc<Self> {
        Arc::new(BufferPool {
            buffer_size,
            max_idle,
            idle: Mutex::new(Vec::with_capacity(max_idle)),
            stats: PoolStats::new(),
        })
    }

    /// Take a buffer from the pool, allocating one if none is idle
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let reused = self.idle_list().pop();
        let buffer = match reused {
            Some(buffer) => buffer,
            None => {
                self.stats.record_created();
                vec![0u8; self.buffer_size].into_boxed_slice()
            }
        };
        self.stats.record_acquired();
        PooledBuffer::new(buffer, Arc::clone(self))
    }

    /// Put a buffer back, freeing it when the idle list is full
    pub(super) fn release(&self, buffer: Box<[u8]>) {
        let mut idle = self.idle_list();
        if idle.len() < self.max_idle && buffer.len() == self.buffer_size {
            idle.push(buffer);
            self.stats.record_returned();
        } else {
            drop(idle);
            self.stats.record_discarded();
        }
    }

    /// Size of every buffer handed out
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of buffers currently idle
    pub fn idle_count(&self) -> usize {
        self.idle_list().len()
    }

    /// Pool statistics
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    fn idle_list(&self) -> MutexGuard<'_, Vec<Box<[u8]>>> {
        // The idle list stays consistent even if a holder panicked.
        self.idle.lock().unwrap_or_else(|e| e.into_inner())
    }
}
