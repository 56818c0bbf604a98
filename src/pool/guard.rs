//! RAII guard for pooled buffers
//!
//! Provides automatic return of buffers to the pool when dropped.

use super::BufferPool;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// RAII guard that returns the buffer to the pool on drop
pub struct PooledBuffer {
    /// The buffer (Option to allow moving it out in drop)
    buffer: Option<Box<[u8]>>,
    /// Pool the buffer goes back to
    pool: Arc<BufferPool>,
}

impl PooledBuffer {
    pub(super) fn new(buffer: Box<[u8]>, pool: Arc<BufferPool>) -> Self {
        PooledBuffer {
            buffer: Some(buffer),
            pool,
        }
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.buffer.as_deref().unwrap_or(&[])
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.buffer.as_deref_mut().unwrap_or(&mut [])
    }
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.len())
            .finish()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.pool.release(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_drop_returns_to_pool() {
        let pool = BufferPool::new(32, 2);
        {
            let _guard = pool.acquire();
            assert_eq!(pool.idle_count(), 0);
        }
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn test_guard_deref_mut() {
        let pool = BufferPool::new(4, 1);
        let mut guard = pool.acquire();
        guard.copy_from_slice(b"abcd");
        assert_eq!(&*guard, b"abcd");
    }

    #[test]
    fn test_guard_debug() {
        let pool = BufferPool::new(4, 1);
        let guard = pool.acquire();
        let debug_str = format!("{:?}", guard);
        assert!(debug_str.contains("PooledBuffer"));
        assert!(debug_str.contains("len: 4"));
    }
}
