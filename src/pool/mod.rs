//! Buffer pool module for Resocks
//!
//! This module provides reusable fixed-size copy buffers so that every
//! relayed direction does not allocate its own multi-megabyte buffer.

mod buffer;
mod guard;
mod stats;

pub use buffer::BufferPool;
pub use guard::PooledBuffer;
pub use stats::{PoolStats, PoolStatsSnapshot};
