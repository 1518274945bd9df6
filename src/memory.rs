//! Memory accounting for operator scratch buffers.
//!
//! Operators reserve the bytes of their scratch structures (selection
//! vectors, hash indexes, sort permutations) from a [`MemoryPool`] before
//! building them. A [`MemoryReservation`] hands its bytes back when dropped,
//! so scratch memory is released as soon as the operator's result replaces it.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{EngineError, Result};

/// Coarse memory pressure reported by a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MemoryPressure {
    /// Below half of the limit, or no limit configured.
    Low,
    /// Between half and 85% of the limit.
    Moderate,
    /// At or above 85% of the limit.
    High,
}

impl MemoryPressure {
    fn from_usage(reserved: usize, limit: Option<usize>) -> Self {
        match limit {
            None | Some(0) => MemoryPressure::Low,
            Some(limit) => {
                let ratio = reserved as f64 / limit as f64;
                if ratio < 0.5 {
                    MemoryPressure::Low
                } else if ratio < 0.85 {
                    MemoryPressure::Moderate
                } else {
                    MemoryPressure::High
                }
            }
        }
    }
}

/// A pluggable allocator accounting interface.
pub trait MemoryPool: Send + Sync + fmt::Debug {
    /// Records `bytes` as in use, failing if the pool cannot provide them.
    ///
    /// # Errors
    ///
    /// Returns `MemoryLimitExceeded` if the pool is bounded and full.
    fn try_grow(&self, bytes: usize) -> Result<()>;

    /// Returns `bytes` to the pool.
    fn shrink(&self, bytes: usize);

    /// Bytes currently reserved.
    fn reserved(&self) -> usize;

    /// Upper bound in bytes, if any.
    fn limit(&self) -> Option<usize>;

    /// Current memory pressure.
    fn pressure(&self) -> MemoryPressure {
        MemoryPressure::from_usage(self.reserved(), self.limit())
    }
}

/// A pool that never refuses a reservation but still tracks usage.
#[derive(Debug, Default)]
pub struct UnboundedMemoryPool {
    used: AtomicUsize,
}

impl UnboundedMemoryPool {
    /// Creates an empty unbounded pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryPool for UnboundedMemoryPool {
    fn try_grow(&self, bytes: usize) -> Result<()> {
        self.used.fetch_add(bytes, Ordering::Relaxed);
        Ok(())
    }

    fn shrink(&self, bytes: usize) {
        self.used.fetch_sub(bytes, Ordering::Relaxed);
    }

    fn reserved(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }

    fn limit(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, Default)]
struct PoolState {
    reserved: usize,
    peak: usize,
}

/// A pool with a fixed byte limit.
#[derive(Debug)]
pub struct LimitedMemoryPool {
    limit: usize,
    state: Mutex<PoolState>,
}

impl LimitedMemoryPool {
    /// Creates a pool that refuses to grow beyond `limit` bytes.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        LimitedMemoryPool {
            limit,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Highest reservation level observed.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.state.lock().peak
    }
}

impl MemoryPool for LimitedMemoryPool {
    fn try_grow(&self, bytes: usize) -> Result<()> {
        let mut state = self.state.lock();
        let wanted = state.reserved.saturating_add(bytes);
        if wanted > self.limit {
            warn!(
                requested = bytes,
                used = state.reserved,
                limit = self.limit,
                "memory reservation refused"
            );
            return Err(EngineError::MemoryLimitExceeded {
                requested: bytes,
                used: state.reserved,
                limit: self.limit,
            });
        }
        state.reserved = wanted;
        state.peak = state.peak.max(wanted);
        Ok(())
    }

    fn shrink(&self, bytes: usize) {
        let mut state = self.state.lock();
        state.reserved = state.reserved.saturating_sub(bytes);
    }

    fn reserved(&self) -> usize {
        self.state.lock().reserved
    }

    fn limit(&self) -> Option<usize> {
        Some(self.limit)
    }
}

/// Bytes held from a pool on behalf of one operator; released on drop.
#[derive(Debug)]
pub struct MemoryReservation {
    pool: Arc<dyn MemoryPool>,
    consumer: &'static str,
    size: usize,
}

impl MemoryReservation {
    /// Creates an empty reservation against `pool`.
    #[must_use]
    pub fn new(pool: Arc<dyn MemoryPool>, consumer: &'static str) -> Self {
        MemoryReservation {
            pool,
            consumer,
            size: 0,
        }
    }

    /// Name of the operator holding this reservation.
    #[must_use]
    pub fn consumer(&self) -> &'static str {
        self.consumer
    }

    /// Bytes currently held.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Grows the reservation by `bytes`.
    ///
    /// # Errors
    ///
    /// Returns `MemoryLimitExceeded` if the pool refuses the bytes.
    pub fn try_grow(&mut self, bytes: usize) -> Result<()> {
        self.pool.try_grow(bytes)?;
        self.size += bytes;
        Ok(())
    }

    /// Returns up to `bytes` to the pool.
    pub fn shrink(&mut self, bytes: usize) {
        let bytes = bytes.min(self.size);
        self.pool.shrink(bytes);
        self.size -= bytes;
    }

    /// Returns everything held to the pool.
    pub fn free(&mut self) {
        self.shrink(self.size);
    }
}

impl Drop for MemoryReservation {
    fn drop(&mut self) {
        self.free();
    }
}
