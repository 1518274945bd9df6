//! Engine configuration and the execution context passed to every operator.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::memory::{LimitedMemoryPool, MemoryPool, MemoryReservation, UnboundedMemoryPool};

/// Default number of compiled regex patterns kept per evaluation.
pub const DEFAULT_REGEX_CACHE_SIZE: usize = 64;

/// Configuration for expression evaluation and operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Memory limit in bytes for operator scratch buffers (0 = unlimited).
    pub memory_limit: usize,
    /// Route binary arithmetic through whole-column compute kernels.
    pub vectorized_arithmetic: bool,
    /// Maximum number of distinct regex patterns compiled per evaluation.
    pub regex_cache_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memory_limit: 0,
            vectorized_arithmetic: false,
            regex_cache_size: DEFAULT_REGEX_CACHE_SIZE,
        }
    }
}

impl EngineConfig {
    /// Creates a new engine configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the memory limit in bytes.
    #[must_use]
    pub fn with_memory_limit(mut self, memory_limit: usize) -> Self {
        self.memory_limit = memory_limit;
        self
    }

    /// Enables or disables vectorized arithmetic.
    #[must_use]
    pub fn with_vectorized_arithmetic(mut self, enabled: bool) -> Self {
        self.vectorized_arithmetic = enabled;
        self
    }

    /// Sets the regex cache size.
    #[must_use]
    pub fn with_regex_cache_size(mut self, size: usize) -> Self {
        self.regex_cache_size = size;
        self
    }
}

/// Configuration plus memory pool, threaded explicitly through operators.
#[derive(Debug, Clone)]
pub struct ExecContext {
    config: EngineConfig,
    pool: Arc<dyn MemoryPool>,
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ExecContext {
    /// Creates a context whose pool is derived from `config.memory_limit`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let pool: Arc<dyn MemoryPool> = if config.memory_limit > 0 {
            Arc::new(LimitedMemoryPool::new(config.memory_limit))
        } else {
            Arc::new(UnboundedMemoryPool::new())
        };
        Self { config, pool }
    }

    /// Creates a context with a caller-supplied pool.
    #[must_use]
    pub fn with_pool(config: EngineConfig, pool: Arc<dyn MemoryPool>) -> Self {
        Self { config, pool }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the memory pool.
    #[must_use]
    pub fn pool(&self) -> &Arc<dyn MemoryPool> {
        &self.pool
    }

    /// Reserves `bytes` for `consumer`.
    ///
    /// # Errors
    ///
    /// Returns `MemoryLimitExceeded` if the pool refuses the bytes.
    pub fn reserve(&self, consumer: &'static str, bytes: usize) -> Result<MemoryReservation> {
        let mut reservation = MemoryReservation::new(Arc::clone(&self.pool), consumer);
        reservation.try_grow(bytes)?;
        Ok(reservation)
    }
}
