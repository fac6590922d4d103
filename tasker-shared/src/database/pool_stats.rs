//! # Connection Pool Statistics (TAS-164)
//!
//! SWMR (Single Writer, Multiple Reader) atomic statistics for connection pool
//! observability. Uses `AtomicU64` with relaxed ordering for hot-path recording
//! and provides snapshot DTOs for readers.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic connection pool statistics using SWMR pattern.
///
/// Writers call `record_acquire` and `record_error` on hot paths using
/// `Relaxed` ordering for minimal overhead. Readers call `snapshot()` to
/// get a consistent-enough view of the stats.
#[derive(Debug)]
pub struct AtomicPoolStats {
    /// Pool identifier
    pool_name: String,

    /// Maximum connections configured for this pool
    max_connections: u32,

    /// Total successful acquires
    total_acquires: AtomicU64,

    /// Total acquire time in microseconds (for average computation)
    total_acquire_time_us: AtomicU64,

    /// Number of acquires exceeding slow threshold
    slow_acquires: AtomicU64,

    /// Maximum acquire time observed (in microseconds)
    max_acquire_time_us: AtomicU64,

    /// Total acquire errors (timeouts, pool exhaustion)
    acquire_errors: AtomicU64,
}

impl AtomicPoolStats {
    /// Create a new stats tracker for a named pool.
    pub fn new(pool_name: String, max_connections: u32) -> Self {
        Self {
            pool_name,
            max_connections,
            total_acquires: AtomicU64::new(0),
            total_acquire_time_us: AtomicU64::new(0),
            slow_acquires: AtomicU64::new(0),
            max_acquire_time_us: AtomicU64::new(0),
            acquire_errors: AtomicU64::new(0),
        }
    }

    /// Record a successful connection acquire.
    ///
    /// Hot-path writer using `Relaxed` ordering for minimal overhead.
    #[inline]
    pub fn record_acquire(&self, duration_us: u64, slow_threshold_us: u64) {
        self.total_acquires.fetch_add(1, Ordering::Relaxed);
        self.total_acquire_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
        self.max_acquire_time_us
            .fetch_max(duration_us, Ordering::Relaxed);

        if duration_us >= slow_threshold_us {
            self.slow_acquires.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an acquire error (timeout, pool exhaustion).
    #[inline]
    pub fn record_error(&self) {
        self.acquire_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current statistics.
    ///
    /// Reader method that loads all counters. Individual loads are relaxed,
    /// so values may be slightly stale but are always monotonically increasing.
    pub fn snapshot(&self) -> PoolStatsSnapshot {
        let total_acquires = self.total_acquires.load(Ordering::Relaxed);
        let total_acquire_time_us = self.total_acquire_time_us.load(Ordering::Relaxed);
        let slow_acquires = self.slow_acquires.load(Ordering::Relaxed);
        let max_acquire_time_us = self.max_acquire_time_us.load(Ordering::Relaxed);
        let acquire_errors = self.acquire_errors.load(Ordering::Relaxed);

        let average_acquire_time_us = if total_acquires > 0 {
            total_acquire_time_us as f64 / total_acquires as f64
        } else {
            0.0
        };

        PoolStatsSnapshot {
            pool_name: self.pool_name.clone(),
            max_connections: self.max_connections,
            total_acquires,
            slow_acquires,
            acquire_errors,
            average_acquire_time_us,
            max_acquire_time_us,
        }
    }
}

/// Point-in-time snapshot of pool statistics.
///
/// Plain DTO for serialization and display. Produced by `AtomicPoolStats::snapshot()`.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatsSnapshot {
    pub pool_name: String,
    pub max_connections: u32,
    pub total_acquires: u64,
    pub slow_acquires: u64,
    pub acquire_errors: u64,
    pub average_acquire_time_us: f64,
    pub max_acquire_time_us: u64,
}
