//! Synthesis and dispatch counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by a factory, its synthesizer and every bound slot
#[derive(Debug, Default)]
pub struct ProxyStats {
    types_synthesized: AtomicU64,
    synthesis_failures: AtomicU64,
    cache_hits: AtomicU64,
    dispatch_calls: AtomicU64,
    dispatch_failures: AtomicU64,
    unsupported_calls: AtomicU64,
}

impl ProxyStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_synthesized(&self) {
        self.types_synthesized.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_synthesis_failure(&self) {
        self.synthesis_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dispatch(&self, success: bool) {
        self.dispatch_calls.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_unsupported(&self) {
        self.unsupported_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            types_synthesized: self.types_synthesized.load(Ordering::Relaxed),
            synthesis_failures: self.synthesis_failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            dispatch_calls: self.dispatch_calls.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            unsupported_calls: self.unsupported_calls.load(Ordering::Relaxed),
        }
    }
}

/// Copy of the counters for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub types_synthesized: u64,
    pub synthesis_failures: u64,
    pub cache_hits: u64,
    pub dispatch_calls: u64,
    pub dispatch_failures: u64,
    pub unsupported_calls: u64,
}

impl StatsSnapshot {
    /// Fraction of dispatches that failed, 0.0 when nothing was dispatched
    pub fn failure_rate(&self) -> f64 {
        if self.dispatch_calls == 0 {
            0.0
        } else {
            self.dispatch_failures as f64 / self.dispatch_calls as f64
        }
    }
}
