//! Synthesized-type cache
//!
//! Maps an interface's full name to its synthesized type. Each key gets a
//! `OnceCell` that doubles as the per-key lock: the first caller runs the
//! factory, concurrent callers for the same key block on the cell and read
//! whatever it produced. A failed attempt is handed to everyone waiting on
//! it and then dropped from the table so the next caller starts over.
//!
//! Entries are never evicted. Synthesized types may be referenced by live
//! adapters for as long as the process runs.

use crate::errors::Result;
use crate::metrics::ProxyStats;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

type Slot<V> = Arc<OnceCell<Result<V>>>;

/// Append-only map with at-most-once construction per key
pub struct SynthesisCache<V: Clone> {
    entries: DashMap<String, Slot<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    stats: Option<Arc<ProxyStats>>,
}

impl<V: Clone> SynthesisCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_capacity(64),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stats: None,
        }
    }

    /// Also report hits to shared stats
    pub fn with_stats(stats: Arc<ProxyStats>) -> Self {
        Self {
            stats: Some(stats),
            ..Self::new()
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        if let Some(stats) = &self.stats {
            stats.record_cache_hit();
        }
    }

    /// Return the value for `key`, running `factory` if no value exists yet.
    ///
    /// `factory` must not request the same key; that would wait on itself.
    pub fn get_or_create<F>(&self, key: &str, factory: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        // Fast path: already built
        if let Some(value) = self.get(key) {
            self.record_hit();
            trace!(target: "cache", key, "cache hit");
            return Ok(value);
        }

        let slot = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let mut ran_factory = false;
        let result = slot
            .get_or_init(|| {
                ran_factory = true;
                debug!(target: "cache", key, "cache miss, synthesizing");
                factory()
            })
            .clone();

        if ran_factory {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.record_hit();
        }

        if let Err(err) = &result {
            // Only drop the slot this attempt used; a retry may already own the key
            self.entries.remove_if(key, |_, current| Arc::ptr_eq(current, &slot));
            if ran_factory {
                error!(target: "cache", key, error = %err, "synthesis failed");
            }
        }

        result
    }

    /// The finished value for `key`, if synthesis already succeeded
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        match entry.value().get() {
            Some(Ok(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of successfully built entries
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.value().get(), Some(Ok(_))))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of successfully built entries, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| matches!(entry.value().get(), Some(Ok(_))))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl<V: Clone> Default for SynthesisCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
