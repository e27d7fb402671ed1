//! Cache Statistics Module
//!
//! Tracks hits and misses at the chain entry point plus the counters each
//! layer reports about itself.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of reads that found a stored value
    pub hits: u64,
    /// Number of reads that found nothing
    pub misses: u64,
    /// Number of entries evicted by the LRU layer
    pub evictions: u64,
    /// Number of entries purged by the expiration layer
    pub expirations: u64,
    /// Current number of entries in the leaf store
    pub total_entries: usize,
    /// Number of keys in the recency list, None without an LRU layer
    pub tracked: Option<usize>,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Adds `count` evictions.
    pub fn add_evictions(&mut self, count: u64) {
        self.evictions += count;
    }

    /// Adds `count` expirations.
    pub fn add_expirations(&mut self, count: u64) {
        self.expirations += count;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }

    pub fn set_tracked(&mut self, count: usize) {
        self.tracked = Some(count);
    }
}
