//! Memory Store Module
//!
//! Flat in-memory map satisfying the store contract.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{CacheStats, Store, StoreOptions, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

// == Memory Store ==
/// In-memory leaf store.
///
/// Ignores `StoreOptions`; expiry is the job of the expiration layer. An
/// optional item limit makes the store reject writes of new keys once full,
/// which is how an external store with its own capacity behaves.
#[derive(Debug)]
pub struct MemoryStore<V> {
    /// Key-value storage
    entries: HashMap<String, V>,
    /// Maximum number of entries accepted, None = unbounded
    limit: Option<usize>,
}

impl<V> MemoryStore<V> {
    // == Constructor ==
    /// Creates an empty, unbounded store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            limit: None,
        }
    }

    /// Creates an empty store that rejects new keys beyond `limit` entries.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            limit: Some(limit),
        }
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        Ok(())
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Store for MemoryStore<V> {
    type Value = V;

    fn load(&mut self, key: &str) -> Result<Option<V>> {
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: &str, value: V, _options: &StoreOptions) -> Result<V> {
        Self::validate_key(key)?;

        if let Some(limit) = self.limit {
            if !self.entries.contains_key(key) && self.entries.len() >= limit {
                debug!(key, limit, "memory store full, rejecting write");
                return Err(CacheError::Backend(format!(
                    "memory store is full ({} entries)",
                    limit
                )));
            }
        }

        self.entries.insert(key.to_string(), value.clone());
        Ok(value)
    }

    fn delete(&mut self, key: &str) -> Result<Option<V>> {
        Ok(self.entries.remove(key))
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }

    fn exists(&mut self, key: &str) -> Result<bool> {
        Ok(self.entries.contains_key(key))
    }

    fn record_stats(&self, stats: &mut CacheStats) {
        stats.set_total_entries(self.entries.len());
    }
}
