//! LRU Layer Module
//!
//! Decorator bounding the number of items in any store, evicting the least
//! recently used key first.

use tracing::{debug, warn};

use crate::cache::{CacheStats, Node, RecencyList, Store, StoreOptions};
use crate::error::{CacheError, Result};

// == Lru ==
/// Wraps a store with a recency list and a maximum item count.
///
/// - `load`/`exists` hits move the key to the most recently used end
/// - `store` links new keys at the most recently used end, evicting the
///   least recently used key first when the list is full
/// - `delete` unlinks the key
///
/// A miss reported by the wrapped layer for a key that is still linked (an
/// inner expiration layer purged it) unlinks the key, so the list never
/// outlives its entries.
#[derive(Debug)]
pub struct Lru<S> {
    /// The wrapped layer
    inner: S,
    /// Recency order of linked keys
    list: RecencyList,
    /// Number of keys currently linked
    size: usize,
    max_items: usize,
    /// Number of entries evicted so far
    evictions: u64,
    /// Keys evicted by the last `store`, until drained
    evicted: Vec<String>,
}

impl<S> Lru<S> {
    // == Constructor ==
    /// Wraps `inner` with an empty recency list.
    pub fn new(inner: S, max_items: usize) -> Result<Self> {
        Self::reattach(inner, RecencyList::new(), max_items)
    }

    /// Wraps `inner` with a recency list kept from an earlier session.
    ///
    /// The item count is rebuilt by walking the list once from HEAD to TAIL;
    /// no stored counter is trusted.
    pub fn reattach(inner: S, list: RecencyList, max_items: usize) -> Result<Self> {
        if max_items == 0 {
            return Err(CacheError::InvalidConfig(
                "max_items must be a positive integer".to_string(),
            ));
        }

        let size = list.counting_walk();
        debug!(size, max_items, "recency list reconciled");

        Ok(Self {
            inner,
            list,
            size,
            max_items,
            evictions: 0,
            evicted: Vec::new(),
        })
    }

    /// Splits the layer into the wrapped store and its recency list.
    pub fn into_parts(self) -> (S, RecencyList) {
        (self.inner, self.list)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn list(&self) -> &RecencyList {
        &self.list
    }

    // == Length ==
    /// Number of keys tracked by the recency list.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    fn link_front(&mut self, key: &str) {
        if self.list.push_front(key) {
            self.size += 1;
        }
    }

    fn unlink(&mut self, key: &str) {
        if self.list.remove(key) {
            self.size -= 1;
        }
    }
}

impl<S: Store> Lru<S> {
    // == Evict ==
    /// Deletes the least recently used key from the list and the wrapped
    /// store. Never evicts `keep`; if `keep` is the least recently used key,
    /// its neighbour goes instead. Returns false when there is nothing to
    /// evict.
    fn evict_least_recent(&mut self, keep: &str) -> Result<bool> {
        let victim = match self.list.least_recent() {
            Some(victim) if victim != keep => Some(victim.to_string()),
            Some(_) => self
                .list
                .prev(&Node::Key(keep.to_string()))
                .and_then(Node::as_key)
                .map(str::to_string),
            None => None,
        };
        let Some(victim) = victim else {
            return Ok(false);
        };

        self.inner.delete(&victim)?;
        self.unlink(&victim);
        self.evictions += 1;
        self.evicted.push(victim.clone());
        debug!(key = %victim, size = self.size, "evicted least recently used entry");
        Ok(true)
    }
}

impl<S: Store> Store for Lru<S> {
    type Value = S::Value;

    fn load(&mut self, key: &str) -> Result<Option<Self::Value>> {
        let value = self.inner.load(key)?;
        if value.is_some() {
            self.list.touch(key);
        } else {
            self.unlink(key);
        }
        Ok(value)
    }

    fn exists(&mut self, key: &str) -> Result<bool> {
        let exists = self.inner.exists(key)?;
        if exists {
            self.list.touch(key);
        } else {
            self.unlink(key);
        }
        Ok(exists)
    }

    fn contains(&mut self, key: &str) -> Result<bool> {
        let contains = self.inner.contains(key)?;
        if !contains {
            self.unlink(key);
        }
        Ok(contains)
    }

    /// Writes through to the wrapped store and marks `key` most recently
    /// used. A failed write leaves the recency order as it was, apart from
    /// keys evicted on the way.
    ///
    /// When the wrapped store rejects the write with a backend failure, the
    /// least recently used key is evicted and the write retried, at most
    /// once per key linked when the call started. Running out of keys ends
    /// in [`CacheError::CapacityExhausted`] carrying the last failure.
    fn store(
        &mut self,
        key: &str,
        value: Self::Value,
        options: &StoreOptions,
    ) -> Result<Self::Value> {
        self.evicted.clear();

        let linked = self.list.contains(key);
        if !linked && self.size >= self.max_items {
            self.evict_least_recent(key)?;
        }

        let budget = self.size;
        let mut retries = 0;
        loop {
            match self.inner.store(key, value.clone(), options) {
                Ok(stored) => {
                    if linked {
                        self.list.touch(key);
                    } else {
                        self.link_front(key);
                    }
                    return Ok(stored);
                }
                Err(err) if err.is_backend() => {
                    if retries >= budget || !self.evict_least_recent(key)? {
                        warn!(key, max_items = self.max_items, error = %err, "capacity exhausted");
                        return Err(CacheError::CapacityExhausted {
                            max_items: self.max_items,
                            source: Box::new(err),
                        });
                    }
                    retries += 1;
                    warn!(key, retries, error = %err, "write rejected, evicted and retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn delete(&mut self, key: &str) -> Result<Option<Self::Value>> {
        let value = self.inner.delete(key)?;
        self.unlink(key);
        Ok(value)
    }

    fn clear(&mut self) -> Result<()> {
        self.inner.clear()?;
        self.list.clear();
        self.size = 0;
        Ok(())
    }

    /// Delegates to the wrapped layer; renewing options is not a use.
    fn refresh(&mut self, key: &str, options: &StoreOptions) -> Result<()> {
        let result = self.inner.refresh(key, options);
        if matches!(result, Err(CacheError::NotFound(_))) {
            self.unlink(key);
        }
        result
    }

    fn drain_evicted(&mut self) -> Vec<String> {
        let mut keys = std::mem::take(&mut self.evicted);
        keys.extend(self.inner.drain_evicted());
        keys
    }

    fn most_recent(&self) -> Option<String> {
        self.list.most_recent().map(str::to_string)
    }

    fn least_recent(&self) -> Option<String> {
        self.list.least_recent().map(str::to_string)
    }

    fn record_stats(&self, stats: &mut CacheStats) {
        self.inner.record_stats(stats);
        stats.add_evictions(self.evictions);
        stats.set_tracked(self.size);
    }
}
