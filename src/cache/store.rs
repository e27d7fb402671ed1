//! Store Contract Module
//!
//! The backing-store contract every leaf driver and every decorator satisfies.

use std::time::Duration;

use crate::cache::CacheStats;
use crate::error::{CacheError, Result};

// == Store Options ==
/// Per-call options passed down the chain on `store` and `refresh`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Lifetime of the entry, consumed by the expiration layer
    pub expires_in: Option<Duration>,
}

impl StoreOptions {
    /// Options with no expiry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options carrying an `expires_in` duration.
    pub fn expires_in(duration: Duration) -> Self {
        Self {
            expires_in: Some(duration),
        }
    }
}

// == Store Trait ==
/// A key-value container with Hash-like semantics.
///
/// Leaf drivers implement `load`, `store`, `delete` and `clear`; decorators
/// wrap another `Store` and override whatever they need to observe. Every
/// method takes `&mut self` because reads move bookkeeping in the layers
/// above the leaf (recency order, lazy expiry).
pub trait Store {
    /// Type of the stored values. Layers never inspect it.
    type Value: Clone;

    /// Returns the stored value, or `None` when the key is absent.
    fn load(&mut self, key: &str) -> Result<Option<Self::Value>>;

    /// Persists `value` under `key` and returns the stored value.
    fn store(
        &mut self,
        key: &str,
        value: Self::Value,
        options: &StoreOptions,
    ) -> Result<Self::Value>;

    /// Removes `key` and returns its prior value.
    fn delete(&mut self, key: &str) -> Result<Option<Self::Value>>;

    /// Removes every entry.
    fn clear(&mut self) -> Result<()>;

    /// True iff a subsequent `load` would return a value.
    fn exists(&mut self, key: &str) -> Result<bool> {
        Ok(self.load(key)?.is_some())
    }

    /// Like `exists`, but never counts as a use of the key.
    fn contains(&mut self, key: &str) -> Result<bool> {
        self.exists(key)
    }

    /// Re-applies `options` to an existing key without changing its value.
    fn refresh(&mut self, key: &str, options: &StoreOptions) -> Result<()> {
        let value = self
            .load(key)?
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;
        self.store(key, value, options)?;
        Ok(())
    }

    /// Most recently used key, if some layer tracks recency.
    fn most_recent(&self) -> Option<String> {
        None
    }

    /// Least recently used key, if some layer tracks recency.
    fn least_recent(&self) -> Option<String> {
        None
    }

    /// Keys this layer or the ones below it destroyed on their own during
    /// the last `store` (LRU evictions). Outer layers drain them to drop
    /// their own records for those keys.
    fn drain_evicted(&mut self) -> Vec<String> {
        Vec::new()
    }

    /// Adds this layer's counters to `stats`.
    fn record_stats(&self, _stats: &mut CacheStats) {}
}

/// Type-erased chain, used when the layering is chosen at runtime.
pub type DynStore<V> = Box<dyn Store<Value = V> + Send>;

impl<S: Store + ?Sized> Store for Box<S> {
    type Value = S::Value;

    fn load(&mut self, key: &str) -> Result<Option<Self::Value>> {
        (**self).load(key)
    }

    fn store(
        &mut self,
        key: &str,
        value: Self::Value,
        options: &StoreOptions,
    ) -> Result<Self::Value> {
        (**self).store(key, value, options)
    }

    fn delete(&mut self, key: &str) -> Result<Option<Self::Value>> {
        (**self).delete(key)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn exists(&mut self, key: &str) -> Result<bool> {
        (**self).exists(key)
    }

    fn contains(&mut self, key: &str) -> Result<bool> {
        (**self).contains(key)
    }

    fn refresh(&mut self, key: &str, options: &StoreOptions) -> Result<()> {
        (**self).refresh(key, options)
    }

    fn drain_evicted(&mut self) -> Vec<String> {
        (**self).drain_evicted()
    }

    fn most_recent(&self) -> Option<String> {
        (**self).most_recent()
    }

    fn least_recent(&self) -> Option<String> {
        (**self).least_recent()
    }

    fn record_stats(&self, stats: &mut CacheStats) {
        (**self).record_stats(stats)
    }
}
