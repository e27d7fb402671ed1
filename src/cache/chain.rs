//! Cache Chain Module
//!
//! `Cache` is what application code holds: a store, optionally wrapped in
//! expiration and LRU layers, behind one lock. It provides the Hash-like
//! contract (`get` with a default, `fetch` with fallbacks, `delete` returning
//! the prior value) on top of whatever chain it owns.

use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{
    CacheStats, Clock, DynStore, Expiring, Lru, Store, StoreOptions, SystemClock,
};
use crate::error::{CacheError, Result};

/// Chain plus the counters kept at the entry point.
struct State<S> {
    chain: S,
    /// Hits and misses; layer counters are collected on demand
    stats: CacheStats,
}

impl<S> State<S> {
    fn record<V>(&mut self, value: &Option<V>) {
        if value.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
    }
}

// == Cache ==
/// A store chain with the Hash-like contract.
///
/// Every public operation holds the chain's lock for its whole duration, so
/// the multi-step bookkeeping in the layers (recency relinking, expiry
/// purges) is never interleaved between threads.
pub struct Cache<S: Store> {
    state: Mutex<State<S>>,
    /// Returned by `get` on a miss
    default: Option<S::Value>,
}

impl<S: Store> Cache<S> {
    // == Constructor ==
    /// Wraps `chain` with no default value.
    pub fn new(chain: S) -> Self {
        Self {
            state: Mutex::new(State {
                chain,
                stats: CacheStats::new(),
            }),
            default: None,
        }
    }

    /// Wraps `chain`, returning `default` from `get` on a miss.
    pub fn with_default(chain: S, default: S::Value) -> Self {
        let mut cache = Self::new(chain);
        cache.default = Some(default);
        cache
    }

    /// The value `get` returns on a miss.
    pub fn default_value(&self) -> Option<&S::Value> {
        self.default.as_ref()
    }

    pub fn set_default(&mut self, default: Option<S::Value>) {
        self.default = default;
    }

    // == Exists ==
    /// True iff `get` would find a stored value.
    pub fn exists(&self, key: &str) -> Result<bool> {
        self.state.lock().chain.exists(key)
    }

    // == Get ==
    /// Returns the stored value, or the configured default on a miss.
    pub fn get(&self, key: &str) -> Result<Option<S::Value>> {
        let value = {
            let mut state = self.state.lock();
            let value = state.chain.load(key)?;
            state.record(&value);
            value
        };
        Ok(value.or_else(|| self.default.clone()))
    }

    // == Set ==
    /// Stores `value` with no options.
    pub fn set(&self, key: &str, value: S::Value) -> Result<S::Value> {
        self.store(key, value, &StoreOptions::new())
    }

    // == Store ==
    /// Stores `value`; `options` travel down the whole chain.
    pub fn store(&self, key: &str, value: S::Value, options: &StoreOptions) -> Result<S::Value> {
        self.state.lock().chain.store(key, value, options)
    }

    // == Fetch ==
    /// Returns the stored value or fails with [`CacheError::NotFound`].
    pub fn fetch(&self, key: &str) -> Result<S::Value> {
        self.load_counted(key)?
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    /// Returns the stored value, else `fallback` (which may itself be `None`).
    pub fn fetch_or(&self, key: &str, fallback: Option<S::Value>) -> Result<Option<S::Value>> {
        Ok(self.load_counted(key)?.or(fallback))
    }

    /// Returns the stored value, else the result of calling `fallback` with
    /// the key. The lock is released before `fallback` runs, so it may use
    /// the cache itself.
    pub fn fetch_or_else<F>(&self, key: &str, fallback: F) -> Result<Option<S::Value>>
    where
        F: FnOnce(&str) -> Option<S::Value>,
    {
        match self.load_counted(key)? {
            Some(value) => Ok(Some(value)),
            None => Ok(fallback(key)),
        }
    }

    fn load_counted(&self, key: &str) -> Result<Option<S::Value>> {
        let mut state = self.state.lock();
        let value = state.chain.load(key)?;
        state.record(&value);
        Ok(value)
    }

    // == Delete ==
    /// Removes `key` and returns its prior value.
    ///
    /// An absent key returns `None` without reaching the chain's delete.
    pub fn delete(&self, key: &str) -> Result<Option<S::Value>> {
        let mut state = self.state.lock();
        let Some(current) = state.chain.load(key)? else {
            return Ok(None);
        };
        Ok(state.chain.delete(key)?.or(Some(current)))
    }

    // == Refresh ==
    /// Re-applies `options` to `key` without changing its value.
    pub fn refresh(&self, key: &str, options: &StoreOptions) -> Result<()> {
        self.state.lock().chain.refresh(key, options)
    }

    // == Clear ==
    /// Removes every entry from every layer.
    pub fn clear(&self) -> Result<()> {
        self.state.lock().chain.clear()?;
        debug!("cache cleared");
        Ok(())
    }

    pub fn most_recent(&self) -> Option<String> {
        self.state.lock().chain.most_recent()
    }

    pub fn least_recent(&self) -> Option<String> {
        self.state.lock().chain.least_recent()
    }

    // == Stats ==
    /// Counters from the entry point and from every layer of the chain.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        state.chain.record_stats(&mut stats);
        stats
    }

    /// Runs `f` on the chain while holding the lock.
    pub fn with_chain<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.state.lock().chain)
    }

    pub fn into_inner(self) -> S {
        self.state.into_inner().chain
    }
}

// == Layering ==
/// Order of the expiration and LRU layers when both are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layering {
    /// LRU around expiration around the store. Expiry is checked before the
    /// LRU layer sees a hit, so an expired entry is never touched.
    #[default]
    ExpirationInner,
    /// Expiration around LRU around the store.
    ExpirationOuter,
}

impl FromStr for Layering {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" | "expiration_inner" => Ok(Layering::ExpirationInner),
            "outer" | "expiration_outer" => Ok(Layering::ExpirationOuter),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown layering '{}', expected 'inner' or 'outer'",
                other
            ))),
        }
    }
}

// == Cache Builder ==
/// Assembles a store and its layers into a [`Cache`].
///
/// ```ignore
/// let cache = CacheBuilder::new()
///     .max_items(1000)
///     .default_value("none".to_string())
///     .build(MemoryStore::new())?;
/// ```
pub struct CacheBuilder<V> {
    max_items: Option<usize>,
    expiration: bool,
    layering: Layering,
    default: Option<V>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone + Send + 'static> CacheBuilder<V> {
    /// Expiration on, no LRU layer, no default.
    pub fn new() -> Self {
        Self {
            max_items: None,
            expiration: true,
            layering: Layering::default(),
            default: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Adds an LRU layer holding at most `max_items` keys.
    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    /// Removes the LRU layer.
    pub fn unbounded(mut self) -> Self {
        self.max_items = None;
        self
    }

    pub fn expiration(mut self, enabled: bool) -> Self {
        self.expiration = enabled;
        self
    }

    pub fn layering(mut self, layering: Layering) -> Self {
        self.layering = layering;
        self
    }

    pub fn default_value(mut self, default: V) -> Self {
        self.default = Some(default);
        self
    }

    /// Time source for the expiration layer.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // == Build ==
    /// Wraps `store` in the configured layers.
    pub fn build<S>(self, store: S) -> Result<Cache<DynStore<V>>>
    where
        S: Store<Value = V> + Send + 'static,
    {
        let base: DynStore<V> = Box::new(store);

        let chain: DynStore<V> = match (self.max_items, self.expiration, self.layering) {
            (None, false, _) => base,
            (None, true, _) => Box::new(Expiring::with_clock(base, self.clock)),
            (Some(max_items), false, _) => Box::new(Lru::new(base, max_items)?),
            (Some(max_items), true, Layering::ExpirationInner) => Box::new(Lru::new(
                Expiring::with_clock(base, self.clock),
                max_items,
            )?),
            (Some(max_items), true, Layering::ExpirationOuter) => Box::new(
                Expiring::with_clock(Lru::new(base, max_items)?, self.clock),
            ),
        };

        debug!(
            max_items = ?self.max_items,
            expiration = self.expiration,
            layering = ?self.layering,
            "cache chain assembled"
        );

        let mut cache = Cache::new(chain);
        cache.set_default(self.default);
        Ok(cache)
    }
}

impl<V: Clone + Send + 'static> Default for CacheBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}
