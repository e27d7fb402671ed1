//! Expiration Layer Module
//!
//! Decorator attaching a per-key expiry instant to any store. Expiry is
//! detected lazily: every read or delete first purges the key if its instant
//! has passed, so the caller observes an absent key. Nothing sweeps in the
//! background; an expired key that is never touched again stays in the
//! wrapped store until `clear`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::cache::{CacheStats, Clock, Store, StoreOptions, SystemClock};
use crate::error::{CacheError, Result};

// == Expiring ==
/// Wraps a store with time-to-live bookkeeping.
pub struct Expiring<S> {
    /// The wrapped layer
    inner: S,
    /// Absolute expiry instant per key
    expirations: HashMap<String, DateTime<Utc>>,
    clock: Arc<dyn Clock>,
    /// Number of entries purged so far
    expired: u64,
    /// Keys evicted below this layer by the last `store`, until drained
    evicted: Vec<String>,
}

impl<S> Expiring<S> {
    // == Constructor ==
    /// Wraps `inner`, reading time from the system clock.
    pub fn new(inner: S) -> Self {
        Self::with_clock(inner, Arc::new(SystemClock))
    }

    /// Wraps `inner`, reading time from `clock`.
    pub fn with_clock(inner: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            expirations: HashMap::new(),
            clock,
            expired: 0,
            evicted: Vec::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Recorded expiry instant for `key`, if any.
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.expirations.get(key).copied()
    }

    // == Time To Live ==
    /// Returns the remaining lifetime of `key`.
    ///
    /// - `Some(Duration::ZERO)` if the expiry instant has passed
    /// - `Some(remaining)` if the key has an expiry in the future
    /// - `None` if the key has no recorded expiry
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.expirations.get(key).map(|expires| {
            (*expires - self.clock.now())
                .to_std()
                .unwrap_or(Duration::ZERO)
        })
    }

    /// Computes the expiry instant requested by `options`.
    fn deadline(&self, options: &StoreOptions) -> Result<Option<DateTime<Utc>>> {
        let Some(expires_in) = options.expires_in else {
            return Ok(None);
        };

        chrono::Duration::from_std(expires_in)
            .ok()
            .and_then(|delta| self.clock.now().checked_add_signed(delta))
            .map(Some)
            .ok_or_else(|| {
                CacheError::InvalidRequest(format!("expires_in {:?} is out of range", expires_in))
            })
    }
}

impl<S: Store> Expiring<S> {
    // == Check Expired ==
    /// Purges `key` from this layer and the wrapped one if its time has passed.
    ///
    /// An entry is expired once the current time is strictly after its
    /// expiry instant.
    fn check_expired(&mut self, key: &str) -> Result<()> {
        let now = self.clock.now();
        let expired = matches!(self.expirations.get(key), Some(at) if now > *at);

        if expired {
            self.expirations.remove(key);
            self.inner.delete(key)?;
            self.expired += 1;
            debug!(key, "purged expired entry");
        }
        Ok(())
    }

    /// Drops records for keys the wrapped layer destroyed on its own, and
    /// hands the keys on to the layer above.
    fn forget_evicted(&mut self) -> Vec<String> {
        let evicted = self.inner.drain_evicted();
        for key in &evicted {
            self.expirations.remove(key);
        }
        evicted
    }
}

impl<S: Store> Store for Expiring<S> {
    type Value = S::Value;

    fn load(&mut self, key: &str) -> Result<Option<Self::Value>> {
        self.check_expired(key)?;
        self.inner.load(key)
    }

    fn exists(&mut self, key: &str) -> Result<bool> {
        self.check_expired(key)?;
        self.inner.exists(key)
    }

    fn contains(&mut self, key: &str) -> Result<bool> {
        self.check_expired(key)?;
        self.inner.contains(key)
    }

    fn store(
        &mut self,
        key: &str,
        value: Self::Value,
        options: &StoreOptions,
    ) -> Result<Self::Value> {
        let deadline = self.deadline(options)?;
        self.check_expired(key)?;

        let result = self.inner.store(key, value, options);
        self.evicted = self.forget_evicted();
        let stored = result?;

        if let Some(at) = deadline {
            self.expirations.insert(key.to_string(), at);
        }
        Ok(stored)
    }

    fn delete(&mut self, key: &str) -> Result<Option<Self::Value>> {
        self.check_expired(key)?;
        self.expirations.remove(key);
        self.inner.delete(key)
    }

    fn clear(&mut self) -> Result<()> {
        self.inner.clear()?;
        self.expirations.clear();
        Ok(())
    }

    /// Renews the TTL of `key` without rewriting its value.
    fn refresh(&mut self, key: &str, options: &StoreOptions) -> Result<()> {
        self.check_expired(key)?;
        if !self.inner.contains(key)? {
            return Err(CacheError::NotFound(key.to_string()));
        }

        if let Some(at) = self.deadline(options)? {
            self.expirations.insert(key.to_string(), at);
        }
        Ok(())
    }

    fn drain_evicted(&mut self) -> Vec<String> {
        std::mem::take(&mut self.evicted)
    }

    fn most_recent(&self) -> Option<String> {
        self.inner.most_recent()
    }

    fn least_recent(&self) -> Option<String> {
        self.inner.least_recent()
    }

    fn record_stats(&self, stats: &mut CacheStats) {
        self.inner.record_stats(stats);
        stats.add_expirations(self.expired);
    }
}
