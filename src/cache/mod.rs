//! Cache Module
//!
//! A uniform key-value contract over interchangeable stores, with
//! time-based expiration and bounded LRU eviction as composable layers.

mod chain;
mod clock;
mod expiration;
mod lru;
mod memory;
mod recency;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use chain::{Cache, CacheBuilder, Layering};
pub use clock::{Clock, ManualClock, SystemClock};
pub use expiration::Expiring;
pub use lru::Lru;
pub use memory::MemoryStore;
pub use recency::{Link, Node, RecencyList};
pub use stats::CacheStats;
pub use store::{DynStore, Store, StoreOptions};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
