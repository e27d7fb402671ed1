//! Layered Cache - a uniform key-value contract over interchangeable stores
//!
//! Time-based expiration and bounded LRU eviction are layers that wrap any
//! store and compose with each other. An optional HTTP adapter serves a
//! chain over REST.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::{Cache, CacheBuilder, Layering, MemoryStore, Store, StoreOptions};
pub use config::Config;
pub use error::{CacheError, Result};
