//! Configuration Module
//!
//! Handles loading the cache chain and server configuration from environment
//! variables.

use std::env;

use tracing::warn;

use crate::cache::{CacheBuilder, Layering};

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Capacity of the LRU layer, None = no LRU layer
    pub max_items: Option<usize>,
    /// Whether the expiration layer is present
    pub expiration: bool,
    /// Order of the expiration and LRU layers
    pub layering: Layering,
    /// Value returned by `get` on a miss
    pub default_value: Option<String>,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ITEMS` - LRU capacity, `0` disables the LRU layer (default: 1000)
    /// - `EXPIRATION` - Enable the expiration layer (default: true)
    /// - `EXPIRATION_LAYER` - `inner` or `outer` (default: inner)
    /// - `DEFAULT_VALUE` - Value returned for missing keys (default: unset)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_items: match parse_var::<usize>("MAX_ITEMS") {
                Some(0) => None,
                Some(n) => Some(n),
                None => defaults.max_items,
            },
            expiration: parse_var("EXPIRATION").unwrap_or(defaults.expiration),
            layering: parse_var("EXPIRATION_LAYER").unwrap_or(defaults.layering),
            default_value: env::var("DEFAULT_VALUE").ok(),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// A builder for the cache chain this configuration describes.
    pub fn builder(&self) -> CacheBuilder<String> {
        let mut builder = CacheBuilder::new()
            .expiration(self.expiration)
            .layering(self.layering);
        if let Some(max_items) = self.max_items {
            builder = builder.max_items(max_items);
        }
        if let Some(default) = &self.default_value {
            builder = builder.default_value(default.clone());
        }
        builder
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_items: Some(1000),
            expiration: true,
            layering: Layering::ExpirationInner,
            default_value: None,
            server_port: 3000,
        }
    }
}

/// Parses an environment variable, ignoring it with a warning if malformed.
fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(name, value = %raw, "ignoring unparseable environment variable");
            None
        }
    }
}
