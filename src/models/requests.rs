//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;

use crate::cache::{StoreOptions, MAX_KEY_LENGTH};

/// Checks a key received over HTTP.
fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `ttl`: Optional TTL in seconds (never expires if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }

    /// Store options carried by this request.
    pub fn options(&self) -> StoreOptions {
        StoreOptions {
            expires_in: self.ttl.map(Duration::from_secs),
        }
    }
}

/// Request body for the REFRESH operation (POST /refresh)
///
/// Renews the TTL of an existing key without rewriting its value.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    /// The cache key
    pub key: String,
    /// New TTL in seconds
    pub ttl: u64,
}

impl RefreshRequest {
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }

    pub fn options(&self) -> StoreOptions {
        StoreOptions::expires_in(Duration::from_secs(self.ttl))
    }
}
