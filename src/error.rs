//! Error types for the layered cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for stores, decorators and the HTTP adapter.
#[derive(Error, Debug)]
pub enum CacheError {
    /// `fetch` found no value and no fallback was supplied
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The backing store failed or rejected the operation
    #[error("Backing store failure: {0}")]
    Backend(String),

    /// The LRU layer evicted everything it could and the write still failed
    #[error("Capacity exhausted after evicting down from {max_items} items")]
    CapacityExhausted {
        /// Configured capacity of the LRU layer
        max_items: usize,
        /// The last backing store failure
        #[source]
        source: Box<CacheError>,
    },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid layer configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// True for failures reported by the backing store itself.
    pub fn is_backend(&self) -> bool {
        matches!(self, CacheError::Backend(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Backend(_) | CacheError::CapacityExhausted { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CacheError::InvalidConfig(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the layered cache.
pub type Result<T> = std::result::Result<T, CacheError>;
