//! Error types for the tiered cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache backends and the coordinator.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A backend operation failed (storage fault, network fault, ...)
    #[error("Backend failure: {0}")]
    Backend(String),

    /// Invalid request data (oversized key/value, bad pattern, non-integer counter)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Backend is full and eviction failed
    #[error("Cache full: {0}")]
    CacheFull(String),
}

// == Result Type Alias ==
/// Convenience Result type for the tiered cache.
pub type Result<T> = std::result::Result<T, CacheError>;
