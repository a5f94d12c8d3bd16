//! Error types for the caching subsystem
//!
//! Provides unified error handling using thiserror.
//!
//! A cache miss is never an error: read operations report absence through
//! `Option` or absent map keys. Errors cover the loud failure modes of the
//! shared tier (serialization and backend faults) plus configuration problems.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the caching subsystem.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A value could not be serialized for the shared tier, or a stored
    /// payload could not be deserialized back. Never masked as a miss.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The shared cache backend rejected or failed an operation.
    #[error("shared cache backend error: {0}")]
    Backend(String),

    /// Invalid cache configuration (e.g. a malformed connection URL).
    #[error("invalid cache configuration: {0}")]
    Config(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching subsystem.
pub type Result<T> = std::result::Result<T, CacheError>;
