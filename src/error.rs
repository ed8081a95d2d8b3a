//! Unified error type for the drawsync engine.
//!
//! This module provides a centralized error handling approach, replacing scattered
//! String-based error returns with a typed `SyncError` enum.
//!
//! # Design Philosophy
//!
//! - **Typed errors**: Each error variant represents a specific failure scenario
//! - **Context preservation**: Errors carry relevant context for debugging
//! - **Easy conversion**: Automatic conversions from common error types (anyhow, diesel)
//! - **Workflow-friendly**: Failures are values; nothing in the engine panics

use thiserror::Error;

/// Unified engine error type.
///
/// The first five variants form the workflow taxonomy (what a caller can
/// meaningfully react to); the rest cover infrastructure failures.
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// Blob or remote object absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Target name already taken on create/rename
    #[error("Name conflict: {0}")]
    Conflict(String),

    /// Transport failure, timeout, or unexpected remote status
    #[error("Network error: {0}")]
    Network(String),

    /// Remote operation rejected for the current credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A record claims a storage location whose backing artifact is missing
    #[error("Inconsistent state: {0}")]
    Inconsistency(String),

    /// Database errors (SQLite, Diesel, connection pool)
    #[error("Storage error: {0}")]
    Storage(String),

    /// File system errors (read/write, permissions)
    #[error("I/O error: {0}")]
    Io(String),

    /// Configuration errors (loading, parsing, validation)
    #[error("Config error: {0}")]
    Config(String),

    /// Generic/internal errors that don't fit other categories
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Create a not-found error with a message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error with a message.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a network error with a message.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an unauthorized error with a message.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create an inconsistency error with a message.
    pub fn inconsistency(msg: impl Into<String>) -> Self {
        Self::Inconsistency(msg.into())
    }

    /// Create a storage error with a message.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an I/O error with a message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Create a config error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error with a message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the error message as a string slice.
    pub fn message(&self) -> &str {
        match self {
            SyncError::NotFound(msg) => msg,
            SyncError::Conflict(msg) => msg,
            SyncError::Network(msg) => msg,
            SyncError::Unauthorized(msg) => msg,
            SyncError::Inconsistency(msg) => msg,
            SyncError::Storage(msg) => msg,
            SyncError::Io(msg) => msg,
            SyncError::Config(msg) => msg,
            SyncError::Internal(msg) => msg,
        }
    }
}

/// Convert from `anyhow::Error` to `SyncError`.
///
/// This implementation preserves the error message and categorizes
/// anyhow errors as internal errors.
impl From<anyhow::Error> for SyncError {
    fn from(err: anyhow::Error) -> Self {
        SyncError::Internal(err.to_string())
    }
}

/// Convert from `diesel::result::Error` to `SyncError`.
///
/// Unique-constraint violations become `Conflict` so the name-uniqueness
/// invariant surfaces as a workflow result rather than a raw database error.
impl From<diesel::result::Error> for SyncError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => SyncError::not_found("Record not found in database"),
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            ) => SyncError::conflict(info.message().to_string()),
            diesel::result::Error::DatabaseError(kind, info) => {
                SyncError::storage(format!("Database error: {:?}: {}", kind, info.message()))
            }
            diesel::result::Error::SerializationError(deser) => {
                SyncError::storage(format!("Serialization error: {}", deser))
            }
            _ => SyncError::storage(format!("Database error: {}", err)),
        }
    }
}

/// Convert from `std::io::Error` to `SyncError`.
impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::io(err.to_string())
    }
}

/// Convert from `diesel::r2d2::PoolError` to `SyncError`.
impl From<diesel::r2d2::PoolError> for SyncError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        SyncError::storage(format!("Connection pool error: {}", err))
    }
}

/// Convert from `reqwest::Error` to `SyncError`.
///
/// Status-code classification happens in the API client; only transport
/// failures arrive here, so everything maps to `Network`.
impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::network("Request timed out")
        } else {
            SyncError::network(err.to_string())
        }
    }
}

/// Convert from `image::ImageError` to `SyncError`.
impl From<image::ImageError> for SyncError {
    fn from(err: image::ImageError) -> Self {
        SyncError::internal(format!("Image error: {}", err))
    }
}

/// Convert from `serde_json::Error` to `SyncError`.
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::internal(format!("JSON error: {}", err))
    }
}

/// Type alias for Result with SyncError.
///
/// This simplifies function signatures throughout the engine.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SyncError::conflict("name already taken");
        assert!(matches!(err, SyncError::Conflict(_)));
        assert_eq!(err.message(), "name already taken");
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::network("connection refused");
        let display = format!("{}", err);
        assert!(display.contains("Network error"));
        assert!(display.contains("connection refused"));
    }

    #[test]
    fn test_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("Something went wrong");
        let sync_err: SyncError = anyhow_err.into();
        assert!(matches!(sync_err, SyncError::Internal(_)));
    }

    #[test]
    fn test_from_diesel_not_found() {
        let diesel_err = diesel::result::Error::NotFound;
        let sync_err: SyncError = diesel_err.into();
        assert!(matches!(sync_err, SyncError::NotFound(_)));
    }

    #[test]
    fn test_from_diesel_unique_violation() {
        let diesel_err = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("UNIQUE constraint failed: drawings.owner_username, drawings.file_name".to_string()),
        );
        let sync_err: SyncError = diesel_err.into();
        assert!(matches!(sync_err, SyncError::Conflict(_)));
        assert!(sync_err.message().contains("UNIQUE constraint failed"));
    }

    #[test]
    fn test_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let sync_err: SyncError = io_err.into();
        assert!(matches!(sync_err, SyncError::Io(_)));
    }
}
