//! Error types for tarchive-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid date key: {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid archive record: {0}")]
    InvalidArchive(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
