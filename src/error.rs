//! Error types for pkgindex
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using IndexerError
pub type Result<T> = std::result::Result<T, IndexerError>;

/// Unified error type for pkgindex operations
#[derive(Debug, Error)]
pub enum IndexerError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),
}
