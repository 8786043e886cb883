//! Error types for hashlog
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using HashLogError
pub type Result<T> = std::result::Result<T, HashLogError>;

/// Unified error type for hashlog operations
#[derive(Debug, Error)]
pub enum HashLogError {
    // -------------------------------------------------------------------------
    // Log File Errors
    // -------------------------------------------------------------------------
    #[error("Failed to open log file {}: {source}", path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Read error: {0}")]
    Read(#[source] std::io::Error),

    #[error("Write error: {0}")]
    Write(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Lookup / Argument Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    #[error("Key too large: {len} bytes (max {max})")]
    KeyTooLarge { len: usize, max: usize },

    #[error("Empty values are reserved for tombstones; use delete instead")]
    EmptyValue,

    // -------------------------------------------------------------------------
    // Handle Errors
    // -------------------------------------------------------------------------
    #[error("Database not open: {0}")]
    EngineNotOpen(String),

    #[error("Invalid database handle: {0:?}")]
    InvalidHandle(String),

    // -------------------------------------------------------------------------
    // Scan Errors (recovered internally by resynchronization)
    // -------------------------------------------------------------------------
    #[error("Corrupt record at offset {offset}: {reason}")]
    CorruptRecord { offset: u64, reason: String },

    #[error("No record marker found at or after offset {offset}")]
    IndicatorNotFound { offset: u64 },

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HashLogError {
    /// Whether this error is an expected, non-fatal outcome of a request
    /// (a miss or a rejected argument) rather than an I/O fault.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HashLogError::KeyNotFound
                | HashLogError::KeyTooLarge { .. }
                | HashLogError::EmptyValue
                | HashLogError::EngineNotOpen(_)
                | HashLogError::InvalidHandle(_)
        )
    }
}
