//! Error types for erfilter-recog

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during grouping and recognition
#[derive(Debug, Error)]
pub enum RecogError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] erfilter_core::Error),

    /// Region extraction error
    #[error("region error: {0}")]
    Region(#[from] erfilter_region::RegionError),

    /// Transition table file could not be opened or read
    #[error("cannot read transition table {path}: {source}")]
    TableIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while streaming a table
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transition table contents do not match the expected shape
    #[error("invalid transition table: {0}")]
    InvalidTable(String),

    /// Invalid parameter provided
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for recognition operations
pub type RecogResult<T> = Result<T, RecogError>;
