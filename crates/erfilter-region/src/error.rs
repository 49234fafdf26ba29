//! Error types for erfilter-region

use thiserror::Error;

/// Errors that can occur during region extraction and selection
#[derive(Debug, Error)]
pub enum RegionError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] erfilter_core::Error),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Internal flood-fill state became inconsistent
    #[error("segmentation error: {0}")]
    SegmentationError(String),

    /// Empty image
    #[error("empty image: no pixels to process")]
    EmptyImage,
}

/// Result type for region operations
pub type RegionResult<T> = Result<T, RegionError>;
