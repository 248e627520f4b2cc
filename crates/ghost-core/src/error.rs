//! Error types for ghost-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid asset id: {0}")]
    InvalidAssetId(String),

    #[error("Invalid data point: {0}")]
    InvalidDataPoint(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
