//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Message lists no tickers")]
    NoTickers,

    #[error("Duplicate asset: {0}")]
    DuplicateAsset(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FeedError {
    /// Short label used for drop diagnostics and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ParseError(_) | Self::Json(_) => "parse_error",
            Self::InvalidData(_) => "invalid_data",
            Self::UnknownAsset(_) => "unknown_asset",
            Self::NoTickers => "no_tickers",
            Self::DuplicateAsset(_) => "duplicate_asset",
            Self::InvalidWindow(_) => "invalid_window",
        }
    }
}

impl From<ghost_core::CoreError> for FeedError {
    fn from(e: ghost_core::CoreError) -> Self {
        Self::InvalidData(e.to_string())
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
