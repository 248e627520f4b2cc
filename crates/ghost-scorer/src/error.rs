//! Scorer error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid classifier response: {0}")]
    InvalidResponse(String),

    #[error("Unknown sentiment label: {0}")]
    UnknownLabel(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type ScorerResult<T> = Result<T, ScorerError>;
