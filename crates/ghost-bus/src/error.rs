//! Transport error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    /// The transport reported an error for this topic.
    #[error("Delivery error on topic {topic}: {reason}")]
    Delivery { topic: String, reason: String },

    #[error("Bus closed")]
    Closed,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BusError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Delivery { .. } => "delivery",
            Self::Closed => "closed",
            Self::ConnectionFailed(_) => "connection_failed",
            Self::ConnectionClosed { .. } => "connection_closed",
            Self::Tungstenite(_) => "websocket",
            Self::Json(_) => "json",
        }
    }
}

pub type BusResult<T> = Result<T, BusError>;
