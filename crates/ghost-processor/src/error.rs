//! Processor error types.

use std::fmt;
use thiserror::Error;

/// External dependency of a processing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    /// Message source (bus / relay).
    Source,
    /// Sentiment scorer.
    Scorer,
    /// Signal sink (persistence).
    Sink,
}

impl Collaborator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Scorer => "scorer",
            Self::Sink => "sink",
        }
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A collaborator failed or timed out; the cycle was abandoned.
    #[error("{collaborator} unavailable: {reason}")]
    CollaboratorUnavailable {
        collaborator: Collaborator,
        reason: String,
    },

    #[error("Feed error: {0}")]
    Feed(#[from] ghost_feed::FeedError),

    #[error("Scorer error: {0}")]
    Scorer(#[from] ghost_scorer::ScorerError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] ghost_persistence::PersistenceError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] ghost_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessorError {
    pub fn unavailable(collaborator: Collaborator, reason: impl fmt::Display) -> Self {
        Self::CollaboratorUnavailable {
            collaborator,
            reason: reason.to_string(),
        }
    }

    /// Collaborator behind a retryable failure, if any.
    pub fn collaborator(&self) -> Option<Collaborator> {
        match self {
            Self::CollaboratorUnavailable { collaborator, .. } => Some(*collaborator),
            _ => None,
        }
    }
}

pub type ProcessorResult<T> = Result<T, ProcessorError>;
