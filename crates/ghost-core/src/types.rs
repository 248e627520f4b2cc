//! Shared value types.

use crate::error::{CoreError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single timestamped observation.
///
/// `timestamp` is Unix time in (fractional) seconds as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub timestamp: f64,
    pub value: f64,
}

impl DataPoint {
    /// Create a data point, rejecting NaN and infinities.
    pub fn new(value: f64, timestamp: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(CoreError::InvalidDataPoint(format!(
                "value {value} is not finite"
            )));
        }
        if !timestamp.is_finite() {
            return Err(CoreError::InvalidDataPoint(format!(
                "timestamp {timestamp} is not finite"
            )));
        }
        Ok(Self { timestamp, value })
    }
}

/// Alert classification for a decoupling signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    /// Sentiment momentum is up while price has not reacted yet.
    #[serde(rename = "IMMINENT_HYPE_PUMP")]
    ImminentHypePump,
}

impl AlertKind {
    /// Wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImminentHypePump => "IMMINENT_HYPE_PUMP",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current wall-clock time as fractional Unix seconds.
pub fn now_unix_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
