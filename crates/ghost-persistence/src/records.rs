//! Persisted record types.
//!
//! One type per output table. Field names are the on-disk column names.

use chrono::{DateTime, Utc};
use ghost_core::{AlertKind, AssetId};
use ghost_detector::DecouplingSignal;
use serde::{Deserialize, Serialize};

/// `price_snapshots` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshotRecord {
    pub ticker: AssetId,
    pub price_usd: f64,
    /// Event time from the message (Unix seconds).
    pub timestamp: f64,
    pub ingested_at: DateTime<Utc>,
}

impl PriceSnapshotRecord {
    pub fn new(ticker: AssetId, price_usd: f64, timestamp: f64) -> Self {
        Self {
            ticker,
            price_usd,
            timestamp,
            ingested_at: Utc::now(),
        }
    }
}

/// `social_signals` row: one scored post for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub ticker: AssetId,
    pub vibe_score: f64,
    pub text: String,
    pub author: String,
    pub source: String,
    /// Event time from the message (Unix seconds).
    pub timestamp: f64,
    pub ingested_at: DateTime<Utc>,
}

/// `decoupling_signals` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub ticker: AssetId,
    /// Emission time (Unix seconds).
    pub timestamp: f64,
    pub price_current: f64,
    pub price_avg: f64,
    pub vibe_current: f64,
    pub vibe_avg: f64,
    pub delta_price: f64,
    pub delta_vibe: f64,
    pub hype_momentum: f64,
    pub vibe_count: usize,
    pub alert: Option<AlertKind>,
    pub recorded_at: DateTime<Utc>,
}

impl From<&DecouplingSignal> for SignalRecord {
    fn from(signal: &DecouplingSignal) -> Self {
        Self {
            ticker: signal.asset.clone(),
            timestamp: signal.timestamp_secs(),
            price_current: signal.price_current,
            price_avg: signal.price_avg,
            vibe_current: signal.vibe_current,
            vibe_avg: signal.vibe_avg,
            delta_price: signal.delta_price,
            delta_vibe: signal.delta_vibe,
            hype_momentum: signal.hype_momentum,
            vibe_count: signal.vibe_count,
            alert: signal.alert,
            recorded_at: Utc::now(),
        }
    }
}
