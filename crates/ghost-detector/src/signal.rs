//! Decoupling signal type.

use chrono::{DateTime, Utc};
use ghost_core::{AlertKind, AssetId};
use serde::{Deserialize, Serialize};

/// One evaluation of an asset's windows.
///
/// Produced once per asset per cycle, whether or not an alert fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecouplingSignal {
    /// Asset the windows belong to.
    pub asset: AssetId,
    /// Emission time (wall clock).
    pub emitted_at: DateTime<Utc>,
    /// Latest price in the window.
    pub price_current: f64,
    /// Mean price over the window.
    pub price_avg: f64,
    /// Latest vibe score (0.0 when no sentiment data yet).
    pub vibe_current: f64,
    /// Mean vibe score (0.0 when no sentiment data yet).
    pub vibe_avg: f64,
    /// Relative price move from the average.
    pub delta_price: f64,
    /// Vibe shift from the average.
    pub delta_vibe: f64,
    /// Volume-gated vibe shift.
    pub hype_momentum: f64,
    /// Vibe messages in the window.
    pub vibe_count: usize,
    pub alert: Option<AlertKind>,
}

impl DecouplingSignal {
    pub fn is_alert(&self) -> bool {
        self.alert.is_some()
    }

    /// Emission time as fractional Unix seconds.
    pub fn timestamp_secs(&self) -> f64 {
        self.emitted_at.timestamp_micros() as f64 / 1_000_000.0
    }
}
