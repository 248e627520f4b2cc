//! Decoupling detector implementation.
//!
//! Turns an asset's window snapshot into a [`DecouplingSignal`]:
//! - Missing sentiment history counts as neutral (0.0), so a lagging
//!   vibe stream never blocks emission.
//! - A zero price average cannot produce a relative move; that asset is
//!   skipped for the cycle instead.

use crate::config::DetectorConfig;
use crate::metrics::{classify_alert, delta_price, delta_vibe, hype_momentum};
use crate::signal::DecouplingSignal;
use chrono::{DateTime, Utc};
use ghost_feed::{AssetSnapshot, AssetState};
use tracing::{debug, info};

/// Neutral vibe used when an asset has no sentiment data in its window.
const NEUTRAL_VIBE: f64 = 0.0;

/// Why no signal was produced for an asset this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Price window is empty.
    NoPriceData,
    /// Price window average is zero.
    ZeroPriceAverage,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPriceData => "no_price_data",
            Self::ZeroPriceAverage => "zero_price_average",
        }
    }
}

/// Outcome of evaluating one asset.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Signal(DecouplingSignal),
    Skipped(SkipReason),
}

/// Decoupling detector.
///
/// Stateless apart from its thresholds; all history lives in the windows.
#[derive(Debug, Clone, Default)]
pub struct DecouplingDetector {
    config: DetectorConfig,
}

impl DecouplingDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Evaluate an asset's current windows.
    pub fn evaluate(&self, state: &AssetState, now: DateTime<Utc>) -> Evaluation {
        match state.snapshot() {
            Some(snapshot) => self.evaluate_snapshot(&snapshot, now),
            None => Evaluation::Skipped(SkipReason::NoPriceData),
        }
    }

    /// Evaluate a snapshot taken from an asset's windows.
    pub fn evaluate_snapshot(&self, snapshot: &AssetSnapshot, now: DateTime<Utc>) -> Evaluation {
        let Some(dp) = delta_price(snapshot.price_current, snapshot.price_avg) else {
            return Evaluation::Skipped(SkipReason::ZeroPriceAverage);
        };

        let vibe_current = snapshot.vibe_current.unwrap_or(NEUTRAL_VIBE);
        let vibe_avg = snapshot.vibe_avg.unwrap_or(NEUTRAL_VIBE);
        let dv = delta_vibe(vibe_current, vibe_avg);
        let momentum = hype_momentum(dv, snapshot.vibe_count);
        let alert = classify_alert(momentum, dp, &self.config);

        let signal = DecouplingSignal {
            asset: snapshot.asset.clone(),
            emitted_at: now,
            price_current: snapshot.price_current,
            price_avg: snapshot.price_avg,
            vibe_current,
            vibe_avg,
            delta_price: dp,
            delta_vibe: dv,
            hype_momentum: momentum,
            vibe_count: snapshot.vibe_count,
            alert,
        };

        if let Some(kind) = alert {
            info!(
                asset = %signal.asset,
                alert = %kind,
                hype_momentum = momentum,
                delta_price = dp,
                vibe_count = snapshot.vibe_count,
                "Decoupling alert"
            );
        } else {
            debug!(
                asset = %signal.asset,
                hype_momentum = momentum,
                delta_price = dp,
                "No alert"
            );
        }

        Evaluation::Signal(signal)
    }
}
