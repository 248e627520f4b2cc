//! Detector configuration.

use crate::error::{DetectorError, DetectorResult};
use serde::{Deserialize, Serialize};

/// Alert thresholds.
///
/// An alert fires when `hype_momentum > min_hype_momentum` and
/// `delta_price < max_price_move`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Hype momentum (vibe shift x message count) that must be exceeded.
    #[serde(default = "default_min_hype_momentum")]
    pub min_hype_momentum: f64,
    /// Relative price move (vs. window average) that must not be reached.
    /// 0.02 = price has moved less than 2%.
    #[serde(default = "default_max_price_move")]
    pub max_price_move: f64,
}

fn default_min_hype_momentum() -> f64 {
    1.0
}

fn default_max_price_move() -> f64 {
    0.02
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_hype_momentum: default_min_hype_momentum(),
            max_price_move: default_max_price_move(),
        }
    }
}

impl DetectorConfig {
    /// Validate configuration values.
    ///
    /// Both thresholds must be finite numbers.
    pub fn validate(&self) -> DetectorResult<()> {
        if !self.min_hype_momentum.is_finite() {
            return Err(DetectorError::ConfigError(format!(
                "min_hype_momentum ({}) must be finite",
                self.min_hype_momentum
            )));
        }
        if !self.max_price_move.is_finite() {
            return Err(DetectorError::ConfigError(format!(
                "max_price_move ({}) must be finite",
                self.max_price_move
            )));
        }
        Ok(())
    }
}
