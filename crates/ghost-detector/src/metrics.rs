//! Decoupling metrics.
//!
//! Pure functions over window statistics:
//! - `ΔP = (P_current - P_avg) / P_avg`
//! - `ΔV = V_current - V_avg`
//! - `M_hype = ΔV × N` where N is the vibe message count in the window

use crate::config::DetectorConfig;
use ghost_core::AlertKind;

/// Relative price move from the rolling average.
///
/// Returns `None` when the average is zero (nothing to compare against yet).
pub fn delta_price(p_current: f64, p_avg: f64) -> Option<f64> {
    if p_avg == 0.0 {
        return None;
    }
    let dp = (p_current - p_avg) / p_avg;
    dp.is_finite().then_some(dp)
}

/// Absolute vibe shift from the rolling average.
pub fn delta_vibe(v_current: f64, v_avg: f64) -> f64 {
    v_current - v_avg
}

/// Volume-gated hype signal.
///
/// A strong shift carried by few messages stays small; a weaker shift
/// carried by many messages can still be large.
pub fn hype_momentum(delta_vibe: f64, count: usize) -> f64 {
    delta_vibe * count as f64
}

/// Alert when hype momentum is high but price has not reacted yet.
pub fn classify_alert(
    hype_momentum: f64,
    delta_price: f64,
    config: &DetectorConfig,
) -> Option<AlertKind> {
    if hype_momentum > config.min_hype_momentum && delta_price < config.max_price_move {
        Some(AlertKind::ImminentHypePump)
    } else {
        None
    }
}
