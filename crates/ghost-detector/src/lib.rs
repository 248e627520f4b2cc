//! Decoupling detection for GhostMarket.
//!
//! Detects when social sentiment momentum moves ahead of price: the vibe
//! shift, gated by message volume, is materially positive while the price
//! has not yet moved away from its rolling average.

pub mod config;
pub mod detector;
pub mod error;
pub mod metrics;
pub mod signal;

pub use config::DetectorConfig;
pub use detector::{DecouplingDetector, Evaluation, SkipReason};
pub use error::{DetectorError, DetectorResult};
pub use metrics::{classify_alert, delta_price, delta_vibe, hype_momentum};
pub use signal::DecouplingSignal;
