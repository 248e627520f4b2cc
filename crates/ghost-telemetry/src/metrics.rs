//! Prometheus metrics for the GhostMarket processor.
//!
//! Covers:
//! - Message intake and drops (per stream kind and reason)
//! - Aggregator updates and window sizes per asset
//! - Signal emission, skips and alerts
//! - Cycle duration and collaborator failures
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram, register_int_gauge,
    CounterVec, GaugeVec, Histogram, IntGauge,
};

/// Raw messages received.
/// Labels: kind (price/sentiment)
pub static MESSAGES_RECEIVED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ghost_messages_received_total",
        "Total raw messages received from the message source",
        &["kind"]
    )
    .unwrap()
});

/// Messages dropped before reaching an aggregator.
/// Labels: kind (price/sentiment), reason
pub static MESSAGES_DROPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ghost_messages_dropped_total",
        "Total messages dropped (parse error, unknown asset, expired, ...)",
        &["kind", "reason"]
    )
    .unwrap()
});

/// Aggregator updates.
/// Labels: asset, kind (price/vibe)
pub static AGGREGATOR_UPDATES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ghost_aggregator_updates_total",
        "Total points added to per-asset aggregators",
        &["asset", "kind"]
    )
    .unwrap()
});

/// Points currently held in a window.
/// Labels: asset, kind (price/vibe)
pub static WINDOW_COUNT: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "ghost_window_count",
        "Points currently retained in the aggregator window",
        &["asset", "kind"]
    )
    .unwrap()
});

/// Signals emitted.
pub static SIGNALS_EMITTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ghost_signals_emitted_total",
        "Total decoupling signals emitted",
        &["asset"]
    )
    .unwrap()
});

/// Evaluations that produced no signal.
/// Labels: asset, reason (no_price_data/zero_price_average)
pub static SIGNALS_SKIPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ghost_signals_skipped_total",
        "Total evaluations skipped without a signal",
        &["asset", "reason"]
    )
    .unwrap()
});

/// Alerts raised.
pub static ALERTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ghost_alerts_total",
        "Total decoupling alerts raised",
        &["asset", "alert"]
    )
    .unwrap()
});

/// Latest hype momentum per asset.
pub static HYPE_MOMENTUM: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "ghost_hype_momentum",
        "Latest hype momentum (vibe delta x message count)",
        &["asset"]
    )
    .unwrap()
});

/// Latest relative price move per asset.
pub static DELTA_PRICE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "ghost_delta_price",
        "Latest relative price move from the window average",
        &["asset"]
    )
    .unwrap()
});

/// Cycle duration in milliseconds.
pub static CYCLE_DURATION_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "ghost_cycle_duration_ms",
        "Duration of one poll-update-evaluate-emit cycle in milliseconds",
        vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0, 30000.0]
    )
    .unwrap()
});

/// Collaborator failures.
/// Labels: collaborator (source/scorer/sink)
pub static COLLABORATOR_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ghost_collaborator_failures_total",
        "Total cycles aborted by a collaborator failure",
        &["collaborator"]
    )
    .unwrap()
});

/// Consecutive failed cycles (reset on success).
pub static CONSECUTIVE_FAILURES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "ghost_consecutive_failures",
        "Consecutive cycles that ended in a collaborator failure"
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a raw message received.
    pub fn message_received(kind: &str) {
        MESSAGES_RECEIVED_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record a dropped message.
    pub fn message_dropped(kind: &str, reason: &str) {
        MESSAGES_DROPPED_TOTAL
            .with_label_values(&[kind, reason])
            .inc();
    }

    /// Record an aggregator update and the resulting window size.
    pub fn aggregator_updated(asset: &str, kind: &str, window_count: usize) {
        AGGREGATOR_UPDATES_TOTAL
            .with_label_values(&[asset, kind])
            .inc();
        WINDOW_COUNT
            .with_label_values(&[asset, kind])
            .set(window_count as f64);
    }

    /// Record an emitted signal.
    pub fn signal_emitted(asset: &str, hype_momentum: f64, delta_price: f64) {
        SIGNALS_EMITTED_TOTAL.with_label_values(&[asset]).inc();
        HYPE_MOMENTUM.with_label_values(&[asset]).set(hype_momentum);
        DELTA_PRICE.with_label_values(&[asset]).set(delta_price);
    }

    /// Record a skipped evaluation.
    pub fn signal_skipped(asset: &str, reason: &str) {
        SIGNALS_SKIPPED_TOTAL
            .with_label_values(&[asset, reason])
            .inc();
    }

    /// Record an alert.
    pub fn alert(asset: &str, alert: &str) {
        ALERTS_TOTAL.with_label_values(&[asset, alert]).inc();
    }

    /// Record cycle duration.
    pub fn cycle_duration(duration_ms: f64) {
        CYCLE_DURATION_MS.observe(duration_ms);
    }

    /// Record a collaborator failure.
    pub fn collaborator_failure(collaborator: &str) {
        COLLABORATOR_FAILURES_TOTAL
            .with_label_values(&[collaborator])
            .inc();
    }

    /// Update consecutive failure count.
    pub fn consecutive_failures(count: u32) {
        CONSECUTIVE_FAILURES.set(i64::from(count));
    }
}
