//! Periodic statistics summary.
//!
//! Reads the Prometheus counters and logs a per-asset summary:
//! - price / vibe aggregator updates
//! - signals emitted, skipped, and alerts raised
//! - messages dropped per stream kind

use crate::metrics::{
    AGGREGATOR_UPDATES_TOTAL, ALERTS_TOTAL, MESSAGES_DROPPED_TOTAL, SIGNALS_EMITTED_TOTAL,
    SIGNALS_SKIPPED_TOTAL,
};
use chrono::{DateTime, Utc};
use prometheus::core::Collector;
use prometheus::CounterVec;
use serde::Serialize;
use tracing::info;

/// Counters for one asset since process start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetStats {
    pub asset: String,
    pub price_updates: u64,
    pub vibe_updates: u64,
    pub signals: u64,
    pub skipped: u64,
    pub alerts: u64,
}

/// Statistics reporter.
pub struct StatsReporter {
    assets: Vec<String>,
    start_time: DateTime<Utc>,
}

impl StatsReporter {
    pub fn new(assets: Vec<String>) -> Self {
        Self {
            assets,
            start_time: Utc::now(),
        }
    }

    /// Current statistics for all assets.
    pub fn get_stats(&self) -> Vec<AssetStats> {
        self.assets
            .iter()
            .map(|asset| self.get_asset_stats(asset))
            .collect()
    }

    fn get_asset_stats(&self, asset: &str) -> AssetStats {
        AssetStats {
            asset: asset.to_string(),
            price_updates: counter_value(&AGGREGATOR_UPDATES_TOTAL, &[asset, "price"]),
            vibe_updates: counter_value(&AGGREGATOR_UPDATES_TOTAL, &[asset, "vibe"]),
            signals: counter_value(&SIGNALS_EMITTED_TOTAL, &[asset]),
            skipped: sum_where(&SIGNALS_SKIPPED_TOTAL, "asset", asset),
            alerts: sum_where(&ALERTS_TOTAL, "asset", asset),
        }
    }

    /// Dropped messages for a stream kind, across all reasons.
    pub fn dropped(&self, kind: &str) -> u64 {
        sum_where(&MESSAGES_DROPPED_TOTAL, "kind", kind)
    }

    /// Log the summary.
    pub fn output_summary(&self) {
        let duration = Utc::now() - self.start_time;
        let hours = duration.num_hours();
        let minutes = duration.num_minutes() % 60;

        info!("========== Statistics Summary ==========");
        info!(
            "Period: since {} ({} hours {} minutes)",
            self.start_time.format("%Y-%m-%d %H:%M:%S UTC"),
            hours,
            minutes
        );

        for s in self.get_stats() {
            info!("--- {} ---", s.asset);
            info!(
                "  Updates: price={}, vibe={}",
                s.price_updates, s.vibe_updates
            );
            info!(
                "  Signals: emitted={}, skipped={}, alerts={}",
                s.signals, s.skipped, s.alerts
            );
        }

        info!(
            "Dropped: price={}, sentiment={}",
            self.dropped("price"),
            self.dropped("sentiment")
        );
        info!("========================================");
    }
}

fn counter_value(counter: &CounterVec, labels: &[&str]) -> u64 {
    counter.with_label_values(labels).get() as u64
}

/// Sum a counter over every series whose `label` equals `value`.
fn sum_where(counter: &CounterVec, label: &str, value: &str) -> u64 {
    let mut total = 0.0;
    for mf in counter.collect() {
        for m in mf.get_metric() {
            let matches = m
                .get_label()
                .iter()
                .any(|pair| pair.get_name() == label && pair.get_value() == value);
            if matches {
                total += m.get_counter().get_value();
            }
        }
    }
    total as u64
}
