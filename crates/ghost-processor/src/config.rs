//! Application configuration.

use crate::error::{ProcessorError, ProcessorResult};
use ghost_bus::RelayConfig;
use ghost_core::AssetId;
use ghost_detector::DetectorConfig;
use ghost_scorer::ScorerConfig;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Processing loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Length of the price and vibe windows (seconds). Default: 300.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// How long a single topic poll waits for a message (ms). Default: 5000.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    /// Upper bound on a single sink append (ms). Default: 5000.
    #[serde(default = "default_sink_timeout_ms")]
    pub sink_timeout_ms: u64,
    /// Upper bound on a single scorer call (ms). Default: 10000.
    #[serde(default = "default_scorer_timeout_ms")]
    pub scorer_timeout_ms: u64,
    /// Shared topic carrying social posts. Default: "live-social".
    #[serde(default = "default_sentiment_topic")]
    pub sentiment_topic: String,
    /// Statistics summary interval (seconds). Default: 3600.
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

fn default_window_seconds() -> u64 {
    300
}

fn default_poll_timeout_ms() -> u64 {
    5000
}

fn default_sink_timeout_ms() -> u64 {
    5000
}

fn default_scorer_timeout_ms() -> u64 {
    10_000
}

fn default_sentiment_topic() -> String {
    "live-social".to_string()
}

fn default_stats_interval_secs() -> u64 {
    3600
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            poll_timeout_ms: default_poll_timeout_ms(),
            sink_timeout_ms: default_sink_timeout_ms(),
            scorer_timeout_ms: default_scorer_timeout_ms(),
            sentiment_topic: default_sentiment_topic(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

impl ProcessorConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn sink_timeout(&self) -> Duration {
        Duration::from_millis(self.sink_timeout_ms)
    }

    pub fn scorer_timeout(&self) -> Duration {
        Duration::from_millis(self.scorer_timeout_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}

/// Tracked asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Canonical asset id (e.g., "bitcoin").
    pub id: AssetId,
    /// Price topic. Defaults to the asset id.
    #[serde(default)]
    pub price_topic: Option<String>,
    /// Alternative spellings in social posts (e.g., "btc").
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl AssetConfig {
    pub fn new(id: &str) -> Self {
        Self {
            id: AssetId::new(id),
            price_topic: None,
            aliases: Vec::new(),
        }
    }

    pub fn price_topic(&self) -> &str {
        self.price_topic.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Retry policy for collaborator failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Consecutive failed cycles before giving up (0 = never). Default: 10.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// Base delay for exponential backoff (ms). Default: 1000.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Maximum backoff delay (ms). Default: 60000.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

fn default_max_consecutive_failures() -> u32 {
    10
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_retry_max_delay_ms() -> u64 {
    60_000
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: default_max_consecutive_failures(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

/// Message transport configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Per-topic queue capacity. Default: 1024.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Broker relay WebSocket URL. No relay when unset.
    #[serde(default)]
    pub relay_url: Option<String>,
    /// Maximum relay reconnection attempts (0 = infinite).
    #[serde(default)]
    pub max_reconnect_attempts: u32,
    /// Base delay for relay reconnection backoff (ms).
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Maximum relay reconnection delay (ms).
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_reconnect_base_delay_ms() -> u64 {
    1000
}

fn default_reconnect_max_delay_ms() -> u64 {
    60_000
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            relay_url: None,
            max_reconnect_attempts: 0,
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Output directory for JSON Lines files. Default: "data".
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "data".to_string()
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level for ghost crates when `RUST_LOG` is unset. Default: "info".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Prometheus exporter port (0 = disabled). Default: 9090.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub processor: ProcessorConfig,
    /// Tracked assets, in evaluation order.
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub scorer: ScorerConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> ProcessorResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProcessorError::Config(format!("Failed to read config {path}: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> ProcessorResult<Self> {
        toml::from_str(content)
            .map_err(|e| ProcessorError::Config(format!("Failed to parse config: {e}")))
    }

    /// Validate configuration values.
    pub fn validate(&self) -> ProcessorResult<()> {
        if self.assets.is_empty() {
            return Err(ProcessorError::Config(
                "at least one [[assets]] entry is required".to_string(),
            ));
        }
        if self.processor.window_seconds == 0 {
            return Err(ProcessorError::Config(
                "processor.window_seconds must be greater than 0".to_string(),
            ));
        }
        for (name, value) in [
            ("poll_timeout_ms", self.processor.poll_timeout_ms),
            ("sink_timeout_ms", self.processor.sink_timeout_ms),
            ("scorer_timeout_ms", self.processor.scorer_timeout_ms),
        ] {
            if value == 0 {
                return Err(ProcessorError::Config(format!(
                    "processor.{name} must be greater than 0"
                )));
            }
        }
        if self.processor.sentiment_topic.trim().is_empty() {
            return Err(ProcessorError::Config(
                "processor.sentiment_topic must not be empty".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        let mut aliases: HashMap<String, &AssetId> = HashMap::new();
        for asset in &self.assets {
            if !ids.insert(&asset.id) {
                return Err(ProcessorError::Config(format!(
                    "duplicate asset id: {}",
                    asset.id
                )));
            }
            if asset.price_topic() == self.processor.sentiment_topic {
                return Err(ProcessorError::Config(format!(
                    "asset {} uses the sentiment topic as its price topic",
                    asset.id
                )));
            }
            for alias in &asset.aliases {
                let key = alias.trim().to_lowercase();
                if let Some(other) = aliases.insert(key, &asset.id) {
                    if other != &asset.id {
                        return Err(ProcessorError::Config(format!(
                            "alias {alias} maps to both {other} and {}",
                            asset.id
                        )));
                    }
                }
            }
        }

        self.detector
            .validate()
            .map_err(|e| ProcessorError::Config(e.to_string()))?;
        self.scorer
            .validate()
            .map_err(|e| ProcessorError::Config(e.to_string()))?;

        if self.supervisor.retry_base_delay_ms > self.supervisor.retry_max_delay_ms {
            return Err(ProcessorError::Config(format!(
                "supervisor.retry_base_delay_ms ({}) exceeds retry_max_delay_ms ({})",
                self.supervisor.retry_base_delay_ms, self.supervisor.retry_max_delay_ms
            )));
        }

        Ok(())
    }

    /// Every topic the processor polls: price topics then the sentiment topic.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self
            .assets
            .iter()
            .map(|a| a.price_topic().to_string())
            .collect();
        topics.push(self.processor.sentiment_topic.clone());
        topics
    }

    /// Relay client settings, when a relay URL is configured.
    pub fn relay_config(&self) -> Option<RelayConfig> {
        let url = self.bus.relay_url.as_ref().filter(|u| !u.is_empty())?;
        Some(RelayConfig {
            url: url.clone(),
            topics: self.topics(),
            max_reconnect_attempts: self.bus.max_reconnect_attempts,
            reconnect_base_delay_ms: self.bus.reconnect_base_delay_ms,
            reconnect_max_delay_ms: self.bus.reconnect_max_delay_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[processor]
window_seconds = 300
poll_timeout_ms = 5000
sentiment_topic = "live-social"

[[assets]]
id = "bitcoin"
aliases = ["btc", "bitconi", "bitcon", "bitocin"]

[[assets]]
id = "dogecoin"
price_topic = "dogecoin-prices"
aliases = ["doge", "dodcoin", "dogcoin"]

[detector]
min_hype_momentum = 1.0
max_price_move = 0.02

[bus]
relay_url = "ws://127.0.0.1:8765"
"#;

    fn valid_config() -> AppConfig {
        AppConfig {
            assets: vec![AssetConfig::new("bitcoin"), AssetConfig::new("dogecoin")],
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.assets.len(), 2);
        assert_eq!(config.assets[0].price_topic(), "bitcoin");
        assert_eq!(config.assets[1].price_topic(), "dogecoin-prices");
        assert_eq!(config.assets[1].aliases.len(), 3);
        // Sections left out fall back to defaults
        assert_eq!(config.supervisor, SupervisorConfig::default());
        assert_eq!(config.persistence.data_dir, "data");
        assert_eq!(config.processor.scorer_timeout_ms, 10_000);
    }

    #[test]
    fn test_topics_and_relay_config() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(
            config.topics(),
            vec!["bitcoin", "dogecoin-prices", "live-social"]
        );
        let relay = config.relay_config().unwrap();
        assert_eq!(relay.url, "ws://127.0.0.1:8765");
        assert_eq!(relay.topics.len(), 3);

        assert!(valid_config().relay_config().is_none());
    }

    #[test]
    fn test_asset_ids_normalized() {
        let config = AppConfig::from_toml("[[assets]]\nid = \" Bitcoin \"").unwrap();
        assert_eq!(config.assets[0].id.as_str(), "bitcoin");
    }

    #[test]
    fn test_validate_rejects_empty_assets() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("assets"));
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let config = AppConfig {
            assets: vec![AssetConfig::new("bitcoin"), AssetConfig::new("BITCOIN")],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate asset id"));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = valid_config();
        config.processor.window_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = valid_config();
        config.processor.sink_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sink_timeout_ms"));

        let mut config = valid_config();
        config.processor.scorer_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scorer_timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_conflicting_alias() {
        let mut config = valid_config();
        config.assets[0].aliases = vec!["coin".to_string()];
        config.assets[1].aliases = vec!["COIN".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("alias"));
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let mut config = valid_config();
        config.detector.max_price_move = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_price_topic_clash() {
        let mut config = valid_config();
        config.assets[0].price_topic = Some("live-social".to_string());
        assert!(config.validate().is_err());
    }
}
