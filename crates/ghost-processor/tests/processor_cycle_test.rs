//! End-to-end cycle tests: topic bus in, lexicon/fixed scorer, recording sink out.

use ghost_bus::TopicBus;
use ghost_core::{AlertKind, AssetId};
use ghost_persistence::{JsonlSink, MemorySink};
use ghost_processor::{AppConfig, Collaborator, SignalProcessor, Supervisor};
use ghost_scorer::{BoxFuture, LexiconScorer, ScorerResult, SentimentScorer};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Scorer returning a value that the test can change between cycles.
struct ScriptedScorer {
    bits: AtomicU64,
}

impl ScriptedScorer {
    fn new(score: f64) -> Self {
        Self {
            bits: AtomicU64::new(score.to_bits()),
        }
    }

    fn set(&self, score: f64) {
        self.bits.store(score.to_bits(), Ordering::SeqCst);
    }
}

impl SentimentScorer for ScriptedScorer {
    fn score<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, ScorerResult<f64>> {
        let score = f64::from_bits(self.bits.load(Ordering::SeqCst));
        Box::pin(std::future::ready(Ok(score)))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn default_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml")
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::from_file(default_config_path().to_str().unwrap()).unwrap();
    config.processor.poll_timeout_ms = 5;
    config.processor.scorer_timeout_ms = 200;
    config
}

fn price(asset: &str, price: f64, ts: f64) -> Vec<u8> {
    format!(r#"{{"asset":"{asset}","price_usd":{price},"timestamp":{ts}}}"#).into_bytes()
}

fn post(text: &str, tickers: &[&str], ts: f64) -> Vec<u8> {
    serde_json::json!({
        "text": text,
        "tickers": tickers,
        "timestamp": ts,
        "author": "tester",
        "source": "telegram",
    })
    .to_string()
    .into_bytes()
}

#[test]
fn default_config_is_valid() {
    let config = AppConfig::from_file(default_config_path().to_str().unwrap()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.assets.len(), 2);
    assert_eq!(config.detector.min_hype_momentum, 1.0);
    assert_eq!(config.detector.max_price_move, 0.02);
}

#[tokio::test]
async fn imminent_hype_pump_end_to_end() {
    let bus = Arc::new(TopicBus::default());
    let sink = Arc::new(MemorySink::new());
    let scorer = Arc::new(ScriptedScorer::new(0.1));
    let mut processor =
        SignalProcessor::new(&test_config(), bus.clone(), scorer.clone(), sink.clone()).unwrap();

    // Price average 62000, latest 63200 (delta ~0.0194).
    bus.publish("bitcoin", price("bitcoin", 60800.0, 1000.0)).unwrap();
    processor.run_cycle().await.unwrap();
    bus.publish("bitcoin", price("bitcoin", 63200.0, 1001.0)).unwrap();
    processor.run_cycle().await.unwrap();

    // 199 posts at 0.1, then one at 1.0: the window averages
    // (199 * 0.1 + 1.0) / 200 = 0.1045, so the shift is 0.8955 over 200 msgs.
    for i in 0..199 {
        bus.publish("live-social", post("quiet day", &["btc"], 1002.0 + f64::from(i) * 0.1))
            .unwrap();
        processor.run_cycle().await.unwrap();
    }
    scorer.set(1.0);
    bus.publish("live-social", post("BTC TO THE MOON", &["bitconi"], 1030.0))
        .unwrap();
    let report = processor.run_cycle().await.unwrap();

    let signal = report
        .signals
        .iter()
        .find(|s| s.asset.as_str() == "bitcoin")
        .unwrap();
    assert_eq!(signal.vibe_count, 200);
    assert!((signal.price_avg - 62000.0).abs() < 1e-6);
    assert!((signal.delta_price - 0.019_354_8).abs() < 1e-6);
    assert!((signal.hype_momentum - 0.8955 * 200.0).abs() < 1e-6);
    assert_eq!(signal.alert, Some(AlertKind::ImminentHypePump));

    let persisted = sink.signals();
    let last = persisted.last().unwrap();
    assert_eq!(last.ticker, AssetId::new("bitcoin"));
    assert_eq!(last.alert, Some(AlertKind::ImminentHypePump));
    assert_eq!(sink.sentiment().len(), 200);
}

#[tokio::test]
async fn asset_without_sentiment_emits_neutral_signal_every_cycle() {
    let bus = Arc::new(TopicBus::default());
    let sink = Arc::new(MemorySink::new());
    let mut processor = SignalProcessor::new(
        &test_config(),
        bus.clone(),
        Arc::new(LexiconScorer::default()),
        sink.clone(),
    )
    .unwrap();

    bus.publish("dogecoin", price("dogecoin", 0.25, 1000.0)).unwrap();
    for _ in 0..3 {
        let report = processor.run_cycle().await.unwrap();
        let doge = report
            .signals
            .iter()
            .find(|s| s.asset.as_str() == "dogecoin")
            .unwrap();
        assert_eq!(doge.vibe_current, 0.0);
        assert_eq!(doge.vibe_avg, 0.0);
        assert_eq!(doge.hype_momentum, 0.0);
        assert!(doge.alert.is_none());
    }
    assert_eq!(sink.signals().len(), 3);
}

#[tokio::test]
async fn aliases_normalize_to_canonical_ids() {
    let bus = Arc::new(TopicBus::default());
    let sink = Arc::new(MemorySink::new());
    let mut processor = SignalProcessor::new(
        &test_config(),
        bus.clone(),
        Arc::new(LexiconScorer::default()),
        sink.clone(),
    )
    .unwrap();

    for (i, tickers) in [
        vec!["BTC", "doge"],
        vec!["bitocin", "dodcoin"],
        vec!["$btc", "dogcoin", "pepe"],
    ]
    .into_iter()
    .enumerate()
    {
        bus.publish("live-social", post("bullish pump", &tickers, 1000.0 + i as f64))
            .unwrap();
        processor.run_cycle().await.unwrap();
    }

    let registry = processor.registry();
    assert_eq!(registry.get(&AssetId::new("bitcoin")).unwrap().vibe().count(), 3);
    assert_eq!(registry.get(&AssetId::new("dogecoin")).unwrap().vibe().count(), 3);

    let records = sink.sentiment();
    let tickers: Vec<&str> = records.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(
        tickers,
        vec!["bitcoin", "dogecoin", "bitcoin", "dogecoin", "bitcoin", "dogecoin"]
    );
    // Same post scored once and shared by every asset it names.
    assert_eq!(records[0].vibe_score, records[1].vibe_score);
    assert!(records[0].vibe_score > 0.0);
}

#[tokio::test]
async fn malformed_messages_are_dropped_without_side_effects() {
    let bus = Arc::new(TopicBus::default());
    let sink = Arc::new(MemorySink::new());
    let mut processor = SignalProcessor::new(
        &test_config(),
        bus.clone(),
        Arc::new(LexiconScorer::default()),
        sink.clone(),
    )
    .unwrap();

    bus.publish("bitcoin", br#"{"asset":"bitcoin","price_usd":"high","timestamp":1}"#.to_vec())
        .unwrap();
    bus.publish(
        "dogecoin",
        br#"{"asset":"dogecoin","price_usd":0.2,"timestamp":1,"extra":true}"#.to_vec(),
    )
    .unwrap();
    bus.publish("live-social", post("moon", &["pepe"], 1.0)).unwrap();

    let report = processor.run_cycle().await.unwrap();
    assert_eq!(report.dropped, 3);
    assert!(report.signals.is_empty());
    assert!(sink.prices().is_empty());
    assert!(sink.sentiment().is_empty());
    assert!(sink.signals().is_empty());
}

#[tokio::test]
async fn sink_failure_keeps_windows_and_supervisor_retries() {
    let bus = Arc::new(TopicBus::default());
    let sink = Arc::new(MemorySink::new());
    let config = test_config();
    let mut processor = SignalProcessor::new(
        &config,
        bus.clone(),
        Arc::new(LexiconScorer::default()),
        sink.clone(),
    )
    .unwrap();

    sink.set_failing(true);
    bus.publish("bitcoin", price("bitcoin", 62000.0, 1000.0)).unwrap();
    let err = processor.run_cycle().await.unwrap_err();
    assert_eq!(err.collaborator(), Some(Collaborator::Sink));
    assert_eq!(
        processor
            .registry()
            .get(&AssetId::new("bitcoin"))
            .unwrap()
            .price()
            .count(),
        1
    );

    let mut supervisor_config = config.supervisor.clone();
    supervisor_config.retry_base_delay_ms = 1;
    supervisor_config.retry_max_delay_ms = 5;
    supervisor_config.max_consecutive_failures = 0;

    let token = CancellationToken::new();
    let supervisor = Supervisor::new(
        processor,
        supervisor_config,
        Duration::from_secs(3600),
        token.clone(),
    );
    let handle = tokio::spawn(supervisor.run());

    tokio::time::sleep(Duration::from_millis(30)).await;
    sink.set_failing(false);
    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();

    let summary = handle.await.unwrap().unwrap();
    assert!(summary.failed_cycles >= 1);
    assert!(summary.signals >= 1);
    let signals = sink.signals();
    assert!(!signals.is_empty());
    assert!(signals.iter().all(|s| s.price_current == 62000.0));
}

#[tokio::test]
async fn jsonl_sink_receives_all_tables() {
    let dir = tempfile::TempDir::new().unwrap();
    let bus = Arc::new(TopicBus::default());
    let sink = Arc::new(JsonlSink::open(dir.path()).unwrap());
    let mut processor = SignalProcessor::new(
        &test_config(),
        bus.clone(),
        Arc::new(LexiconScorer::default()),
        sink.clone(),
    )
    .unwrap();

    bus.publish("bitcoin", price("bitcoin", 62000.0, 1000.0)).unwrap();
    bus.publish("live-social", post("btc pump incoming", &["btc"], 1000.0))
        .unwrap();
    processor.run_cycle().await.unwrap();
    sink.close();

    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names.len(), 3);
    assert!(names[0].starts_with("decoupling_signals"));
    assert!(names[1].starts_with("price_snapshots"));
    assert!(names[2].starts_with("social_signals"));
}
