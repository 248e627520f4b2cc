//! Single-cycle signal processing.
//!
//! One cycle, in fixed order:
//! 1. Poll every asset's price topic (concurrently), apply results in
//!    configured-asset order, then persist a snapshot per price message.
//! 2. Poll the sentiment topic once, score the post, apply the score to
//!    every recognized asset, persist one record per asset.
//! 3. Evaluate every asset and persist each emitted signal.
//!
//! Malformed or unroutable messages are dropped with a diagnostic. Any
//! collaborator failure or timeout aborts the cycle with
//! [`ProcessorError::CollaboratorUnavailable`]; window state already
//! mutated in the cycle is kept.

use crate::config::AppConfig;
use crate::error::{Collaborator, ProcessorError, ProcessorResult};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use ghost_bus::MessageSource;
use ghost_core::AssetId;
use ghost_detector::{DecouplingDetector, DecouplingSignal, Evaluation, SkipReason};
use ghost_feed::{Admission, AssetRegistry, MessageParser};
use ghost_persistence::{PriceSnapshotRecord, SentimentRecord, SignalRecord, SignalSink};
use ghost_scorer::{clamp_score, SentimentScorer};
use ghost_telemetry::Metrics;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const PRICE: &str = "price";
const SENTIMENT: &str = "sentiment";
const VIBE: &str = "vibe";

/// Outcome of one processing cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Price points applied to windows.
    pub price_updates: usize,
    /// Vibe points applied to windows (one per recognized asset per post).
    pub sentiment_updates: usize,
    /// Messages dropped (parse failures, unknown assets, expired points).
    pub dropped: usize,
    /// Signals emitted, in configured-asset order.
    pub signals: Vec<DecouplingSignal>,
    /// Assets evaluated without a signal.
    pub skipped: Vec<(AssetId, SkipReason)>,
}

impl CycleReport {
    /// Signals that carry an alert.
    pub fn alerts(&self) -> impl Iterator<Item = &DecouplingSignal> {
        self.signals.iter().filter(|s| s.is_alert())
    }
}

/// Owns the asset windows and drives cycles against the collaborators.
pub struct SignalProcessor {
    registry: AssetRegistry,
    parser: MessageParser,
    detector: DecouplingDetector,
    /// (asset, price topic) in configured order.
    price_topics: Vec<(AssetId, String)>,
    sentiment_topic: String,
    poll_timeout: Duration,
    sink_timeout: Duration,
    scorer_timeout: Duration,
    source: Arc<dyn MessageSource>,
    scorer: Arc<dyn SentimentScorer>,
    sink: Arc<dyn SignalSink>,
}

impl SignalProcessor {
    /// Build the processor with one empty window pair per configured asset.
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn MessageSource>,
        scorer: Arc<dyn SentimentScorer>,
        sink: Arc<dyn SignalSink>,
    ) -> ProcessorResult<Self> {
        let ids: Vec<AssetId> = config.assets.iter().map(|a| a.id.clone()).collect();
        let registry = AssetRegistry::new(ids.iter().cloned(), config.processor.window())?;

        let mut parser = MessageParser::new(ids);
        for asset in &config.assets {
            for alias in &asset.aliases {
                parser.add_alias(alias, asset.id.clone());
            }
        }

        let price_topics = config
            .assets
            .iter()
            .map(|a| (a.id.clone(), a.price_topic().to_string()))
            .collect();

        info!(
            assets = registry.len(),
            window_secs = config.processor.window_seconds,
            sentiment_topic = %config.processor.sentiment_topic,
            scorer = scorer.name(),
            "Signal processor initialized"
        );

        Ok(Self {
            registry,
            parser,
            detector: DecouplingDetector::new(config.detector.clone()),
            price_topics,
            sentiment_topic: config.processor.sentiment_topic.clone(),
            poll_timeout: config.processor.poll_timeout(),
            sink_timeout: config.processor.sink_timeout(),
            scorer_timeout: config.processor.scorer_timeout(),
            source,
            scorer,
            sink,
        })
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn parser(&self) -> &MessageParser {
        &self.parser
    }

    /// Run one poll-update-evaluate-emit cycle.
    pub async fn run_cycle(&mut self) -> ProcessorResult<CycleReport> {
        let started = Instant::now();
        let mut report = CycleReport::default();

        self.poll_prices(&mut report).await?;
        self.poll_sentiment(&mut report).await?;
        self.evaluate(Utc::now(), &mut report).await?;

        Metrics::cycle_duration(started.elapsed().as_secs_f64() * 1000.0);
        debug!(
            price_updates = report.price_updates,
            sentiment_updates = report.sentiment_updates,
            dropped = report.dropped,
            signals = report.signals.len(),
            "Cycle complete"
        );
        Ok(report)
    }

    async fn poll_prices(&mut self, report: &mut CycleReport) -> ProcessorResult<()> {
        let results = {
            let polls = self
                .price_topics
                .iter()
                .map(|(_, topic)| self.source.receive(topic, self.poll_timeout));
            join_all(polls).await
        };

        // Every received point reaches its window before any snapshot write.
        let mut first_error = None;
        let mut snapshots = Vec::new();
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(Some(payload)) => snapshots.extend(self.apply_price(&payload, report)),
                Ok(None) => {}
                Err(e) => {
                    let (asset, topic) = &self.price_topics[i];
                    warn!(%asset, topic = %topic, error = %e, "Price poll failed");
                    if first_error.is_none() {
                        first_error = Some(ProcessorError::unavailable(Collaborator::Source, e));
                    }
                }
            }
        }

        let mut sink_error = None;
        for record in snapshots {
            let written = with_timeout(
                Collaborator::Sink,
                self.sink_timeout,
                self.sink.append_price_snapshot(record),
            )
            .await;
            if let Err(e) = written {
                if sink_error.is_none() {
                    sink_error = Some(e);
                }
            }
        }

        match first_error.or(sink_error) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Apply one price payload to its window. Returns the snapshot row to
    /// persist, or `None` when the message was unusable.
    fn apply_price(
        &mut self,
        payload: &[u8],
        report: &mut CycleReport,
    ) -> Option<PriceSnapshotRecord> {
        Metrics::message_received(PRICE);

        let update = match self.parser.parse_price(payload) {
            Ok(update) => update,
            Err(e) => {
                warn!(error = %e, "Dropping price message");
                Metrics::message_dropped(PRICE, e.reason());
                report.dropped += 1;
                return None;
            }
        };

        let admission = match self
            .registry
            .record_price(&update.asset, update.price, update.timestamp)
        {
            Ok(admission) => admission,
            Err(e) => {
                warn!(asset = %update.asset, error = %e, "Dropping price point");
                Metrics::message_dropped(PRICE, e.reason());
                report.dropped += 1;
                return None;
            }
        };

        if admission == Admission::Expired {
            debug!(
                asset = %update.asset,
                timestamp = update.timestamp,
                "Price point older than window"
            );
            Metrics::message_dropped(PRICE, "expired");
            report.dropped += 1;
        } else {
            let count = self
                .registry
                .get(&update.asset)
                .map_or(0, |s| s.price().count());
            Metrics::aggregator_updated(update.asset.as_str(), PRICE, count);
            report.price_updates += 1;
        }

        Some(PriceSnapshotRecord::new(
            update.asset,
            update.price,
            update.timestamp,
        ))
    }

    async fn poll_sentiment(&mut self, report: &mut CycleReport) -> ProcessorResult<()> {
        let payload = match self
            .source
            .receive(&self.sentiment_topic, self.poll_timeout)
            .await
        {
            Ok(Some(payload)) => payload,
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!(topic = %self.sentiment_topic, error = %e, "Sentiment poll failed");
                return Err(ProcessorError::unavailable(Collaborator::Source, e));
            }
        };
        Metrics::message_received(SENTIMENT);

        let post = match self.parser.parse_sentiment(&payload) {
            Ok(post) => post,
            Err(e) => {
                warn!(error = %e, "Dropping sentiment message");
                Metrics::message_dropped(SENTIMENT, e.reason());
                report.dropped += 1;
                return Ok(());
            }
        };
        if !post.unrecognized.is_empty() {
            warn!(tickers = ?post.unrecognized, "Ignoring unrecognized tickers");
        }

        let raw = with_timeout(
            Collaborator::Scorer,
            self.scorer_timeout,
            self.scorer.score(&post.text),
        )
        .await?;
        let score = clamp_score(raw);

        let mut applied = Vec::with_capacity(post.assets.len());
        for asset in &post.assets {
            match self.registry.record_vibe(asset, score, post.timestamp) {
                Ok(Admission::Expired) => {
                    debug!(%asset, timestamp = post.timestamp, "Vibe point older than window");
                    Metrics::message_dropped(SENTIMENT, "expired");
                    report.dropped += 1;
                }
                Ok(_) => {
                    let count = self.registry.get(asset).map_or(0, |s| s.vibe().count());
                    Metrics::aggregator_updated(asset.as_str(), VIBE, count);
                    report.sentiment_updates += 1;
                }
                Err(e) => {
                    warn!(%asset, error = %e, "Dropping vibe point");
                    Metrics::message_dropped(SENTIMENT, e.reason());
                    report.dropped += 1;
                    continue;
                }
            }
            applied.push(asset.clone());
        }

        debug!(
            score,
            assets = ?applied,
            author = %post.author,
            source = %post.source,
            "Sentiment scored"
        );

        for asset in applied {
            let record = SentimentRecord {
                ticker: asset,
                vibe_score: score,
                text: post.text.clone(),
                author: post.author.clone(),
                source: post.source.clone(),
                timestamp: post.timestamp,
                ingested_at: Utc::now(),
            };
            with_timeout(
                Collaborator::Sink,
                self.sink_timeout,
                self.sink.append_sentiment_record(record),
            )
            .await?;
        }
        Ok(())
    }

    async fn evaluate(&self, now: DateTime<Utc>, report: &mut CycleReport) -> ProcessorResult<()> {
        for state in self.registry.iter() {
            let asset = state.asset();
            match self.detector.evaluate(state, now) {
                Evaluation::Signal(signal) => {
                    Metrics::signal_emitted(
                        asset.as_str(),
                        signal.hype_momentum,
                        signal.delta_price,
                    );
                    if let Some(alert) = signal.alert {
                        Metrics::alert(asset.as_str(), alert.as_str());
                    }
                    report.signals.push(signal);
                }
                Evaluation::Skipped(reason) => {
                    match reason {
                        SkipReason::NoPriceData => debug!(%asset, "No price data yet"),
                        SkipReason::ZeroPriceAverage => {
                            warn!(%asset, "Price average is zero, no signal this cycle")
                        }
                    }
                    Metrics::signal_skipped(asset.as_str(), reason.as_str());
                    report.skipped.push((asset.clone(), reason));
                }
            }
        }

        for signal in &report.signals {
            with_timeout(
                Collaborator::Sink,
                self.sink_timeout,
                self.sink.append_signal(SignalRecord::from(signal)),
            )
            .await?;
        }
        Ok(())
    }
}

/// Await a collaborator call, mapping failures and timeouts to
/// `CollaboratorUnavailable`.
async fn with_timeout<T, E, F>(
    collaborator: Collaborator,
    timeout: Duration,
    fut: F,
) -> ProcessorResult<T>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!(%collaborator, error = %e, "Collaborator call failed");
            Err(ProcessorError::unavailable(collaborator, e))
        }
        Err(_) => {
            warn!(
                %collaborator,
                timeout_ms = timeout.as_millis() as u64,
                "Collaborator call timed out"
            );
            Err(ProcessorError::unavailable(
                collaborator,
                format!("timed out after {}ms", timeout.as_millis()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetConfig;
    use ghost_bus::TopicBus;
    use ghost_core::AlertKind;
    use ghost_persistence::{MemorySink, PersistenceResult};
    use ghost_scorer::{BoxFuture, ScorerError, ScorerResult};

    /// Scorer returning a fixed value.
    struct FixedScorer(f64);

    impl SentimentScorer for FixedScorer {
        fn score<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, ScorerResult<f64>> {
            Box::pin(std::future::ready(Ok(self.0)))
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    /// Scorer that never answers in time.
    struct StalledScorer;

    impl SentimentScorer for StalledScorer {
        fn score<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, ScorerResult<f64>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(ScorerError::InvalidResponse("unreachable".to_string()))
            })
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    /// Sink whose writes block a pool thread well past any test timeout.
    struct SlowSink;

    impl SlowSink {
        fn blocked_write() -> ghost_persistence::BoxFuture<'static, PersistenceResult<()>> {
            Box::pin(async {
                tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_millis(300)))
                    .await
                    .map_err(|e| ghost_persistence::PersistenceError::Unavailable(e.to_string()))
            })
        }
    }

    impl SignalSink for SlowSink {
        fn append_price_snapshot(
            &self,
            _record: PriceSnapshotRecord,
        ) -> ghost_persistence::BoxFuture<'_, PersistenceResult<()>> {
            Self::blocked_write()
        }

        fn append_sentiment_record(
            &self,
            _record: SentimentRecord,
        ) -> ghost_persistence::BoxFuture<'_, PersistenceResult<()>> {
            Self::blocked_write()
        }

        fn append_signal(
            &self,
            _record: SignalRecord,
        ) -> ghost_persistence::BoxFuture<'_, PersistenceResult<()>> {
            Self::blocked_write()
        }
    }

    fn config() -> AppConfig {
        let mut bitcoin = AssetConfig::new("bitcoin");
        bitcoin.aliases = vec!["btc".to_string()];
        let mut config = AppConfig {
            assets: vec![bitcoin, AssetConfig::new("dogecoin")],
            ..Default::default()
        };
        config.processor.poll_timeout_ms = 10;
        config.processor.scorer_timeout_ms = 50;
        config
    }

    fn price(asset: &str, price: f64, ts: f64) -> Vec<u8> {
        format!(r#"{{"asset":"{asset}","price_usd":{price},"timestamp":{ts}}}"#).into_bytes()
    }

    fn post(tickers: &str, ts: f64) -> Vec<u8> {
        format!(
            r#"{{"text":"to the moon","tickers":[{tickers}],"timestamp":{ts},"author":"a","source":"reddit"}}"#
        )
        .into_bytes()
    }

    fn processor(
        bus: &Arc<TopicBus>,
        scorer: Arc<dyn SentimentScorer>,
        sink: &Arc<MemorySink>,
    ) -> SignalProcessor {
        SignalProcessor::new(&config(), bus.clone(), scorer, sink.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_cycle() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let mut p = processor(&bus, Arc::new(FixedScorer(0.5)), &sink);

        let report = p.run_cycle().await.unwrap();
        assert!(report.signals.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].1, SkipReason::NoPriceData);
        assert!(sink.prices().is_empty());
    }

    #[tokio::test]
    async fn test_price_then_signal_with_neutral_vibe() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let mut p = processor(&bus, Arc::new(FixedScorer(0.5)), &sink);

        bus.publish("bitcoin", price("bitcoin", 62000.0, 1000.0)).unwrap();
        let report = p.run_cycle().await.unwrap();

        assert_eq!(report.price_updates, 1);
        assert_eq!(report.signals.len(), 1);
        let signal = &report.signals[0];
        assert_eq!(signal.asset.as_str(), "bitcoin");
        assert_eq!(signal.vibe_current, 0.0);
        assert_eq!(signal.vibe_avg, 0.0);
        assert_eq!(signal.alert, None);
        assert_eq!(sink.prices().len(), 1);
        assert_eq!(sink.signals().len(), 1);
    }

    #[tokio::test]
    async fn test_sentiment_applies_to_all_recognized_assets() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let mut p = processor(&bus, Arc::new(FixedScorer(0.8)), &sink);

        bus.publish("live-social", post(r#""BTC","dogecoin","shib""#, 1000.0))
            .unwrap();
        let report = p.run_cycle().await.unwrap();

        assert_eq!(report.sentiment_updates, 2);
        let records = sink.sentiment();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ticker.as_str(), "bitcoin");
        assert_eq!(records[1].ticker.as_str(), "dogecoin");
        assert!(records.iter().all(|r| r.vibe_score == 0.8));
        assert_eq!(
            p.registry()
                .get(&AssetId::new("bitcoin"))
                .unwrap()
                .vibe()
                .latest(),
            Some(0.8)
        );
    }

    #[tokio::test]
    async fn test_scorer_output_is_clamped() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let mut p = processor(&bus, Arc::new(FixedScorer(3.0)), &sink);

        bus.publish("live-social", post(r#""btc""#, 1000.0)).unwrap();
        p.run_cycle().await.unwrap();
        assert_eq!(sink.sentiment()[0].vibe_score, 1.0);
    }

    #[tokio::test]
    async fn test_malformed_messages_dropped() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let mut p = processor(&bus, Arc::new(FixedScorer(0.5)), &sink);

        bus.publish("bitcoin", b"not json".to_vec()).unwrap();
        bus.publish("dogecoin", price("solana", 150.0, 1000.0)).unwrap();
        bus.publish("live-social", post("", 1000.0)).unwrap();

        let report = p.run_cycle().await.unwrap();
        assert_eq!(report.dropped, 3);
        assert_eq!(report.price_updates, 0);
        assert!(sink.prices().is_empty());
        assert!(sink.sentiment().is_empty());
    }

    #[tokio::test]
    async fn test_expired_price_not_counted() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let mut p = processor(&bus, Arc::new(FixedScorer(0.5)), &sink);

        bus.publish("bitcoin", price("bitcoin", 62000.0, 10_000.0)).unwrap();
        p.run_cycle().await.unwrap();
        bus.publish("bitcoin", price("bitcoin", 1.0, 1_000.0)).unwrap();
        let report = p.run_cycle().await.unwrap();

        assert_eq!(report.price_updates, 0);
        assert_eq!(report.dropped, 1);
        let state = p.registry().get(&AssetId::new("bitcoin")).unwrap();
        assert_eq!(state.price().count(), 1);
        // Snapshot rows mirror the raw price stream.
        assert_eq!(sink.prices().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_price_average_skipped() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let mut p = processor(&bus, Arc::new(FixedScorer(0.5)), &sink);

        bus.publish("bitcoin", price("bitcoin", 0.0, 1000.0)).unwrap();
        let report = p.run_cycle().await.unwrap();
        assert!(report
            .skipped
            .contains(&(AssetId::new("bitcoin"), SkipReason::ZeroPriceAverage)));
        assert!(sink.signals().is_empty());
    }

    #[tokio::test]
    async fn test_alert_raised() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let mut p = processor(&bus, Arc::new(FixedScorer(1.0)), &sink);

        // Price window: average 62000, latest 63200.
        bus.publish("bitcoin", price("bitcoin", 60800.0, 1000.0)).unwrap();
        p.run_cycle().await.unwrap();
        bus.publish("bitcoin", price("bitcoin", 63200.0, 1001.0)).unwrap();
        let report = p.run_cycle().await.unwrap();
        assert!(report.alerts().next().is_none());

        // Vibe window: [1.0, 1.0, 1.0, -1.0]
        for i in 0..3 {
            bus.publish("live-social", post(r#""btc""#, 1002.0 + f64::from(i)))
                .unwrap();
            p.run_cycle().await.unwrap();
        }
        p.scorer = Arc::new(FixedScorer(-1.0));
        bus.publish("live-social", post(r#""btc""#, 1010.0)).unwrap();
        let report = p.run_cycle().await.unwrap();
        assert!(report.alerts().next().is_none());

        // Next positive post: delta = 1.0 - 0.6 = 0.4 over 5 messages.
        p.scorer = Arc::new(FixedScorer(1.0));
        bus.publish("live-social", post(r#""btc""#, 1011.0)).unwrap();
        let report = p.run_cycle().await.unwrap();
        let alert = report.alerts().next().unwrap();
        assert_eq!(alert.alert, Some(AlertKind::ImminentHypePump));
        assert_eq!(alert.vibe_count, 5);
        assert!((alert.hype_momentum - 2.0).abs() < 1e-9);
        assert!((alert.delta_price - 1200.0 / 62000.0).abs() < 1e-9);
        assert_eq!(sink.signals().last().unwrap().alert, Some(AlertKind::ImminentHypePump));
    }

    #[tokio::test]
    async fn test_sink_failure_surfaces_and_keeps_windows() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let mut p = processor(&bus, Arc::new(FixedScorer(0.5)), &sink);

        sink.set_failing(true);
        bus.publish("bitcoin", price("bitcoin", 62000.0, 1000.0)).unwrap();
        let err = p.run_cycle().await.unwrap_err();
        assert_eq!(err.collaborator(), Some(Collaborator::Sink));

        // Window mutation happened before the failed append.
        let state = p.registry().get(&AssetId::new("bitcoin")).unwrap();
        assert_eq!(state.price().count(), 1);

        sink.set_failing(false);
        let report = p.run_cycle().await.unwrap();
        assert_eq!(report.signals.len(), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_still_applies_every_price() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let mut p = processor(&bus, Arc::new(FixedScorer(0.5)), &sink);

        sink.set_failing(true);
        bus.publish("bitcoin", price("bitcoin", 62000.0, 1000.0)).unwrap();
        bus.publish("dogecoin", price("dogecoin", 0.25, 1000.0)).unwrap();
        let err = p.run_cycle().await.unwrap_err();
        assert_eq!(err.collaborator(), Some(Collaborator::Sink));

        for asset in ["bitcoin", "dogecoin"] {
            let state = p.registry().get(&AssetId::new(asset)).unwrap();
            assert_eq!(state.price().count(), 1, "{asset}");
        }

        sink.set_failing(false);
        let report = p.run_cycle().await.unwrap();
        let assets: Vec<&str> = report.signals.iter().map(|s| s.asset.as_str()).collect();
        assert_eq!(assets, vec!["bitcoin", "dogecoin"]);
    }

    #[tokio::test]
    async fn test_slow_sink_write_times_out() {
        let bus = Arc::new(TopicBus::default());
        let mut config = config();
        config.processor.sink_timeout_ms = 10;
        let mut p = SignalProcessor::new(
            &config,
            bus.clone(),
            Arc::new(FixedScorer(0.5)),
            Arc::new(SlowSink),
        )
        .unwrap();

        bus.publish("bitcoin", price("bitcoin", 62000.0, 1000.0)).unwrap();
        let err = p.run_cycle().await.unwrap_err();
        assert_eq!(err.collaborator(), Some(Collaborator::Sink));
        assert!(err.to_string().contains("timed out"));
        assert_eq!(
            p.registry()
                .get(&AssetId::new("bitcoin"))
                .unwrap()
                .price()
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_delivery_error_is_source_failure() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let mut p = processor(&bus, Arc::new(FixedScorer(0.5)), &sink);

        bus.publish("bitcoin", price("bitcoin", 62000.0, 1000.0)).unwrap();
        bus.report_error("dogecoin", "partition offline").unwrap();

        let err = p.run_cycle().await.unwrap_err();
        assert_eq!(err.collaborator(), Some(Collaborator::Source));
        // Successful polls in the same cycle were still applied.
        let state = p.registry().get(&AssetId::new("bitcoin")).unwrap();
        assert_eq!(state.price().count(), 1);
    }

    #[tokio::test]
    async fn test_scorer_timeout() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let mut p = processor(&bus, Arc::new(StalledScorer), &sink);

        bus.publish("live-social", post(r#""btc""#, 1000.0)).unwrap();
        let err = p.run_cycle().await.unwrap_err();
        assert_eq!(err.collaborator(), Some(Collaborator::Scorer));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_closed_bus_is_source_failure() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let mut p = processor(&bus, Arc::new(FixedScorer(0.5)), &sink);

        bus.close();
        let err = p.run_cycle().await.unwrap_err();
        assert_eq!(err.collaborator(), Some(Collaborator::Source));
    }
}
