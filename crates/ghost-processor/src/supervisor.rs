//! Cycle supervisor.
//!
//! Drives [`SignalProcessor`] cycles until shutdown. Collaborator failures
//! are retried with exponential backoff against the same in-memory windows;
//! after `max_consecutive_failures` in a row the supervisor gives up and
//! returns the last error.

use crate::config::SupervisorConfig;
use crate::error::ProcessorResult;
use crate::processor::SignalProcessor;
use ghost_telemetry::{Metrics, StatsReporter};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Totals for a supervisor run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorSummary {
    /// Cycles that completed.
    pub cycles: u64,
    /// Cycles aborted by a collaborator failure.
    pub failed_cycles: u64,
    pub signals: u64,
    pub alerts: u64,
}

/// Backoff before retry `attempt` (1-based): `base * 2^(attempt-1)`, capped.
pub fn retry_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    base.saturating_mul(1u32 << exponent).min(max)
}

pub struct Supervisor {
    processor: SignalProcessor,
    config: SupervisorConfig,
    stats: StatsReporter,
    stats_interval: Duration,
    shutdown: CancellationToken,
}

impl Supervisor {
    pub fn new(
        processor: SignalProcessor,
        config: SupervisorConfig,
        stats_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        let assets = processor
            .registry()
            .ids()
            .map(|id| id.to_string())
            .collect();
        Self {
            processor,
            config,
            stats: StatsReporter::new(assets),
            stats_interval,
            shutdown,
        }
    }

    pub fn processor(&self) -> &SignalProcessor {
        &self.processor
    }

    /// Run cycles until shutdown or until the failure budget is exhausted.
    ///
    /// A cycle in progress always runs to completion; shutdown is checked
    /// between cycles and interrupts retry backoff.
    pub async fn run(mut self) -> ProcessorResult<SupervisorSummary> {
        let base = Duration::from_millis(self.config.retry_base_delay_ms);
        let max = Duration::from_millis(self.config.retry_max_delay_ms);
        let mut summary = SupervisorSummary::default();
        let mut consecutive_failures: u32 = 0;
        let mut next_stats = Instant::now() + self.stats_interval;

        info!(
            max_consecutive_failures = self.config.max_consecutive_failures,
            "Supervisor started"
        );

        let outcome = loop {
            if self.shutdown.is_cancelled() {
                info!("Shutdown requested");
                break Ok(());
            }

            match self.processor.run_cycle().await {
                Ok(report) => {
                    if consecutive_failures > 0 {
                        info!(consecutive_failures, "Collaborators recovered");
                        consecutive_failures = 0;
                        Metrics::consecutive_failures(0);
                    }
                    summary.cycles += 1;
                    summary.signals += report.signals.len() as u64;
                    summary.alerts += report.alerts().count() as u64;
                }
                Err(e) => {
                    let Some(collaborator) = e.collaborator() else {
                        error!(error = %e, "Cycle failed with a non-retryable error");
                        break Err(e);
                    };

                    consecutive_failures += 1;
                    summary.failed_cycles += 1;
                    Metrics::collaborator_failure(collaborator.as_str());
                    Metrics::consecutive_failures(consecutive_failures);

                    let limit = self.config.max_consecutive_failures;
                    if limit > 0 && consecutive_failures >= limit {
                        error!(
                            error = %e,
                            consecutive_failures,
                            "Giving up after repeated collaborator failures"
                        );
                        break Err(e);
                    }

                    let delay = retry_delay(consecutive_failures, base, max);
                    warn!(
                        error = %e,
                        %collaborator,
                        consecutive_failures,
                        delay_ms = delay.as_millis() as u64,
                        "Cycle failed, retrying"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.shutdown.cancelled() => {
                            info!("Shutdown requested during retry backoff");
                            break Ok(());
                        }
                    }
                }
            }

            if Instant::now() >= next_stats {
                info!("Outputting periodic statistics summary");
                self.stats.output_summary();
                next_stats = Instant::now() + self.stats_interval;
            }
        };

        info!(
            cycles = summary.cycles,
            failed_cycles = summary.failed_cycles,
            signals = summary.signals,
            alerts = summary.alerts,
            "Supervisor stopped"
        );
        info!("Final statistics summary:");
        self.stats.output_summary();

        outcome.map(|()| summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, AssetConfig};
    use crate::error::{Collaborator, ProcessorError};
    use ghost_bus::TopicBus;
    use ghost_persistence::MemorySink;
    use ghost_scorer::LexiconScorer;
    use std::sync::Arc;

    fn build(bus: &Arc<TopicBus>, sink: &Arc<MemorySink>) -> SignalProcessor {
        let mut config = AppConfig {
            assets: vec![AssetConfig::new("bitcoin")],
            ..Default::default()
        };
        config.processor.poll_timeout_ms = 5;
        SignalProcessor::new(
            &config,
            bus.clone(),
            Arc::new(LexiconScorer::default()),
            sink.clone(),
        )
        .unwrap()
    }

    fn fast_retry(max_consecutive_failures: u32) -> SupervisorConfig {
        SupervisorConfig {
            max_consecutive_failures,
            retry_base_delay_ms: 1,
            retry_max_delay_ms: 4,
        }
    }

    #[test]
    fn test_retry_delay() {
        let base = Duration::from_millis(1000);
        let max = Duration::from_millis(60_000);
        assert_eq!(retry_delay(1, base, max), Duration::from_millis(1000));
        assert_eq!(retry_delay(2, base, max), Duration::from_millis(2000));
        assert_eq!(retry_delay(4, base, max), Duration::from_millis(8000));
        assert_eq!(retry_delay(10, base, max), max);
        assert_eq!(retry_delay(u32::MAX, base, max), max);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_failures() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let processor = build(&bus, &sink);
        bus.close();

        let supervisor = Supervisor::new(
            processor,
            fast_retry(3),
            Duration::from_secs(3600),
            CancellationToken::new(),
        );
        let err = tokio::time::timeout(Duration::from_secs(5), supervisor.run())
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::CollaboratorUnavailable {
                collaborator: Collaborator::Source,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_shutdown_returns_summary() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let processor = build(&bus, &sink);
        bus.publish(
            "bitcoin",
            br#"{"asset":"bitcoin","price_usd":62000.0,"timestamp":1000.0}"#.to_vec(),
        )
        .unwrap();

        let token = CancellationToken::new();
        let supervisor = Supervisor::new(
            processor,
            fast_retry(0),
            Duration::from_millis(1),
            token.clone(),
        );
        let handle = tokio::spawn(supervisor.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        let summary = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(summary.cycles >= 1);
        assert!(summary.signals >= 1);
        assert_eq!(summary.failed_cycles, 0);
        assert_eq!(sink.prices().len(), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_sink_outage() {
        let bus = Arc::new(TopicBus::default());
        let sink = Arc::new(MemorySink::new());
        let processor = build(&bus, &sink);
        sink.set_failing(true);
        bus.publish(
            "bitcoin",
            br#"{"asset":"bitcoin","price_usd":62000.0,"timestamp":1000.0}"#.to_vec(),
        )
        .unwrap();

        let token = CancellationToken::new();
        let supervisor = Supervisor::new(
            processor,
            fast_retry(0),
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
        // The price point survived the failed cycles and now yields signals.
        assert!(summary.signals >= 1);
        assert!(sink.signals().iter().all(|s| s.price_current == 62000.0));
    }
}
