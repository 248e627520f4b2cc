//! Application wiring.
//!
//! Builds the collaborators from [`AppConfig`], then runs the supervisor
//! alongside the relay client and the metrics exporter until Ctrl-C.

use crate::config::AppConfig;
use crate::error::ProcessorResult;
use crate::processor::SignalProcessor;
use crate::supervisor::{Supervisor, SupervisorSummary};
use ghost_bus::{RelayClient, TopicBus};
use ghost_persistence::JsonlSink;
use ghost_scorer::build_scorer;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    bus: Arc<TopicBus>,
    relay: Option<Arc<RelayClient>>,
    sink: Arc<JsonlSink>,
    supervisor: Supervisor,
    shutdown: CancellationToken,
}

impl Application {
    /// Create the application from a validated configuration.
    pub fn new(config: AppConfig) -> ProcessorResult<Self> {
        config.validate()?;

        let bus = Arc::new(TopicBus::new(config.bus.queue_capacity));
        let relay = config
            .relay_config()
            .map(|relay_config| Arc::new(RelayClient::new(relay_config, bus.clone())));
        if relay.is_none() {
            info!("No relay configured, topics are fed in-process only");
        }

        let scorer = build_scorer(&config.scorer)?;
        let sink = Arc::new(JsonlSink::open(&config.persistence.data_dir)?);

        let processor = SignalProcessor::new(&config, bus.clone(), scorer, sink.clone())?;
        let shutdown = CancellationToken::new();
        let supervisor = Supervisor::new(
            processor,
            config.supervisor.clone(),
            config.processor.stats_interval(),
            shutdown.clone(),
        );

        Ok(Self {
            config,
            bus,
            relay,
            sink,
            supervisor,
            shutdown,
        })
    }

    /// Topic bus feeding the processor.
    pub fn bus(&self) -> Arc<TopicBus> {
        self.bus.clone()
    }

    /// Token that stops the application when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run until shutdown or until the supervisor gives up.
    pub async fn run(self) -> ProcessorResult<SupervisorSummary> {
        let Self {
            config,
            bus,
            relay,
            sink,
            supervisor,
            shutdown,
        } = self;

        info!(
            assets = ?config.assets.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            topics = ?config.topics(),
            "Starting application"
        );

        let signal_token = shutdown.clone();
        let signal_handle = tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => info!("Shutdown signal received"),
                        Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
                    }
                    signal_token.cancel();
                }
                _ = signal_token.cancelled() => {}
            }
        });

        let metrics_handle = spawn_metrics_exporter(config.telemetry.metrics_port, &shutdown);

        let relay_handle = relay
            .as_ref()
            .map(|relay| spawn_relay(relay.clone(), bus.clone()));

        let result = supervisor.run().await;

        // Cleanup
        shutdown.cancel();
        if let Some(relay) = &relay {
            relay.shutdown();
        }
        bus.close();
        sink.close();

        if let Some(handle) = relay_handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Relay task ended abnormally");
            }
        }
        if let Some(handle) = metrics_handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Metrics exporter task ended abnormally");
            }
        }
        signal_handle.abort();

        match &result {
            Ok(summary) => info!(
                cycles = summary.cycles,
                signals = summary.signals,
                alerts = summary.alerts,
                "Application stopped"
            ),
            Err(e) => error!(error = %e, "Application stopped with error"),
        }
        result
    }
}

/// Run the relay client. If it gives up, the bus is closed so the processor
/// fails its next poll instead of idling on empty topics.
fn spawn_relay(relay: Arc<RelayClient>, bus: Arc<TopicBus>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = relay.run().await {
            error!(error = %e, "Relay client stopped, closing topic bus");
            bus.close();
        }
    })
}

fn spawn_metrics_exporter(port: u16, shutdown: &CancellationToken) -> Option<JoinHandle<()>> {
    if port == 0 {
        info!("Metrics exporter disabled");
        return None;
    }
    let token = shutdown.clone();
    Some(tokio::spawn(async move {
        if let Err(e) = ghost_telemetry::serve_metrics(port, token).await {
            error!(error = %e, port, "Metrics exporter failed");
        }
    }))
}
