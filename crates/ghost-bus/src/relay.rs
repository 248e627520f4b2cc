//! WebSocket relay client.
//!
//! Connects to a broker relay, subscribes to the configured topics and
//! routes every frame into a [`TopicBus`]. Handles reconnection with
//! exponential backoff and graceful shutdown via a cancellation token.
//!
//! Relay wire format (JSON text frames):
//! - client → relay: `{"op": "subscribe", "topics": ["bitcoin", ...]}`
//! - relay → client: `{"topic": "...", "payload": "..."}` or
//!   `{"topic": "...", "error": "..."}`

use crate::error::{BusError, BusResult};
use crate::topic_bus::TopicBus;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Relay connection configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// WebSocket URL of the relay.
    pub url: String,
    /// Topics to subscribe to.
    pub topics: Vec<String>,
    /// Maximum reconnection attempts (0 = infinite).
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    pub reconnect_max_delay_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            topics: Vec::new(),
            max_reconnect_attempts: 0, // Infinite
            reconnect_base_delay_ms: 1000,
            reconnect_max_delay_ms: 60000,
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

#[derive(Debug, Serialize)]
struct SubscribeRequest<'a> {
    op: &'static str,
    topics: &'a [String],
}

/// Frame pushed by the relay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RelayFrame {
    pub topic: String,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// WebSocket relay client feeding a [`TopicBus`].
pub struct RelayClient {
    config: RelayConfig,
    bus: Arc<TopicBus>,
    state: Arc<RwLock<RelayState>>,
    reconnect_count: Arc<RwLock<u32>>,
    shutdown_token: CancellationToken,
}

impl RelayClient {
    pub fn new(config: RelayConfig, bus: Arc<TopicBus>) -> Self {
        Self {
            config,
            bus,
            state: Arc::new(RwLock::new(RelayState::Disconnected)),
            reconnect_count: Arc::new(RwLock::new(0)),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get current connection state.
    pub fn state(&self) -> RelayState {
        *self.state.read()
    }

    /// Consecutive reconnect attempts since the last successful connect.
    pub fn reconnect_count(&self) -> u32 {
        *self.reconnect_count.read()
    }

    /// Token that stops the client when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Signal graceful shutdown.
    pub fn shutdown(&self) {
        info!("RelayClient shutdown requested");
        self.shutdown_token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Connect and pump frames until shutdown or reconnect attempts run out.
    pub async fn run(&self) -> BusResult<()> {
        let mut attempt = 0u32;

        loop {
            if self.is_shutdown() {
                info!("Shutdown requested, exiting relay loop");
                *self.state.write() = RelayState::Disconnected;
                return Ok(());
            }

            *self.state.write() = RelayState::Connecting;

            let reason = match self.try_connect().await {
                Ok(()) => {
                    info!("Relay connection closed");
                    "relay connection closed".to_string()
                }
                Err(e) => {
                    error!(?e, "Relay connection error");
                    format!("relay unavailable: {e}")
                }
            };

            if self.is_shutdown() {
                info!("Shutdown requested after disconnect, not reconnecting");
                *self.state.write() = RelayState::Disconnected;
                return Ok(());
            }

            if self.report_disconnect(&reason).is_err() {
                info!("Topic bus closed, exiting relay loop");
                *self.state.write() = RelayState::Disconnected;
                return Ok(());
            }

            attempt += 1;
            *self.reconnect_count.write() = attempt;

            if self.config.max_reconnect_attempts > 0
                && attempt >= self.config.max_reconnect_attempts
            {
                error!(attempt, "Max reconnection attempts reached");
                *self.state.write() = RelayState::Disconnected;
                return Err(BusError::ConnectionFailed(
                    "Max reconnection attempts reached".to_string(),
                ));
            }

            *self.state.write() = RelayState::Reconnecting;

            let delay = backoff_delay(
                attempt,
                self.config.reconnect_base_delay_ms,
                self.config.reconnect_max_delay_ms,
            );
            warn!(attempt, delay_ms = delay.as_millis(), "Reconnecting to relay");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested during backoff, exiting");
                    *self.state.write() = RelayState::Disconnected;
                    return Ok(());
                }
            }
        }
    }

    /// Queue a delivery error on every subscribed topic so receivers see
    /// the outage instead of an empty poll.
    fn report_disconnect(&self, reason: &str) -> BusResult<()> {
        for topic in &self.config.topics {
            self.bus.report_error(topic, reason)?;
        }
        Ok(())
    }

    async fn try_connect(&self) -> BusResult<()> {
        info!(url = %self.config.url, "Connecting to relay");

        let (ws_stream, _response) = connect_async(self.config.url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();

        *self.state.write() = RelayState::Connected;
        *self.reconnect_count.write() = 0;

        let request = SubscribeRequest {
            op: "subscribe",
            topics: &self.config.topics,
        };
        write
            .send(Message::Text(serde_json::to_string(&request)?))
            .await?;
        info!(topics = ?self.config.topics, "Relay connected, subscribed");

        loop {
            tokio::select! {
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received in relay loop");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        warn!(?e, "Failed to send Close frame during shutdown");
                    }
                    *self.state.write() = RelayState::Disconnected;
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(e) = route_frame(&text, &self.bus) {
                                match e {
                                    BusError::Closed => {
                                        info!("Topic bus closed, stopping relay");
                                        self.shutdown_token.cancel();
                                    }
                                    other => warn!(error = %other, "Dropping malformed relay frame"),
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            warn!(code, %reason, "Relay closed connection");
                            return Err(BusError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => {
                            error!(?e, "Relay read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("Relay stream ended");
                            return Ok(());
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

/// Parse one relay text frame and push it into the bus.
pub fn route_frame(text: &str, bus: &TopicBus) -> BusResult<()> {
    let frame: RelayFrame = serde_json::from_str(text)?;
    match (frame.payload, frame.error) {
        (_, Some(reason)) => {
            warn!(topic = %frame.topic, %reason, "Relay reported topic error");
            bus.report_error(&frame.topic, reason)
        }
        (Some(payload), None) => bus.publish(&frame.topic, payload.into_bytes()),
        (None, None) => {
            debug!(topic = %frame.topic, "Relay frame without payload ignored");
            Ok(())
        }
    }
}

/// Exponential backoff: `base * 2^(attempt-1)`, capped at `max`, plus jitter.
fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let delay = base_ms.saturating_mul(1u64 << exponent).min(max_ms);
    Duration::from_millis(delay + rand_jitter(base_ms))
}

/// Jitter in `[0, min(base, 1000))` ms.
fn rand_jitter(base_ms: u64) -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let bound = base_ms.clamp(1, 1000);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    u64::from(nanos) % bound
}
