//! Topic message transport for GhostMarket.
//!
//! Provides:
//! - The [`MessageSource`] contract: receive the next message on a topic or
//!   time out
//! - [`TopicBus`]: bounded in-process per-topic queues
//! - [`RelayClient`]: WebSocket client that feeds a `TopicBus` from a remote
//!   broker relay, with automatic reconnection and exponential backoff

pub mod error;
pub mod relay;
pub mod source;
pub mod topic_bus;

pub use error::{BusError, BusResult};
pub use relay::{RelayClient, RelayConfig, RelayFrame, RelayState};
pub use source::{BoxFuture, MessageSource};
pub use topic_bus::TopicBus;

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any relay connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
