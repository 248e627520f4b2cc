//! Prometheus metrics and structured logging for GhostMarket.
//!
//! Provides:
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus metrics for message flow, signals and collaborator health
//! - A `/metrics` HTTP exporter
//! - Periodic statistics summaries in the log

pub mod error;
pub mod exporter;
pub mod logging;
pub mod metrics;
pub mod stats;

pub use error::{TelemetryError, TelemetryResult};
pub use exporter::{render_metrics, serve_metrics};
pub use logging::init_logging;
pub use metrics::Metrics;
pub use stats::{AssetStats, StatsReporter};
