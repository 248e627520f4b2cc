//! GhostMarket decoupling signal processor.
//!
//! Wires the collaborators together and drives the processing loop:
//! - Polls per-asset price topics and the shared sentiment topic
//! - Scores social posts and folds prices/vibes into per-asset windows
//! - Evaluates every asset each cycle and persists the resulting signals
//! - Retries collaborator failures with backoff, keeping window state

pub mod app;
pub mod config;
pub mod error;
pub mod processor;
pub mod supervisor;

pub use app::Application;
pub use config::AppConfig;
pub use error::{Collaborator, ProcessorError, ProcessorResult};
pub use processor::{CycleReport, SignalProcessor};
pub use supervisor::{Supervisor, SupervisorSummary};
