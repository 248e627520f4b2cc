//! Signal and market data persistence for GhostMarket.
//!
//! Appends price snapshots, scored social posts and decoupling signals to
//! JSON Lines files (one file per table per UTC day) for post-analysis.

pub mod error;
pub mod records;
pub mod sink;
pub mod writer;

pub use error::{PersistenceError, PersistenceResult};
pub use records::{PriceSnapshotRecord, SentimentRecord, SignalRecord};
pub use sink::{BoxFuture, JsonlSink, MemorySink, SignalSink};
pub use writer::JsonLinesWriter;
