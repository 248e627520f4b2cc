//! Signal sink trait and implementations.
//!
//! The processor appends three kinds of rows through a [`SignalSink`]:
//! price snapshots, scored social posts, and decoupling signals. Each call
//! is an independent append that is durable (flushed) once it returns.

use crate::error::{PersistenceError, PersistenceResult};
use crate::records::{PriceSnapshotRecord, SentimentRecord, SignalRecord};
use crate::writer::JsonLinesWriter;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Output table names (also the file prefixes of [`JsonlSink`]).
pub const PRICE_SNAPSHOTS: &str = "price_snapshots";
pub const SOCIAL_SIGNALS: &str = "social_signals";
pub const DECOUPLING_SIGNALS: &str = "decoupling_signals";

/// Durable append-only output.
pub trait SignalSink: Send + Sync {
    fn append_price_snapshot(
        &self,
        record: PriceSnapshotRecord,
    ) -> BoxFuture<'_, PersistenceResult<()>>;

    fn append_sentiment_record(&self, record: SentimentRecord)
        -> BoxFuture<'_, PersistenceResult<()>>;

    fn append_signal(&self, record: SignalRecord) -> BoxFuture<'_, PersistenceResult<()>>;
}

impl<T: SignalSink + ?Sized> SignalSink for Arc<T> {
    fn append_price_snapshot(
        &self,
        record: PriceSnapshotRecord,
    ) -> BoxFuture<'_, PersistenceResult<()>> {
        (**self).append_price_snapshot(record)
    }

    fn append_sentiment_record(
        &self,
        record: SentimentRecord,
    ) -> BoxFuture<'_, PersistenceResult<()>> {
        (**self).append_sentiment_record(record)
    }

    fn append_signal(&self, record: SignalRecord) -> BoxFuture<'_, PersistenceResult<()>> {
        (**self).append_signal(record)
    }
}

type SharedWriter<R> = Arc<Mutex<JsonLinesWriter<R>>>;

/// JSON Lines sink: one daily-rotated file per table.
///
/// File I/O runs on the blocking pool inside the returned future, so a
/// caller-side timeout bounds the whole write. A timed-out append may still
/// complete in the background.
pub struct JsonlSink {
    prices: SharedWriter<PriceSnapshotRecord>,
    sentiment: SharedWriter<SentimentRecord>,
    signals: SharedWriter<SignalRecord>,
}

impl JsonlSink {
    /// Open a sink writing under `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> PersistenceResult<Self> {
        let dir = data_dir.as_ref();
        info!(data_dir = %dir.display(), "Opening JSON Lines sink");
        Ok(Self {
            prices: Arc::new(Mutex::new(JsonLinesWriter::new(dir, PRICE_SNAPSHOTS)?)),
            sentiment: Arc::new(Mutex::new(JsonLinesWriter::new(dir, SOCIAL_SIGNALS)?)),
            signals: Arc::new(Mutex::new(JsonLinesWriter::new(dir, DECOUPLING_SIGNALS)?)),
        })
    }

    /// Close all open files.
    pub fn close(&self) {
        self.prices.lock().close();
        self.sentiment.lock().close();
        self.signals.lock().close();
    }
}

fn append_blocking<R>(
    writer: &SharedWriter<R>,
    record: R,
) -> BoxFuture<'static, PersistenceResult<()>>
where
    R: Serialize + Send + 'static,
{
    let writer = writer.clone();
    Box::pin(async move {
        tokio::task::spawn_blocking(move || writer.lock().append(&record))
            .await
            .map_err(|e| PersistenceError::Unavailable(format!("write task failed: {e}")))?
    })
}

impl SignalSink for JsonlSink {
    fn append_price_snapshot(
        &self,
        record: PriceSnapshotRecord,
    ) -> BoxFuture<'_, PersistenceResult<()>> {
        append_blocking(&self.prices, record)
    }

    fn append_sentiment_record(
        &self,
        record: SentimentRecord,
    ) -> BoxFuture<'_, PersistenceResult<()>> {
        append_blocking(&self.sentiment, record)
    }

    fn append_signal(&self, record: SignalRecord) -> BoxFuture<'_, PersistenceResult<()>> {
        append_blocking(&self.signals, record)
    }
}

/// In-memory sink for testing and dry runs.
///
/// Records every append; can be switched into a failing state to exercise
/// collaborator-failure handling.
#[derive(Debug, Default)]
pub struct MemorySink {
    prices: Mutex<Vec<PriceSnapshotRecord>>,
    sentiment: Mutex<Vec<SentimentRecord>>,
    signals: Mutex<Vec<SignalRecord>>,
    failing: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent appends fail (`true`) or succeed (`false`).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn prices(&self) -> Vec<PriceSnapshotRecord> {
        self.prices.lock().clone()
    }

    pub fn sentiment(&self) -> Vec<SentimentRecord> {
        self.sentiment.lock().clone()
    }

    pub fn signals(&self) -> Vec<SignalRecord> {
        self.signals.lock().clone()
    }

    fn push<T>(&self, rows: &Mutex<Vec<T>>, row: T) -> PersistenceResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "memory sink set to fail".to_string(),
            ));
        }
        rows.lock().push(row);
        Ok(())
    }
}

impl SignalSink for MemorySink {
    fn append_price_snapshot(
        &self,
        record: PriceSnapshotRecord,
    ) -> BoxFuture<'_, PersistenceResult<()>> {
        Box::pin(std::future::ready(self.push(&self.prices, record)))
    }

    fn append_sentiment_record(
        &self,
        record: SentimentRecord,
    ) -> BoxFuture<'_, PersistenceResult<()>> {
        Box::pin(std::future::ready(self.push(&self.sentiment, record)))
    }

    fn append_signal(&self, record: SignalRecord) -> BoxFuture<'_, PersistenceResult<()>> {
        Box::pin(std::future::ready(self.push(&self.signals, record)))
    }
}
