//! JSON Lines file writer.
//!
//! Uses JSON Lines format (.jsonl) for robustness:
//! - Each line is a complete JSON object
//! - Partial file corruption only affects individual lines
//! - Can be read even if write was interrupted
//!
//! Files are named `{prefix}_{YYYY-MM-DD}.jsonl` (UTC) and rotate when the
//! date changes. Every append is flushed before returning.

use crate::error::PersistenceResult;
use chrono::Utc;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Active writer state for daily file.
struct ActiveWriter {
    writer: BufWriter<File>,
    date: String,
    path: PathBuf,
    records_written: usize,
}

/// Append-only JSON Lines writer for one record type.
pub struct JsonLinesWriter<R> {
    base_dir: PathBuf,
    prefix: String,
    active_writer: Option<ActiveWriter>,
    total_written: usize,
    _record: PhantomData<fn(&R)>,
}

impl<R: Serialize> JsonLinesWriter<R> {
    /// Create a writer for `{base_dir}/{prefix}_{date}.jsonl`.
    ///
    /// Creates `base_dir` if missing. No file is opened until the first
    /// append.
    pub fn new(base_dir: impl AsRef<Path>, prefix: impl Into<String>) -> PersistenceResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;

        Ok(Self {
            base_dir,
            prefix: prefix.into(),
            active_writer: None,
            total_written: 0,
            _record: PhantomData,
        })
    }

    /// Append one record to today's file and flush.
    pub fn append(&mut self, record: &R) -> PersistenceResult<()> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        self.append_on(&today, record)
    }

    /// Append one record to the file for `date` (`YYYY-MM-DD`) and flush.
    pub fn append_on(&mut self, date: &str, record: &R) -> PersistenceResult<()> {
        let needs_rotation = self
            .active_writer
            .as_ref()
            .is_some_and(|w| w.date != date);
        if needs_rotation {
            self.close_active_writer();
        }

        let active = match self.active_writer.take() {
            Some(active) => active,
            None => self.open_writer(date)?,
        };
        let active = self.active_writer.insert(active);

        let json = serde_json::to_string(record)?;
        writeln!(active.writer, "{json}")?;
        active.writer.flush()?;
        active.records_written += 1;
        self.total_written += 1;

        debug!(prefix = %self.prefix, date, "Appended record");
        Ok(())
    }

    /// Path of the currently open file, if any.
    pub fn current_path(&self) -> Option<&Path> {
        self.active_writer.as_ref().map(|w| w.path.as_path())
    }

    /// Records appended since creation.
    pub fn records_written(&self) -> usize {
        self.total_written
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Close the active file.
    pub fn close(&mut self) {
        self.close_active_writer();
    }

    fn open_writer(&self, date: &str) -> PersistenceResult<ActiveWriter> {
        let path = self.base_dir.join(format!("{}_{}.jsonl", self.prefix, date));

        info!(path = %path.display(), "Opening JSON Lines writer (append mode)");

        // Append mode: never truncates existing data
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(ActiveWriter {
            writer: BufWriter::new(file),
            date: date.to_string(),
            path,
            records_written: 0,
        })
    }

    fn close_active_writer(&mut self) {
        if let Some(mut active) = self.active_writer.take() {
            if let Err(e) = active.writer.flush() {
                warn!(?e, "Failed to flush writer on close");
            }
            info!(
                prefix = %self.prefix,
                date = %active.date,
                records = active.records_written,
                "Closed JSON Lines writer"
            );
        }
    }
}

impl<R> Drop for JsonLinesWriter<R> {
    fn drop(&mut self) {
        if let Some(mut active) = self.active_writer.take() {
            if let Err(e) = active.writer.flush() {
                warn!(?e, "Failed to flush writer on drop");
            }
        }
    }
}
