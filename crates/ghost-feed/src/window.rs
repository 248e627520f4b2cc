//! Time-windowed rolling statistics over a scalar stream.
//!
//! The window is driven by data time, not wall-clock time: eviction happens
//! relative to the greatest timestamp ever added (the watermark), so an
//! aggregator that stops receiving data keeps its last window intact.
//!
//! Points are kept sorted by timestamp. In-order arrivals are appended in
//! O(1); a backdated point is inserted at its sorted position, or discarded
//! immediately if it is already older than `watermark - window`.

use crate::error::{FeedError, FeedResult};
use ghost_core::DataPoint;
use std::collections::VecDeque;
use std::time::Duration;

/// How an `add` call was admitted into the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Timestamp at or after the newest retained point.
    InOrder,
    /// Older than the newest point but still inside the window.
    Backdated,
    /// Older than `watermark - window`; not retained.
    Expired,
}

/// Rolling window aggregator for one (asset, stream) pair.
#[derive(Debug, Clone)]
pub struct WindowedAggregator {
    window_secs: f64,
    points: VecDeque<DataPoint>,
    /// Greatest timestamp ever added.
    watermark: Option<f64>,
}

impl WindowedAggregator {
    /// Create an empty aggregator.
    ///
    /// Returns `InvalidWindow` for a zero-length window.
    pub fn new(window: Duration) -> FeedResult<Self> {
        let window_secs = window.as_secs_f64();
        if window_secs <= 0.0 {
            return Err(FeedError::InvalidWindow(format!(
                "window must be positive, got {window_secs}s"
            )));
        }
        Ok(Self {
            window_secs,
            points: VecDeque::new(),
            watermark: None,
        })
    }

    /// Record `value` observed at `timestamp` and evict expired points.
    ///
    /// Non-finite input is rejected and leaves the window unchanged.
    pub fn add(&mut self, value: f64, timestamp: f64) -> FeedResult<Admission> {
        let point = DataPoint::new(value, timestamp)?;

        let admission = match self.points.back() {
            Some(newest) if point.timestamp < newest.timestamp => {
                let cutoff = self.watermark.unwrap_or(newest.timestamp) - self.window_secs;
                if point.timestamp < cutoff {
                    return Ok(Admission::Expired);
                }
                // Insert after any existing points with the same timestamp.
                let idx = self
                    .points
                    .partition_point(|p| p.timestamp <= point.timestamp);
                self.points.insert(idx, point);
                Admission::Backdated
            }
            _ => {
                self.points.push_back(point);
                Admission::InOrder
            }
        };

        let watermark = match self.watermark {
            Some(w) if w >= point.timestamp => w,
            _ => point.timestamp,
        };
        self.watermark = Some(watermark);
        self.evict(watermark - self.window_secs);

        Ok(admission)
    }

    fn evict(&mut self, cutoff: f64) {
        while self
            .points
            .front()
            .is_some_and(|oldest| oldest.timestamp < cutoff)
        {
            self.points.pop_front();
        }
    }

    /// Arithmetic mean of retained values, `None` when empty.
    pub fn average(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let sum: f64 = self.points.iter().map(|p| p.value).sum();
        Some(sum / self.points.len() as f64)
    }

    /// Number of retained points.
    pub fn count(&self) -> usize {
        self.points.len()
    }

    /// Value of the newest retained point, `None` when empty.
    pub fn latest(&self) -> Option<f64> {
        self.points.back().map(|p| p.value)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(self.window_secs)
    }

    /// Greatest timestamp ever added, even if that point was later evicted.
    pub fn watermark(&self) -> Option<f64> {
        self.watermark
    }

    pub fn oldest_timestamp(&self) -> Option<f64> {
        self.points.front().map(|p| p.timestamp)
    }

    pub fn newest_timestamp(&self) -> Option<f64> {
        self.points.back().map(|p| p.timestamp)
    }

    /// Retained points, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &DataPoint> {
        self.points.iter()
    }
}
