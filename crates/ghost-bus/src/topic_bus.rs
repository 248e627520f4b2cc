//! In-process topic bus.
//!
//! Bounded FIFO queue per topic. Producers (the relay client, tests, or
//! co-located producers) publish raw payloads; the processor pulls them
//! through [`MessageSource`]. When a queue is full the oldest payload is
//! discarded.

use crate::error::{BusError, BusResult};
use crate::source::{BoxFuture, MessageSource};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default per-topic queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug)]
enum Envelope {
    Payload(Vec<u8>),
    Error(String),
}

#[derive(Debug)]
struct TopicQueue {
    items: VecDeque<Envelope>,
    notify: Arc<Notify>,
}

impl TopicQueue {
    fn new() -> Self {
        Self {
            items: VecDeque::new(),
            notify: Arc::new(Notify::new()),
        }
    }
}

/// In-process topic bus.
#[derive(Debug)]
pub struct TopicBus {
    capacity: usize,
    topics: Mutex<HashMap<String, TopicQueue>>,
    closed: AtomicBool,
    overflowed: AtomicU64,
}

impl Default for TopicBus {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl TopicBus {
    /// Create a bus whose topics each hold at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
            overflowed: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Publish a payload to a topic.
    pub fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>) -> BusResult<()> {
        self.push(topic, Envelope::Payload(payload.into()))
    }

    /// Queue a transport error for a topic.
    ///
    /// The next `receive` on that topic fails with [`BusError::Delivery`].
    pub fn report_error(&self, topic: &str, reason: impl Into<String>) -> BusResult<()> {
        self.push(topic, Envelope::Error(reason.into()))
    }

    /// Close the bus and wake every waiting receiver.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Topic bus closed");
        for queue in self.topics.lock().values() {
            queue.notify.notify_waiters();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Entries waiting on a topic.
    pub fn pending(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .get(topic)
            .map(|q| q.items.len())
            .unwrap_or(0)
    }

    /// Payloads discarded because a queue was full.
    pub fn overflowed(&self) -> u64 {
        self.overflowed.load(Ordering::Relaxed)
    }

    /// Wait up to `timeout` for the next entry on `topic`.
    pub async fn recv(&self, topic: &str, timeout: Duration) -> BusResult<Option<Vec<u8>>> {
        let notify = self.notifier(topic);
        let deadline = Instant::now() + timeout;

        loop {
            let notified = notify.notified();
            tokio::pin!(notified);
            // Register before checking the queue so a concurrent publish
            // between the check and the await is not missed.
            notified.as_mut().enable();

            if let Some(envelope) = self.try_pop(topic)? {
                return match envelope {
                    Envelope::Payload(bytes) => Ok(Some(bytes)),
                    Envelope::Error(reason) => Err(BusError::Delivery {
                        topic: topic.to_string(),
                        reason,
                    }),
                };
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    fn push(&self, topic: &str, envelope: Envelope) -> BusResult<()> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let mut topics = self.topics.lock();
        let queue = topics
            .entry(topic.to_string())
            .or_insert_with(TopicQueue::new);

        if queue.items.len() >= self.capacity {
            queue.items.pop_front();
            self.overflowed.fetch_add(1, Ordering::Relaxed);
            warn!(topic, capacity = self.capacity, "Topic queue full, oldest entry discarded");
        }
        queue.items.push_back(envelope);
        queue.notify.notify_one();
        debug!(topic, pending = queue.items.len(), "Published");
        Ok(())
    }

    fn try_pop(&self, topic: &str) -> BusResult<Option<Envelope>> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        Ok(self
            .topics
            .lock()
            .get_mut(topic)
            .and_then(|q| q.items.pop_front()))
    }

    fn notifier(&self, topic: &str) -> Arc<Notify> {
        self.topics
            .lock()
            .entry(topic.to_string())
            .or_insert_with(TopicQueue::new)
            .notify
            .clone()
    }
}

impl MessageSource for TopicBus {
    fn receive<'a>(
        &'a self,
        topic: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, BusResult<Option<Vec<u8>>>> {
        Box::pin(self.recv(topic, timeout))
    }
}
