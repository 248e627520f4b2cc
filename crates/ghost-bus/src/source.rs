//! Message source trait.

use crate::error::BusResult;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Pull-based topic subscription.
///
/// `Ok(None)` means nothing arrived within `timeout`. A transport-level
/// error reported for the topic is returned as [`crate::BusError::Delivery`].
pub trait MessageSource: Send + Sync {
    fn receive<'a>(
        &'a self,
        topic: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, BusResult<Option<Vec<u8>>>>;
}

impl<T: MessageSource + ?Sized> MessageSource for Arc<T> {
    fn receive<'a>(
        &'a self,
        topic: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, BusResult<Option<Vec<u8>>>> {
        (**self).receive(topic, timeout)
    }
}
