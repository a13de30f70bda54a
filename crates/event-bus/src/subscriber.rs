//! Subscription to one key of the bus.

use crate::events::{Event, EventKey};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Receives the events published under one key.
///
/// Dropping the subscription detaches it from the key's channel.
pub struct Subscription {
    key: EventKey,
    receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    pub(crate) fn new(key: EventKey, receiver: broadcast::Receiver<Event>) -> Self {
        Self { key, receiver }
    }

    #[must_use]
    pub fn key(&self) -> &EventKey {
        &self.key
    }

    /// Next event of this key, or `None` once the bus is gone.
    ///
    /// A subscriber that falls more than the bus capacity behind skips the
    /// overwritten events and continues with the oldest one still buffered.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(key = %self.key, skipped, "Subscriber lagged");
                }
                Err(RecvError::Closed) => {
                    debug!(key = %self.key, "Bus closed");
                    return None;
                }
            }
        }
    }
}
