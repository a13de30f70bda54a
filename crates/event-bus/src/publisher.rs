//! # Keyed Event Bus
//!
//! Every key owns a slot holding its most recent event and a broadcast
//! channel that only carries events of that key.
//!
//! ```text
//!   publish(e) ──→ slots[e.key] ─┬─ latest = e          (get)
//!                                └─ sender.send(e) ──→ Subscription(s)
//! ```

use crate::events::{Event, EventKey};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Publishing side of the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `event` under its key and return how many subscribers of that
    /// key it reached.
    async fn publish(&self, event: Event) -> usize;

    /// Total events published.
    fn events_published(&self) -> u64;
}

/// Per-key state: last published event and the key's fan-out channel.
struct KeySlot {
    latest: Option<Event>,
    sender: broadcast::Sender<Event>,
}

impl KeySlot {
    fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            latest: None,
            sender,
        }
    }
}

/// In-memory keyed event bus.
///
/// Subscribers only wake for their own key. The latest event per key stays
/// readable through [`get`](Self::get) whether or not anyone is subscribed.
pub struct InMemoryEventBus {
    slots: RwLock<HashMap<EventKey, KeySlot>>,
    events_published: AtomicU64,
    /// Buffered events per key before a slow subscriber lags.
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to events published under `key` from now on.
    #[must_use]
    pub fn subscribe(&self, key: &EventKey) -> Subscription {
        let receiver = self
            .slots
            .write()
            .entry(key.clone())
            .or_insert_with(|| KeySlot::new(self.capacity))
            .sender
            .subscribe();

        debug!(key = %key, "Subscribed");
        Subscription::new(key.clone(), receiver)
    }

    /// Most recent event published under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &EventKey) -> Option<Event> {
        self.slots.read().get(key).and_then(|slot| slot.latest.clone())
    }

    /// Keys that have at least one published event, sorted.
    #[must_use]
    pub fn known_keys(&self) -> Vec<EventKey> {
        let mut keys: Vec<EventKey> = self
            .slots
            .read()
            .iter()
            .filter(|(_, slot)| slot.latest.is_some())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Live subscriptions on `key`.
    #[must_use]
    pub fn subscriber_count(&self, key: &EventKey) -> usize {
        self.slots
            .read()
            .get(key)
            .map_or(0, |slot| slot.sender.receiver_count())
    }

    /// Live subscriptions across all keys.
    #[must_use]
    pub fn total_subscribers(&self) -> usize {
        self.slots
            .read()
            .values()
            .map(|slot| slot.sender.receiver_count())
            .sum()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: Event) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let mut slots = self.slots.write();
        let slot = slots
            .entry(event.key().clone())
            .or_insert_with(|| KeySlot::new(self.capacity));
        slot.latest = Some(event.clone());

        let key = event.key().clone();
        // Send fails only when nobody listens on this key.
        let reached = slot.sender.send(event).unwrap_or(0);
        trace!(key = %key, reached, "Published");
        reached
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
