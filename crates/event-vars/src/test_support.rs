//! Mock transport and observers shared by unit tests.

use crate::domain::{BindingToken, Observer};
use crate::error::{VariableError, VariableResult};
use crate::ports::outbound::{Cancellable, EventCallback, EventService, TickCallback};
use async_trait::async_trait;
use event_bus::{int_key, Event, EventKey, ParamSet};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub(crate) fn event_key(key: &str) -> EventKey {
    key.parse().expect("valid key")
}

/// Valid system event carrying `value = [value]`.
pub(crate) fn event(key: &str, value: i32) -> Event {
    Event::system(
        event_key(key),
        ParamSet::new().add(int_key("value").set([value])),
    )
}

fn transport_failure(op: &str) -> VariableError {
    VariableError::Transport {
        reason: format!("mock {op} failure"),
    }
}

/// Transport double: stores one event per key, records publishes and keeps
/// every subscription callback and tick so tests can fire them by hand.
#[derive(Default)]
pub(crate) struct MockEventService {
    events: Mutex<HashMap<EventKey, Event>>,
    published: Mutex<Vec<Event>>,
    callbacks: Mutex<Vec<EventCallback>>,
    ticks: Mutex<Vec<(Duration, TickCallback)>>,
    get_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
    schedule_calls: AtomicUsize,
    cancel_calls: Arc<AtomicUsize>,
    fail_get: AtomicBool,
    fail_publish: AtomicBool,
    fail_subscribe: AtomicBool,
}

impl MockEventService {
    pub(crate) fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn with_event(event: Event) -> Arc<Self> {
        let service = Self::default();
        service.set_event(event);
        Arc::new(service)
    }

    pub(crate) fn set_event(&self, event: Event) {
        self.events.lock().insert(event.key().clone(), event);
    }

    pub(crate) fn fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn published(&self) -> Vec<Event> {
        self.published.lock().clone()
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn scheduled_interval(&self, index: usize) -> Option<Duration> {
        self.ticks.lock().get(index).map(|(interval, _)| *interval)
    }

    /// Deliver `event` through the `index`-th push subscription.
    pub(crate) async fn push(&self, index: usize, event: Event) {
        let callback = self.callbacks.lock()[index].clone();
        callback(event).await;
    }

    /// Fire the `index`-th periodic schedule once.
    pub(crate) async fn tick(&self, index: usize) {
        let task = self.ticks.lock()[index].1.clone();
        task().await;
    }
}

struct MockCancellable {
    cancels: Arc<AtomicUsize>,
}

#[async_trait]
impl Cancellable for MockCancellable {
    async fn cancel(&self) -> VariableResult<()> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl EventService for MockEventService {
    async fn get_event(&self, key: &EventKey) -> VariableResult<Option<Event>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(transport_failure("get"));
        }
        Ok(self.events.lock().get(key).cloned())
    }

    async fn publish_event(&self, event: Event) -> VariableResult<()> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(transport_failure("publish"));
        }
        self.published.lock().push(event);
        Ok(())
    }

    async fn on_event(
        &self,
        _key: &EventKey,
        callback: EventCallback,
    ) -> VariableResult<Box<dyn Cancellable>> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(transport_failure("subscribe"));
        }
        self.callbacks.lock().push(callback);
        Ok(Box::new(MockCancellable {
            cancels: Arc::clone(&self.cancel_calls),
        }))
    }

    async fn schedule_periodically(
        &self,
        interval: Duration,
        task: TickCallback,
    ) -> VariableResult<Box<dyn Cancellable>> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(transport_failure("schedule"));
        }
        self.ticks.lock().push((interval, task));
        Ok(Box::new(MockCancellable {
            cancels: Arc::clone(&self.cancel_calls),
        }))
    }
}

/// Counts refreshes and keeps its tokens.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    refreshes: AtomicUsize,
    tokens: Mutex<Vec<BindingToken>>,
}

impl RecordingObserver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub(crate) fn registered(&self) -> usize {
        self.tokens.lock().len()
    }
}

#[async_trait]
impl Observer for RecordingObserver {
    async fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }

    fn register_binding(&self, token: BindingToken) {
        self.tokens.lock().push(token);
    }
}

/// Detaches itself on its first refresh.
#[derive(Default)]
pub(crate) struct CancellingObserver {
    inner: RecordingObserver,
}

impl CancellingObserver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn refreshes(&self) -> usize {
        self.inner.refreshes()
    }
}

#[async_trait]
impl Observer for CancellingObserver {
    async fn refresh(&self) {
        self.inner.refresh().await;
        let tokens = self.inner.tokens.lock().clone();
        for token in tokens {
            token.cancel().await.expect("cancel");
        }
    }

    fn register_binding(&self, token: BindingToken) {
        self.inner.register_binding(token);
    }
}
