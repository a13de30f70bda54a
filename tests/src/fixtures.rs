//! Shared wiring for the integration flows.

use async_trait::async_trait;
use event_bus::{Event, EventKey, InMemoryEventBus, ParamSet};
use event_vars::{BindingToken, BusEventService, EventService, Observer};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use vars_telemetry::{init_telemetry, TelemetryConfig, TelemetryGuard};

static TELEMETRY: OnceLock<Option<TelemetryGuard>> = OnceLock::new();

/// Install quiet logging once per test binary.
pub fn init_logging() {
    TELEMETRY.get_or_init(|| init_telemetry(TelemetryConfig::for_tests()).ok());
}

/// A bus and the event service wrapping it.
pub struct TestBus {
    pub bus: Arc<InMemoryEventBus>,
    pub service: Arc<dyn EventService>,
}

impl TestBus {
    pub fn new() -> Self {
        init_logging();
        let bus = Arc::new(InMemoryEventBus::new());
        let service: Arc<dyn EventService> = Arc::new(BusEventService::new(Arc::clone(&bus)));
        Self { bus, service }
    }

    /// Publish straight onto the bus, bypassing the service's validity check.
    pub async fn publish_raw(&self, event: Event) {
        use event_bus::EventPublisher;
        self.bus.publish(event).await;
    }

    /// Publish a system event with `params` under `key`.
    pub async fn publish(&self, key: &EventKey, params: ParamSet) -> Event {
        let event = Event::system(key.clone(), params);
        self.publish_raw(event.clone()).await;
        event
    }
}

impl Default for TestBus {
    fn default() -> Self {
        Self::new()
    }
}

pub fn key(s: &str) -> EventKey {
    s.parse().expect("valid key")
}

/// A minimal state machine: counts refreshes, keeps its bindings and can
/// stop itself after a number of refreshes.
pub struct TestFsm {
    name: String,
    refreshes: AtomicUsize,
    tokens: Mutex<Vec<BindingToken>>,
    stop_after: Option<usize>,
}

impl TestFsm {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            refreshes: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
            stop_after: None,
        })
    }

    /// Cancels all its bindings from within its `stop_after`-th refresh.
    pub fn stopping_after(name: &str, stop_after: usize) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            refreshes: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
            stop_after: Some(stop_after),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Vec<BindingToken> {
        self.tokens.lock().clone()
    }

    /// Cancel every binding this machine holds.
    pub async fn stop(&self) -> anyhow::Result<()> {
        let tokens = std::mem::take(&mut *self.tokens.lock());
        for token in tokens {
            token.cancel().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Observer for TestFsm {
    async fn refresh(&self) {
        let count = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.stop_after == Some(count) {
            if let Err(e) = self.stop().await {
                tracing::error!(fsm = %self.name, error = %e, "Failed to stop");
            }
        }
    }

    fn register_binding(&self, token: BindingToken) {
        self.tokens.lock().push(token);
    }
}

/// Poll `condition` until it holds or `limit` elapses.
pub async fn wait_until(limit: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Let spawned tasks run without advancing time.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
