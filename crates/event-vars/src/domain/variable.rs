//! Event variable - one shared subscription fanned out to many observers
//!
//! ```text
//!   transport ──push / poll──→ EventVariable ──refresh──→ observer 1
//!                               (filter,     ──refresh──→ observer 2
//!                                cache)      ──refresh──→ ...
//! ```
//!
//! The subscription (or poll schedule) is live exactly while at least one
//! observer is bound: it is established by the bind that takes the observer
//! set from empty to one member and cancelled by the detach that empties it.
//!
//! Observers are held weakly and tokens hold the variable strongly, so an
//! observer may own the variable it is bound to. An observer dropped without
//! cancelling is pruned on the next delivery or poll tick; if it was the last
//! one the subscription is released then.

use crate::domain::binding::{observer_id, BindingId, BindingToken, Observer, ObserverId};
use crate::error::{VariableError, VariableResult};
use crate::ports::outbound::{Cancellable, EventCallback, EventService, TickCallback};
use event_bus::{Event, EventKey};
use futures::FutureExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

/// Shared view of the latest valid event of one key.
///
/// Cloning is cheap; clones share observers, cache and subscription. The
/// variable lives as long as a clone or an outstanding [`BindingToken`] does.
///
/// Push deliveries are accepted whenever they are valid. Polled snapshots are
/// accepted only when valid AND different from the cached event, since a
/// poll re-reads the same value until something new is published.
#[derive(Clone)]
pub struct EventVariable {
    inner: Arc<VariableInner>,
}

/// Live subscription with the generation its callbacks are tagged with.
struct ActiveHandle {
    generation: u64,
    cancellable: Box<dyn Cancellable>,
}

struct VariableState {
    /// Most recent accepted event. Never invalid.
    latest: Event,
    /// Bound observers, in bind order, unique by identity.
    observers: Vec<(ObserverId, Weak<dyn Observer>)>,
    /// Active bindings and the observer each one attaches.
    bindings: HashMap<BindingId, ObserverId>,
    /// Generation of the live handle. Deliveries tagged otherwise are stale.
    live_generation: Option<u64>,
    next_generation: u64,
}

impl VariableState {
    fn is_bound(&self, id: ObserverId) -> bool {
        self.observers.iter().any(|(bound, _)| *bound == id)
    }

    fn dropped_observers(&self) -> Vec<ObserverId> {
        self.observers
            .iter()
            .filter(|(_, observer)| observer.strong_count() == 0)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Remove `ids` and every binding attached to them. Returns whether the
    /// observer set is now empty, in which case the live generation ends.
    fn remove_observers(&mut self, ids: &[ObserverId]) -> bool {
        self.observers.retain(|(id, _)| !ids.contains(id));
        self.bindings.retain(|_, id| !ids.contains(id));

        let empty = self.observers.is_empty();
        if empty {
            self.live_generation = None;
        }
        empty
    }
}

pub(crate) struct VariableInner {
    key: EventKey,
    service: Arc<dyn EventService>,
    poll_interval: Option<Duration>,
    /// Serializes bind/detach, including the awaited subscribe and cancel.
    handle: Mutex<Option<ActiveHandle>>,
    state: RwLock<VariableState>,
    next_binding: AtomicU64,
}

impl EventVariable {
    /// Fetch the current event for `key` and wrap it.
    ///
    /// With `poll_interval` set, observers are served by polling the key at
    /// that interval instead of a push subscription.
    ///
    /// # Errors
    ///
    /// `NotFound` if the transport has no valid event for `key`, or the
    /// transport's own failure.
    pub async fn make(
        key: EventKey,
        service: Arc<dyn EventService>,
        poll_interval: Option<Duration>,
    ) -> VariableResult<Self> {
        let initial = fetch_required(service.as_ref(), &key).await?;
        Self::from_initial(initial, service, poll_interval)
    }

    /// Wrap an already fetched event. The key is taken from the event.
    pub(crate) fn from_initial(
        initial: Event,
        service: Arc<dyn EventService>,
        poll_interval: Option<Duration>,
    ) -> VariableResult<Self> {
        if poll_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(VariableError::InvalidPollInterval);
        }

        Ok(Self {
            inner: Arc::new(VariableInner {
                key: initial.key().clone(),
                service,
                poll_interval,
                handle: Mutex::new(None),
                state: RwLock::new(VariableState {
                    latest: initial,
                    observers: Vec::new(),
                    bindings: HashMap::new(),
                    live_generation: None,
                    next_generation: 0,
                }),
                next_binding: AtomicU64::new(0),
            }),
        })
    }

    /// Attach `observer` and hand it the token that detaches it.
    ///
    /// The first observer establishes the subscription; later observers
    /// share it. Binding an observer that is already bound keeps a single
    /// membership but still issues a new token.
    ///
    /// The token is registered with the observer before any other bind or
    /// cancel on this variable can run, so `register_binding` must not block.
    ///
    /// # Errors
    ///
    /// Transport failure while establishing the subscription. The observer
    /// is then left unbound and receives no token.
    pub async fn bind(&self, observer: Arc<dyn Observer>) -> VariableResult<BindingToken> {
        let inner = &self.inner;
        let mut handle = inner.handle.lock().await;

        let id = observer_id(&observer);
        let binding = BindingId(inner.next_binding.fetch_add(1, Ordering::Relaxed));
        {
            let mut state = inner.state.write();
            if !state.is_bound(id) {
                state.observers.push((id, Arc::downgrade(&observer)));
            }
            state.bindings.insert(binding, id);
        }

        if handle.is_none() {
            let generation = {
                let mut state = inner.state.write();
                state.next_generation += 1;
                let generation = state.next_generation;
                state.live_generation = Some(generation);
                generation
            };

            match inner.start_subscription(generation).await {
                Ok(cancellable) => {
                    debug!(
                        key = %inner.key,
                        generation,
                        polling = inner.poll_interval.is_some(),
                        "Subscription started"
                    );
                    *handle = Some(ActiveHandle {
                        generation,
                        cancellable,
                    });
                }
                Err(e) => {
                    let mut state = inner.state.write();
                    state.observers.retain(|(bound, _)| *bound != id);
                    state.bindings.remove(&binding);
                    state.live_generation = None;
                    warn!(key = %inner.key, error = %e, "Failed to start subscription");
                    return Err(e);
                }
            }
        }

        let token = BindingToken::new(binding, Arc::clone(inner));
        observer.register_binding(token.clone());
        drop(handle);

        debug!(key = %inner.key, binding = binding.0, "Observer bound");
        Ok(token)
    }

    /// Most recent accepted event.
    #[must_use]
    pub fn latest_event(&self) -> Event {
        self.inner.state.read().latest.clone()
    }

    #[must_use]
    pub fn key(&self) -> &EventKey {
        &self.inner.key
    }

    #[must_use]
    pub fn poll_interval(&self) -> Option<Duration> {
        self.inner.poll_interval
    }

    /// Number of distinct bound observers that are still alive.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner
            .state
            .read()
            .observers
            .iter()
            .filter(|(_, observer)| observer.strong_count() > 0)
            .count()
    }

    /// Whether a subscription or poll schedule is live.
    pub async fn is_subscribed(&self) -> bool {
        self.inner.handle.lock().await.is_some()
    }

    pub(crate) fn service(&self) -> &Arc<dyn EventService> {
        &self.inner.service
    }
}

impl std::fmt::Debug for EventVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventVariable")
            .field("key", &self.inner.key)
            .field("poll_interval", &self.inner.poll_interval)
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl VariableInner {
    pub(crate) fn key(&self) -> &EventKey {
        &self.key
    }

    pub(crate) fn is_binding_active(&self, binding: BindingId) -> bool {
        self.state.read().bindings.contains_key(&binding)
    }

    async fn start_subscription(
        self: &Arc<Self>,
        generation: u64,
    ) -> VariableResult<Box<dyn Cancellable>> {
        // Callbacks hold the variable weakly so a forgotten subscription
        // never keeps it alive.
        let weak: Weak<Self> = Arc::downgrade(self);

        match self.poll_interval {
            Some(interval) => {
                let tick: TickCallback = Arc::new(move || {
                    let weak = weak.clone();
                    async move {
                        if let Some(inner) = weak.upgrade() {
                            inner.poll_once(generation).await;
                        }
                    }
                    .boxed()
                });
                self.service.schedule_periodically(interval, tick).await
            }
            None => {
                let callback: EventCallback = Arc::new(move |event| {
                    let weak = weak.clone();
                    async move {
                        if let Some(inner) = weak.upgrade() {
                            inner.deliver(generation, event).await;
                        }
                    }
                    .boxed()
                });
                self.service.on_event(&self.key, callback).await
            }
        }
    }

    /// One poll tick: forward the current event only if it changed.
    async fn poll_once(&self, generation: u64) {
        let dropped = self.state.read().dropped_observers();
        if !dropped.is_empty() {
            self.prune(&dropped).await;
            if self.state.read().live_generation != Some(generation) {
                return;
            }
        }

        match self.service.get_event(&self.key).await {
            Ok(Some(event)) => {
                let changed = self.state.read().latest != event;
                if changed {
                    self.deliver(generation, event).await;
                }
            }
            Ok(None) => {
                debug!(key = %self.key, "Poll found no event, keeping latest");
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Poll failed, keeping latest");
            }
        }
    }

    /// Accept a candidate event and refresh every bound observer.
    async fn deliver(&self, generation: u64, event: Event) {
        if event.key() != &self.key {
            warn!(
                key = %self.key,
                delivered = %event.key(),
                "Dropping delivery for foreign key"
            );
            return;
        }

        let observers: Vec<(ObserverId, Weak<dyn Observer>)> = {
            let mut state = self.state.write();
            if state.live_generation != Some(generation) {
                trace!(key = %self.key, generation, "Dropping stale delivery");
                return;
            }
            if event.is_invalid() {
                trace!(key = %self.key, "Dropping invalid event");
                return;
            }
            state.latest = event;
            state.observers.clone()
        };

        // Observers may detach themselves (or others) while being refreshed;
        // anyone detached after the snapshot is skipped.
        let mut dropped = Vec::new();
        for (id, observer) in observers {
            let bound = self.state.read().is_bound(id);
            if !bound {
                continue;
            }
            match observer.upgrade() {
                Some(observer) => observer.refresh().await,
                None => dropped.push(id),
            }
        }

        if !dropped.is_empty() {
            self.prune(&dropped).await;
        }
    }

    /// Forget observers that were dropped without cancelling.
    async fn prune(&self, dropped: &[ObserverId]) {
        let mut handle = self.handle.lock().await;
        let now_empty = self.state.write().remove_observers(dropped);
        debug!(key = %self.key, dropped = dropped.len(), "Pruned dropped observers");

        if now_empty {
            if let Err(e) = self.release(&mut handle).await {
                warn!(key = %self.key, error = %e, "Failed to cancel subscription");
            }
        }
    }

    pub(crate) async fn unbind(&self, binding: BindingId) -> VariableResult<()> {
        let mut handle = self.handle.lock().await;

        let now_empty = {
            let mut state = self.state.write();
            let Some(observer) = state.bindings.remove(&binding) else {
                return Ok(());
            };
            // Other tokens of the same observer lose their effect too.
            state.remove_observers(&[observer])
        };

        debug!(key = %self.key, binding = binding.0, "Observer unbound");

        if now_empty {
            self.release(&mut handle).await?;
        }
        Ok(())
    }

    async fn release(&self, handle: &mut Option<ActiveHandle>) -> VariableResult<()> {
        if let Some(active) = handle.take() {
            active.cancellable.cancel().await?;
            debug!(
                key = %self.key,
                generation = active.generation,
                "Subscription cancelled"
            );
        }
        Ok(())
    }
}

/// Fetch the current event for `key`, treating an invalid one as absent.
async fn fetch_required(
    service: &dyn EventService,
    key: &EventKey,
) -> VariableResult<Event> {
    match service.get_event(key).await? {
        Some(event) if !event.is_invalid() => Ok(event),
        _ => Err(VariableError::NotFound { key: key.key() }),
    }
}
