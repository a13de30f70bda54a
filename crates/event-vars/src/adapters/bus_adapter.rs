//! Event service backed by the in-memory event bus.
//!
//! Push subscriptions and periodic schedules each run in their own tokio
//! task. Cancelling signals the task through a `watch` channel instead of
//! aborting it, so a callback may cancel its own subscription safely.

use crate::error::{VariableError, VariableResult};
use crate::ports::outbound::{Cancellable, EventCallback, EventService, TickCallback};
use async_trait::async_trait;
use event_bus::{Event, EventKey, EventPublisher, InMemoryEventBus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// [`EventService`] over an [`InMemoryEventBus`].
#[derive(Clone)]
pub struct BusEventService {
    bus: Arc<InMemoryEventBus>,
}

impl BusEventService {
    pub fn new(bus: Arc<InMemoryEventBus>) -> Self {
        Self { bus }
    }

    #[must_use]
    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }
}

/// Stop signal of a spawned subscription or schedule task.
struct TaskHandle {
    shutdown: watch::Sender<bool>,
    label: String,
}

impl TaskHandle {
    fn stop(&self) {
        self.shutdown.send_replace(true);
    }
}

#[async_trait]
impl Cancellable for TaskHandle {
    async fn cancel(&self) -> VariableResult<()> {
        self.stop();
        debug!(task = %self.label, "Task cancelled");
        Ok(())
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl EventService for BusEventService {
    /// A key nothing was published under yields the invalid placeholder.
    async fn get_event(&self, key: &EventKey) -> VariableResult<Option<Event>> {
        Ok(Some(
            self.bus
                .get(key)
                .unwrap_or_else(|| Event::invalid(key.clone())),
        ))
    }

    async fn publish_event(&self, event: Event) -> VariableResult<()> {
        if event.is_invalid() {
            return Err(VariableError::Transport {
                reason: format!("refusing to publish invalid event for {}", event.key()),
            });
        }
        self.bus.publish(event).await;
        Ok(())
    }

    async fn on_event(
        &self,
        key: &EventKey,
        callback: EventCallback,
    ) -> VariableResult<Box<dyn Cancellable>> {
        let mut subscription = self.bus.subscribe(key);
        let (shutdown, mut stop) = watch::channel(false);
        let label = format!("subscribe:{key}");

        let task_label = label.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = stop.changed() => break,
                    received = subscription.recv() => {
                        let Some(event) = received else { break };
                        if *stop.borrow() {
                            break;
                        }
                        callback(event).await;
                    }
                }
            }
            debug!(task = %task_label, "Task stopped");
        });

        Ok(Box::new(TaskHandle { shutdown, label }))
    }

    async fn schedule_periodically(
        &self,
        interval: Duration,
        task: TickCallback,
    ) -> VariableResult<Box<dyn Cancellable>> {
        if interval.is_zero() {
            return Err(VariableError::InvalidPollInterval);
        }

        let (shutdown, mut stop) = watch::channel(false);
        let label = format!("poll:{}ms", interval.as_millis());

        let task_label = label.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = stop.changed() => break,
                    _ = ticker.tick() => {
                        if *stop.borrow() {
                            break;
                        }
                        task().await;
                    }
                }
            }
            debug!(task = %task_label, "Task stopped");
        });

        Ok(Box::new(TaskHandle { shutdown, label }))
    }
}
