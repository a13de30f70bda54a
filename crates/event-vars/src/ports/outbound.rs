//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The event transport consumed by [`EventVariable`](crate::EventVariable).
//! Keys are addressed by [`EventKey`]; values are [`Event`] snapshots.

use crate::error::VariableResult;
use async_trait::async_trait;
use event_bus::{Event, EventKey};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;

/// Callback invoked for every event pushed on a subscription.
pub type EventCallback = Arc<dyn Fn(Event) -> BoxFuture<'static, ()> + Send + Sync>;

/// Callback invoked on every tick of a periodic schedule.
pub type TickCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// A live subscription or schedule that can be stopped.
#[async_trait]
pub trait Cancellable: Send + Sync {
    /// Stop the subscription or schedule.
    ///
    /// Once this returns, no new callback invocation starts. An invocation
    /// already running may still complete.
    async fn cancel(&self) -> VariableResult<()>;
}

/// Keyed event transport.
#[async_trait]
pub trait EventService: Send + Sync {
    /// Current event for `key`, `None` if nothing was ever published.
    async fn get_event(&self, key: &EventKey) -> VariableResult<Option<Event>>;

    /// Publish `event` under its own key.
    async fn publish_event(&self, event: Event) -> VariableResult<()>;

    /// Push subscription: `callback` runs for each event published on `key`
    /// after this call returns.
    async fn on_event(
        &self,
        key: &EventKey,
        callback: EventCallback,
    ) -> VariableResult<Box<dyn Cancellable>>;

    /// Run `task` every `interval`, starting one interval from now.
    async fn schedule_periodically(
        &self,
        interval: Duration,
        task: TickCallback,
    ) -> VariableResult<Box<dyn Cancellable>>;
}
