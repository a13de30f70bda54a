//! # event-vars
//!
//! Shared, reference-counted subscriptions to keyed event streams.
//!
//! ## Overview
//!
//! - **EventVariable**: caches the latest valid event of one key and fans
//!   updates out to bound observers through a single subscription
//! - **BindingToken**: one-shot detach capability handed to each observer
//! - **ParamVariable**: reads one typed parameter of the latest event and
//!   writes it back by publishing a merged successor event
//!
//! ## Architecture
//!
//! ```text
//! EventService (push / poll) ──→ EventVariable ──refresh──→ Observer(s)
//!          ↑                          │
//!          └──── publish_event ── ParamVariable::set_param
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! [IDLE] ──first bind──→ [SUBSCRIBED] ──last cancel──→ [IDLE]
//!                           │    ↑
//!                           └────┘ bind / cancel (others remain)
//! ```
//!
//! A subscription is live exactly while at least one observer is bound.
//!
//! ## Example
//!
//! ```rust,ignore
//! use event_vars::{BusEventService, VariableConfig, VariableFactory};
//! use event_bus::{int_key, InMemoryEventBus};
//!
//! let service = Arc::new(BusEventService::new(Arc::new(InMemoryEventBus::new())));
//! let factory = VariableFactory::new(service, VariableConfig::from_env());
//!
//! let position = factory
//!     .param_variable(0, "ocs.motor.position", int_key("current-location"))
//!     .await?;
//! let token = position.bind(fsm.clone()).await?;
//! position.set_param([42]).await?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use adapters::BusEventService;
pub use domain::{BindingId, BindingToken, EventVariable, Observer, ParamVariable};
pub use error::{VariableError, VariableResult};
pub use ports::outbound::{Cancellable, EventCallback, EventService, TickCallback};
pub use service::{VariableConfig, VariableFactory, POLL_INTERVAL_ENV};
