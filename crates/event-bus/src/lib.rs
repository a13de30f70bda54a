//! # Event Bus - Keyed Event Transport
//!
//! Value model and in-memory transport for keyed event streams.
//!
//! ## Model
//!
//! ```text
//!   publish(event) ──→ ┌────────────────────┐ ──→ subscribe(key)
//!                      │  InMemoryEventBus  │
//!   get(key)  ←─────── │  latest-by-key map │
//!                      └────────────────────┘
//! ```
//!
//! - Every [`Event`] is addressed by an [`EventKey`] (`<prefix>.<name>`).
//! - The bus remembers the most recent event per key, so late readers can
//!   fetch the current value without having been subscribed.
//! - Events carry typed, multi-valued parameters ([`ParamSet`]).

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod error;
pub mod events;
pub mod params;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use error::BusError;
pub use events::{Event, EventId, EventKey, EventKind};
pub use params::{
    bool_key, double_key, int_key, long_key, string_key, Key, ParamError, ParamSet, ParamType,
    ParamValues, Parameter,
};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::Subscription;

/// Events buffered per key before a slow subscriber lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
