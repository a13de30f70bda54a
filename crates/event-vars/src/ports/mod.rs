//! Ports (Hexagonal Architecture)
//!
//! - Outbound: the event transport the variables are driven by

pub mod outbound;

pub use outbound::{Cancellable, EventCallback, EventService, TickCallback};
