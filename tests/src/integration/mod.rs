//! # Integration Flows
//!
//! Event variables driven through `BusEventService` over a real
//! `InMemoryEventBus`: publishes travel through broadcast channels and
//! spawned subscription tasks exactly as in production wiring.

pub mod poll_lifecycle;
