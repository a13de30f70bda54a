//! Adapters - transport implementations of the outbound port

pub mod bus_adapter;

pub use bus_adapter::BusEventService;
