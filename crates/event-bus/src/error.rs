//! Error types for the event bus.

use thiserror::Error;

/// Errors from bus operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A key string could not be split into prefix and name.
    #[error("Invalid event key: '{key}'")]
    InvalidEventKey { key: String },
}
