//! Error types for event variables

use event_bus::{BusError, EventKey, ParamError};
use thiserror::Error;

/// Event variable errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VariableError {
    /// No event exists yet for the key
    #[error("No event published for key {key}")]
    NotFound { key: String },

    /// The latest event lacks the tracked parameter
    #[error("Parameter '{param}' missing from latest event of {key}")]
    FieldMissing { key: String, param: String },

    /// The tracked parameter holds values of another type
    #[error("Parameter '{param}' of {key} holds {actual} values, expected {expected}")]
    TypeMismatch {
        key: String,
        param: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// The tracked parameter is present but empty
    #[error("Parameter '{param}' of {key} has no values")]
    NoValues { key: String, param: String },

    /// Fetch, publish, subscribe or cancel failed at the transport
    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    /// A key string could not be parsed
    #[error("Invalid event key: {key}")]
    InvalidEventKey { key: String },

    /// A poll interval of zero was requested
    #[error("Invalid poll interval: must be greater than zero")]
    InvalidPollInterval,
}

impl VariableError {
    /// Attach the event key to a parameter extraction error.
    pub(crate) fn from_param(key: &EventKey, err: ParamError) -> Self {
        match err {
            ParamError::Missing { name } => Self::FieldMissing {
                key: key.key(),
                param: name,
            },
            ParamError::TypeMismatch {
                name,
                expected,
                actual,
            } => Self::TypeMismatch {
                key: key.key(),
                param: name,
                expected,
                actual,
            },
        }
    }
}

impl From<BusError> for VariableError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::InvalidEventKey { key } => Self::InvalidEventKey { key },
        }
    }
}

/// Result type for event variable operations
pub type VariableResult<T> = Result<T, VariableError>;
