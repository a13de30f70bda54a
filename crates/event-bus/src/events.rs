//! # Events
//!
//! Immutable snapshots flowing through the bus. Every event is addressed by an
//! [`EventKey`] and carries a [`ParamSet`]. An event whose id is
//! [`EventId::invalid`] marks a key for which no real value exists.

use crate::params::{Key, ParamError, ParamSet, ParamType, Parameter};
use crate::BusError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Separator between prefix and name in the string form of a key.
pub const KEY_SEPARATOR: char = '.';

/// Address of an event stream: `<prefix>.<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    prefix: String,
    name: String,
}

impl EventKey {
    /// Create a key from its parts. Neither part may be empty.
    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Result<Self, BusError> {
        let prefix = prefix.into();
        let name = name.into();
        if prefix.is_empty() || name.is_empty() {
            return Err(BusError::InvalidEventKey {
                key: format!("{prefix}{KEY_SEPARATOR}{name}"),
            });
        }
        Ok(Self { prefix, name })
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical string form.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.prefix, KEY_SEPARATOR, self.name)
    }
}

impl FromStr for EventKey {
    type Err = BusError;

    /// Splits at the last separator, so prefixes may themselves contain dots.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, name) = s
            .rsplit_once(KEY_SEPARATOR)
            .ok_or_else(|| BusError::InvalidEventKey { key: s.to_string() })?;
        Self::new(prefix, name).map_err(|_| BusError::InvalidEventKey { key: s.to_string() })
    }
}

/// Unique identity of a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The id carried by invalid events.
    #[must_use]
    pub fn invalid() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// System state, e.g. a motor position.
    System,
    /// Progress of an observation, e.g. a completed detector read.
    Observe,
}

/// An immutable snapshot published under a key.
///
/// Equality is structural: two events are equal only if id, time, key and
/// parameters all match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    kind: EventKind,
    key: EventKey,
    event_time: DateTime<Utc>,
    params: ParamSet,
}

impl Event {
    /// New valid event of `kind` with the given parameters.
    #[must_use]
    pub fn new(kind: EventKind, key: EventKey, params: ParamSet) -> Self {
        Self {
            id: EventId::new(),
            kind,
            key,
            event_time: Utc::now(),
            params,
        }
    }

    #[must_use]
    pub fn system(key: EventKey, params: ParamSet) -> Self {
        Self::new(EventKind::System, key, params)
    }

    #[must_use]
    pub fn observe(key: EventKey, params: ParamSet) -> Self {
        Self::new(EventKind::Observe, key, params)
    }

    /// Placeholder for a key with no real value.
    #[must_use]
    pub fn invalid(key: EventKey) -> Self {
        Self {
            id: EventId::invalid(),
            kind: EventKind::System,
            key,
            event_time: DateTime::<Utc>::default(),
            params: ParamSet::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> EventId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[must_use]
    pub fn key(&self) -> &EventKey {
        &self.key
    }

    #[must_use]
    pub fn event_time(&self) -> DateTime<Utc> {
        self.event_time
    }

    #[must_use]
    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.id.is_invalid()
    }

    /// Successor event with `param` merged in.
    ///
    /// The successor gets a fresh id and event time; a parameter of the same
    /// name is overwritten.
    #[must_use]
    pub fn add<T: ParamType>(&self, param: Parameter<T>) -> Self {
        Self {
            id: EventId::new(),
            kind: self.kind,
            key: self.key.clone(),
            event_time: Utc::now(),
            params: self.params.clone().add(param),
        }
    }

    /// Extract the parameter named by `key`.
    pub fn param<T: ParamType>(&self, key: &Key<T>) -> Result<Parameter<T>, ParamError> {
        self.params.get(key)
    }
}
