//! Variable factory and configuration

use crate::domain::{EventVariable, ParamVariable};
use crate::error::VariableResult;
use crate::ports::outbound::EventService;
use event_bus::{EventKey, Key, ParamType};
use std::env;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the default poll interval in milliseconds.
pub const POLL_INTERVAL_ENV: &str = "EV_POLL_INTERVAL_MS";

/// Event variable configuration
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariableConfig {
    /// Poll interval for variables created without an explicit one.
    /// `None` means push subscriptions.
    pub default_poll_interval: Option<Duration>,
}

impl VariableConfig {
    /// Push subscriptions by default.
    #[must_use]
    pub fn push() -> Self {
        Self::default()
    }

    /// Polling at `interval` by default.
    #[must_use]
    pub fn polling(interval: Duration) -> Self {
        Self {
            default_poll_interval: Some(interval),
        }
    }

    /// Read `EV_POLL_INTERVAL_MS`. Unset, empty, zero or unparseable values
    /// select push subscriptions.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            default_poll_interval: parse_poll_interval(env::var(POLL_INTERVAL_ENV).ok().as_deref()),
        }
    }
}

fn parse_poll_interval(raw: Option<&str>) -> Option<Duration> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

/// Creates event variables over one transport.
///
/// Key strings are parsed as `<prefix>.<name>`.
#[derive(Clone)]
pub struct VariableFactory {
    service: Arc<dyn EventService>,
    config: VariableConfig,
}

impl VariableFactory {
    pub fn new(service: Arc<dyn EventService>, config: VariableConfig) -> Self {
        Self { service, config }
    }

    #[must_use]
    pub fn config(&self) -> &VariableConfig {
        &self.config
    }

    /// Event variable using the configured delivery mode.
    pub async fn event_variable(&self, key: &str) -> VariableResult<EventVariable> {
        let key: EventKey = key.parse()?;
        EventVariable::make(key, Arc::clone(&self.service), self.config.default_poll_interval)
            .await
    }

    /// Event variable polling every `interval`.
    pub async fn polled_event_variable(
        &self,
        key: &str,
        interval: Duration,
    ) -> VariableResult<EventVariable> {
        let key: EventKey = key.parse()?;
        EventVariable::make(key, Arc::clone(&self.service), Some(interval)).await
    }

    /// Read-or-initialize parameter variable.
    pub async fn param_variable<T: ParamType>(
        &self,
        initial: T,
        key: &str,
        param_key: Key<T>,
    ) -> VariableResult<ParamVariable<T>> {
        let key: EventKey = key.parse()?;
        ParamVariable::make(
            initial,
            param_key,
            key,
            Arc::clone(&self.service),
            self.config.default_poll_interval,
        )
        .await
    }

    /// Read-existing parameter variable.
    pub async fn existing_param_variable<T: ParamType>(
        &self,
        key: &str,
        param_key: Key<T>,
    ) -> VariableResult<ParamVariable<T>> {
        let key: EventKey = key.parse()?;
        ParamVariable::existing(
            param_key,
            key,
            Arc::clone(&self.service),
            self.config.default_poll_interval,
        )
        .await
    }
}
