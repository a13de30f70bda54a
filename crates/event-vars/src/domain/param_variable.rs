//! Param variable - one typed parameter of an event variable

use crate::domain::binding::{BindingToken, Observer};
use crate::domain::variable::EventVariable;
use crate::error::{VariableError, VariableResult};
use crate::ports::outbound::EventService;
use event_bus::{Event, EventKey, Key, ParamType, Parameter};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Reads and writes one named parameter of the latest event of a key.
///
/// # Read-after-write
///
/// [`set_param`](Self::set_param) publishes a successor event but does not
/// touch the cached event. Until the transport delivers the published event
/// back (push) or the next poll observes it, [`get_param`](Self::get_param)
/// and [`first`](Self::first) still return the previous values.
///
/// Writers of different parameters of the same key must not overlap: each
/// write merges into the cached event and would silently revert a
/// concurrent write to another parameter that has not been delivered yet.
pub struct ParamVariable<T: ParamType> {
    variable: EventVariable,
    param_key: Key<T>,
}

impl<T: ParamType> ParamVariable<T> {
    /// Read-or-initialize.
    ///
    /// Fetches the current event of `event_key`, merges `initial` into it
    /// under `param_key` (overwriting any existing value), publishes the
    /// merged event and starts from it.
    ///
    /// A key that was never published is fetched as the invalid placeholder;
    /// the merge turns it into a fresh valid event, so the first writer
    /// creates the key.
    ///
    /// # Errors
    ///
    /// `NotFound` if the transport returns nothing for the key; transport
    /// failures from the fetch or the publish.
    pub async fn make(
        initial: T,
        param_key: Key<T>,
        event_key: EventKey,
        service: Arc<dyn EventService>,
        poll_interval: Option<Duration>,
    ) -> VariableResult<Self> {
        let Some(available) = service.get_event(&event_key).await? else {
            return Err(VariableError::NotFound {
                key: event_key.key(),
            });
        };
        let initial_event = available.add(param_key.set([initial]));
        service.publish_event(initial_event.clone()).await?;

        debug!(
            key = %event_key,
            param = param_key.name(),
            "Initialized parameter"
        );

        let variable = EventVariable::from_initial(initial_event, service, poll_interval)?;
        Ok(Self {
            variable,
            param_key,
        })
    }

    /// Read-existing.
    ///
    /// # Errors
    ///
    /// `NotFound` if no event exists for the key, `FieldMissing` or
    /// `TypeMismatch` if its latest event does not carry the parameter.
    pub async fn existing(
        param_key: Key<T>,
        event_key: EventKey,
        service: Arc<dyn EventService>,
        poll_interval: Option<Duration>,
    ) -> VariableResult<Self> {
        let variable = EventVariable::make(event_key, service, poll_interval).await?;
        let this = Self {
            variable,
            param_key,
        };
        this.get_param()?;
        Ok(this)
    }

    /// The parameter as held by the latest event.
    pub fn get_param(&self) -> VariableResult<Parameter<T>> {
        self.variable
            .latest_event()
            .param(&self.param_key)
            .map_err(|e| VariableError::from_param(self.variable.key(), e))
    }

    /// First value of the parameter.
    pub fn first(&self) -> VariableResult<T> {
        let param = self.get_param()?;
        param
            .first()
            .cloned()
            .ok_or_else(|| VariableError::NoValues {
                key: self.variable.key().key(),
                param: self.param_key.name().to_string(),
            })
    }

    /// Publish the latest event with the parameter replaced by `values`.
    ///
    /// The cached event is not updated here; see the type-level docs.
    pub async fn set_param<I>(&self, values: I) -> VariableResult<()>
    where
        I: IntoIterator<Item = T> + Send,
    {
        let event: Event = self.variable.latest_event().add(self.param_key.set(values));
        self.variable.service().publish_event(event).await
    }

    /// Attach `observer`; see [`EventVariable::bind`].
    pub async fn bind(&self, observer: Arc<dyn Observer>) -> VariableResult<BindingToken> {
        self.variable.bind(observer).await
    }

    #[must_use]
    pub fn latest_event(&self) -> Event {
        self.variable.latest_event()
    }

    #[must_use]
    pub fn key(&self) -> &EventKey {
        self.variable.key()
    }

    #[must_use]
    pub fn param_key(&self) -> &Key<T> {
        &self.param_key
    }

    /// The underlying event variable.
    #[must_use]
    pub fn variable(&self) -> &EventVariable {
        &self.variable
    }
}
