//! Observers and the tokens that detach them.

use crate::domain::variable::VariableInner;
use crate::error::VariableResult;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// An entity that reacts to changes of an [`EventVariable`](crate::EventVariable).
///
/// Typically a state machine that re-evaluates its current state on
/// `refresh` and keeps every token it is handed so it can detach later.
///
/// The variable holds its observers weakly; the caller owns them.
#[async_trait]
pub trait Observer: Send + Sync {
    /// Called after the variable accepted a new latest event.
    async fn refresh(&self);

    /// Called once per successful bind with the token for that bind.
    fn register_binding(&self, token: BindingToken);
}

/// Identity of a bound observer: the address of its shared allocation.
pub(crate) type ObserverId = usize;

pub(crate) fn observer_id(observer: &Arc<dyn Observer>) -> ObserverId {
    Arc::as_ptr(observer).cast::<()>() as usize
}

/// Identity of one bind call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(pub(crate) u64);

/// Detach capability returned by `bind`.
///
/// Clones share the same binding. The binding's active/cancelled state lives
/// in the variable, so cancelling more than once is a no-op. A token keeps
/// its variable alive.
#[derive(Clone)]
pub struct BindingToken {
    id: BindingId,
    variable: Arc<VariableInner>,
}

impl BindingToken {
    pub(crate) fn new(id: BindingId, variable: Arc<VariableInner>) -> Self {
        Self { id, variable }
    }

    #[must_use]
    pub fn id(&self) -> BindingId {
        self.id
    }

    /// Detach the observer this token was issued for.
    ///
    /// When the observer is the last one, the underlying subscription or
    /// poll schedule is cancelled before this returns. After it returns the
    /// observer is not refreshed again by this variable.
    pub async fn cancel(&self) -> VariableResult<()> {
        self.variable.unbind(self.id).await
    }

    /// Whether this binding still keeps its observer attached.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.variable.is_binding_active(self.id)
    }
}

impl fmt::Debug for BindingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingToken")
            .field("id", &self.id)
            .field("key", self.variable.key())
            .finish()
    }
}
