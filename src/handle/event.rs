//! The supertype handle for server-style waiting.

use crate::handle::{MockCallHandle, ResultHandle};

/// Either a claimed call event or an observed completion, returned by
/// [`Fixture::next_event`] when a wait is not yet known to be one or the
/// other.
///
/// [`Fixture::next_event`]: crate::Fixture::next_event
#[derive(Clone, Debug)]
pub enum EventHandle {
    /// A watched mock call, claimed by this wait.
    Call(MockCallHandle),
    /// A launch completion, observed by this wait.
    Result(ResultHandle),
}

impl EventHandle {
    /// Whether this event is a mock call.
    #[must_use]
    pub fn is_call(&self) -> bool {
        matches!(self, EventHandle::Call(_))
    }

    /// Whether this event is a launch completion.
    #[must_use]
    pub fn is_result(&self) -> bool {
        matches!(self, EventHandle::Result(_))
    }

    /// Borrow the call handle, if this is a call event.
    #[must_use]
    pub fn as_call(&self) -> Option<&MockCallHandle> {
        match self {
            EventHandle::Call(call) => Some(call),
            EventHandle::Result(_) => None,
        }
    }

    /// Borrow the result handle, if this is a completion event.
    #[must_use]
    pub fn as_result(&self) -> Option<&ResultHandle> {
        match self {
            EventHandle::Result(result) => Some(result),
            EventHandle::Call(_) => None,
        }
    }

    /// Consume into the call handle, if this is a call event.
    #[must_use]
    pub fn into_call(self) -> Option<MockCallHandle> {
        match self {
            EventHandle::Call(call) => Some(call),
            EventHandle::Result(_) => None,
        }
    }

    /// Consume into the result handle, if this is a completion event.
    #[must_use]
    pub fn into_result(self) -> Option<ResultHandle> {
        match self {
            EventHandle::Result(result) => Some(result),
            EventHandle::Call(_) => None,
        }
    }
}
