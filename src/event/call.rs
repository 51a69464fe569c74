//! Call events: the observable record of one intercepted mock invocation.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::Waker;

use crate::engine::LaunchId;
use crate::event::Args;
use crate::mock::MockId;

/// Unique identifier for a published call event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

impl EventId {
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({})", self.0)
    }
}

/// The consumption state of a call event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventState {
    /// Published, not yet claimed by any wait.
    Pending,
    /// Claimed by exactly one wait operation.
    Claimed,
    /// A response was injected; the suspended launch is released.
    Responded,
}

/// One intercepted invocation, created by the interceptor and consumed at
/// most once by a wait operation.
pub(crate) struct CallEvent {
    pub id: EventId,
    /// Position in the fixture-wide publication order, shared with
    /// completion events.
    pub seq: u64,
    pub launch: LaunchId,
    pub mock: MockId,
    pub mock_name: String,
    pub method: &'static str,
    pub args: Args,
    pub state: EventState,
    /// Return type the suspended call site expects.
    pub response_type: (TypeId, &'static str),
    pub response: Option<Box<dyn Any>>,
    pub waker: Option<Waker>,
}

impl CallEvent {
    pub(crate) fn describe(&self) -> String {
        format!("{}.{}({})", self.mock_name, self.method, self.args.render_all())
    }
}
