//! Launch types: independently scheduled executions of a future.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LaunchId(u64);

impl LaunchId {
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

impl fmt::Display for LaunchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Launch({})", self.0)
    }
}

/// The current state of a launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchState {
    /// Ready to run or currently being polled.
    Running,
    /// Suspended at an intercepted mock call, waiting for a response.
    SuspendedAtCall,
    /// Ran to completion; the result is stored.
    Completed,
    /// Never completed before the test case ended.
    Abandoned,
}

impl fmt::Display for LaunchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchState::Running => write!(f, "Running"),
            LaunchState::SuspendedAtCall => write!(f, "SuspendedAtCall"),
            LaunchState::Completed => write!(f, "Completed"),
            LaunchState::Abandoned => write!(f, "Abandoned"),
        }
    }
}

/// Bookkeeping for one launch, owned by the scheduler.
pub(crate) struct LaunchContext {
    pub id: LaunchId,
    pub name: Option<String>,
    pub state: LaunchState,
    pub result: Option<Box<dyn Any>>,
    pub result_type: &'static str,
    /// Whether a result wait has consumed the completion.
    pub observed: bool,
}

impl LaunchContext {
    pub(crate) fn new(id: LaunchId, name: Option<String>, result_type: &'static str) -> Self {
        Self {
            id,
            name,
            state: LaunchState::Running,
            result: None,
            result_type,
            observed: false,
        }
    }

    pub(crate) fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{} '{}'", self.id, name),
            None => self.id.to_string(),
        }
    }
}

/// Type-erased boxed future; launches need not be `Send`.
pub(crate) type LocalBoxFuture = Pin<Box<dyn Future<Output = ()>>>;

/// A launch's future paired with its identity, movable between the
/// scheduler's queues.
pub(crate) struct Runnable {
    pub id: LaunchId,
    pub future: LocalBoxFuture,
}

/// Non-owning reference to a launch, valid for the remainder of the test case.
///
/// The type parameter records the launch's result type; applying a
/// [`ResultHandle`] to the handle yields a `T`.
///
/// [`ResultHandle`]: crate::handle::ResultHandle
pub struct LaunchHandle<T> {
    id: LaunchId,
    _result: PhantomData<fn() -> T>,
}

impl<T> LaunchHandle<T> {
    pub(crate) fn new(id: LaunchId) -> Self {
        Self {
            id,
            _result: PhantomData,
        }
    }

    /// The launch's unique identifier.
    #[must_use]
    pub fn id(&self) -> LaunchId {
        self.id
    }
}

impl<T> Clone for LaunchHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for LaunchHandle<T> {}

impl<T> fmt::Debug for LaunchHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchHandle").field("id", &self.id).finish()
    }
}
