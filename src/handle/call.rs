//! Handles to claimed call events.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::rc::Rc;

use crate::engine::{Core, LaunchHandle, LaunchId};
use crate::error::{Error, Result};
use crate::event::{CallFilter, EventId, EventState};
use crate::mock::MockPort;

/// Non-owning reference to a claimed call event.
///
/// Obtained from [`Fixture::wait_for_call`]. The handle inspects the captured
/// arguments non-destructively and injects the call's return value exactly
/// once.
///
/// [`Fixture::wait_for_call`]: crate::Fixture::wait_for_call
#[derive(Clone)]
pub struct MockCallHandle {
    event: EventId,
    core: Rc<RefCell<Core>>,
}

impl MockCallHandle {
    pub(crate) fn new(event: EventId, core: Rc<RefCell<Core>>) -> Self {
        Self { event, core }
    }

    /// The claimed event's identifier.
    #[must_use]
    pub fn event_id(&self) -> EventId {
        self.event
    }

    /// The launch this call originated from.
    #[must_use]
    pub fn launch_id(&self) -> LaunchId {
        self.with_event(|e| e.launch)
    }

    /// Name of the mock that received the call.
    #[must_use]
    pub fn mock_name(&self) -> String {
        self.with_event(|e| e.mock_name.clone())
    }

    /// Name of the intercepted method.
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.with_event(|e| e.method)
    }

    /// Non-destructive check that this is a call of `method` on `mock`.
    #[must_use]
    pub fn is_call(&self, mock: &MockPort, method: &str) -> bool {
        self.with_event(|e| e.mock == mock.id() && e.method == method)
    }

    /// Non-destructive check against an arbitrary filter.
    #[must_use]
    pub fn is_call_matching(&self, filter: &CallFilter) -> bool {
        self.with_event(|e| filter.matches(e))
    }

    /// Whether this call originated from `launch`.
    #[must_use]
    pub fn is_from<T>(&self, launch: &LaunchHandle<T>) -> bool {
        self.launch_id() == launch.id()
    }

    /// Typed access to the n-th captured argument.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for a wrong type and
    /// [`Error::StaleHandle`] for an out-of-range index.
    pub fn arg<T: Any + Clone>(&self, index: usize) -> Result<T> {
        self.with_event(|e| e.args.get::<T>(index))
    }

    /// The `Debug` rendering of the n-th argument, for diagnostics.
    #[must_use]
    pub fn arg_rendered(&self, index: usize) -> Option<String> {
        self.with_event(|e| e.args.rendered(index).map(str::to_string))
    }

    /// Number of captured arguments.
    #[must_use]
    pub fn arg_count(&self) -> usize {
        self.with_event(|e| e.args.len())
    }

    /// Inject the call's return value and release the suspended launch.
    ///
    /// Callable exactly once per event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyReturned`] on a second response and
    /// [`Error::TypeMismatch`] if `value` is not the type the call site
    /// expects.
    pub fn respond<R: Any>(&self, value: R) -> Result<()> {
        let waker = {
            let mut core = self.core.borrow_mut();
            let abandoned = core
                .event(self.event)
                .map(|e| e.launch)
                .and_then(|launch| core.state_of(launch))
                == Some(crate::engine::LaunchState::Abandoned);
            if abandoned {
                return Err(Error::stale(format!(
                    "event {} belongs to an abandoned launch",
                    self.event
                )));
            }
            let Some(event) = core.event_mut(self.event) else {
                return Err(Error::stale(format!("event {} released", self.event)));
            };
            if event.state == EventState::Responded {
                return Err(Error::AlreadyReturned {
                    mock: event.mock_name.clone(),
                    method: event.method.to_string(),
                });
            }
            if event.response_type.0 != TypeId::of::<R>() {
                return Err(Error::type_mismatch(
                    format!("response to {}.{}", event.mock_name, event.method),
                    event.response_type.1,
                    type_name::<R>(),
                ));
            }
            event.state = EventState::Responded;
            event.response = Some(Box::new(value));
            tracing::debug!(event = %event.id, launch = %event.launch, "response injected");
            event.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        Ok(())
    }

    /// Refine this handle with the method's return type.
    #[must_use]
    pub fn typed<R: Any>(self) -> SignatureHandle<R> {
        SignatureHandle {
            inner: self,
            _response: PhantomData,
        }
    }

    fn with_event<T>(&self, f: impl FnOnce(&crate::event::CallEvent) -> T) -> T {
        let core = self.core.borrow();
        let event = core.event(self.event).expect("claimed events are never removed");
        f(event)
    }
}

impl fmt::Debug for MockCallHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockCallHandle")
            .field("event", &self.event)
            .field("call", &self.with_event(crate::event::CallEvent::describe))
            .finish()
    }
}

/// A [`MockCallHandle`] refined with the method's return type.
///
/// Purely a typing convenience: `respond` takes an `R` instead of being
/// checked at runtime against the call site. Runtime rules are identical.
pub struct SignatureHandle<R> {
    inner: MockCallHandle,
    _response: PhantomData<fn(R)>,
}

impl<R: Any> SignatureHandle<R> {
    /// Inject the call's return value; see [`MockCallHandle::respond`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyReturned`] on a second response.
    pub fn respond(&self, value: R) -> Result<()> {
        self.inner.respond(value)
    }
}

impl<R> Clone for SignatureHandle<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _response: PhantomData,
        }
    }
}

impl<R> Deref for SignatureHandle<R> {
    type Target = MockCallHandle;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<R> fmt::Debug for SignatureHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureHandle")
            .field("event", &self.inner.event)
            .finish()
    }
}
