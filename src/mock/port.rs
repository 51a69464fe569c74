//! The call-interception hook a user mock delegates to.
//!
//! A mock object embeds a [`MockPort`] and implements each mocked async
//! method as `self.port.call(method, args![...]).await`. From the callee's
//! perspective the call behaves like a normal mock action returning a real
//! value of the declared type; internally the returned future publishes a
//! call event and cedes control to the scheduler until the test body responds.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use pin_project_lite::pin_project;

use crate::engine::Core;
use crate::event::{Args, EventId};

/// Unique identifier for a mock port instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MockId(u64);

impl MockId {
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

impl fmt::Display for MockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mock({})", self.0)
    }
}

/// The interception hook embedded in a user mock.
///
/// Created by [`Fixture::mock`]; cloning shares the identity, so a clone kept
/// by the test body names the same mock the production code calls into.
///
/// [`Fixture::mock`]: crate::Fixture::mock
///
/// # Example
///
/// ```rust,ignore
/// struct MockTurtle {
///     port: MockPort,
/// }
///
/// impl Turtle for MockTurtle {
///     async fn go_to(&self, x: i32, y: i32) {
///         self.port.call("GoTo", args![x, y]).await
///     }
///     async fn get_x(&self) -> i32 {
///         self.port.call("GetX", args![]).await
///     }
/// }
/// ```
#[derive(Clone)]
pub struct MockPort {
    id: MockId,
    name: Rc<str>,
    core: Rc<RefCell<Core>>,
}

impl MockPort {
    pub(crate) fn new(name: &str, core: Rc<RefCell<Core>>) -> Self {
        Self {
            id: MockId::new(),
            name: Rc::from(name),
            core,
        }
    }

    /// This port's identity.
    #[must_use]
    pub fn id(&self) -> MockId {
        self.id
    }

    /// The name given to [`Fixture::mock`], used in diagnostics.
    ///
    /// [`Fixture::mock`]: crate::Fixture::mock
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Intercept one invocation of `method` with the captured `args`.
    ///
    /// The returned future resolves to the value the test body responds with
    /// (for watched calls) or to the standing expectation's answer (for
    /// unwatched calls).
    pub fn call<R: 'static>(&self, method: &'static str, args: Args) -> CallFuture<R> {
        CallFuture {
            core: Rc::clone(&self.core),
            mock: self.id,
            mock_name: self.name.to_string(),
            method,
            args: Some(args),
            state: CallState::Start,
            _output: PhantomData,
        }
    }
}

impl fmt::Debug for MockPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPort")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

enum CallState {
    /// Not yet published.
    Start,
    /// Published and suspended; waiting for the test body's response.
    Suspended(EventId),
    /// Unexpected call: recorded as a failure, never resumes.
    Stuck,
}

pin_project! {
    /// Future returned by [`MockPort::call`].
    ///
    /// First poll publishes the call event and suspends the launch; the final
    /// poll resolves with the injected response.
    #[must_use = "mock calls do nothing until awaited"]
    pub struct CallFuture<R> {
        core: Rc<RefCell<Core>>,
        mock: MockId,
        mock_name: String,
        method: &'static str,
        args: Option<Args>,
        state: CallState,
        _output: PhantomData<fn() -> R>,
    }
}

impl<R: 'static> Future for CallFuture<R> {
    type Output = R;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let mut core = this.core.borrow_mut();
        match *this.state {
            CallState::Start => {
                let args = this.args.take().unwrap_or_default();
                if core.is_watched(*this.mock, *this.method, &args) {
                    let Some(launch) = core.current else {
                        panic!(
                            "watched mock method {}.{} called outside a launch; \
                             only launched code can rendezvous with the test body",
                            this.mock_name, this.method
                        );
                    };
                    let id = core.publish(
                        launch,
                        *this.mock,
                        this.mock_name.clone(),
                        *this.method,
                        args,
                        (TypeId::of::<R>(), type_name::<R>()),
                    );
                    core.set_event_waker(id, cx.waker().clone());
                    *this.state = CallState::Suspended(id);
                    Poll::Pending
                } else if let Some(value) =
                    core.answer_expected(*this.mock, this.mock_name, *this.method, &args)
                {
                    drop(core);
                    match value.downcast::<R>() {
                        Ok(value) => Poll::Ready(*value),
                        Err(_) => panic!(
                            "standing expectation for {}.{} produced a value of the wrong type \
                             (call site expects {})",
                            this.mock_name,
                            this.method,
                            type_name::<R>()
                        ),
                    }
                } else {
                    core.record_unexpected(this.mock_name, *this.method, &args);
                    *this.state = CallState::Stuck;
                    Poll::Pending
                }
            }
            CallState::Suspended(id) => match core.take_response(id) {
                Some(value) => {
                    drop(core);
                    match value.downcast::<R>() {
                        Ok(value) => Poll::Ready(*value),
                        // The response type was checked when the test body responded.
                        Err(_) => unreachable!("response type validated at respond time"),
                    }
                }
                None => {
                    core.set_event_waker(id, cx.waker().clone());
                    Poll::Pending
                }
            },
            CallState::Stuck => Poll::Pending,
        }
    }
}
