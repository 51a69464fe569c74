//! The per-test-case engine context.
//!
//! A [`Fixture`] owns one scheduler, one event channel, and the watch and
//! expectation registries for a single test case. All state dies with the
//! fixture; nothing is registered process-wide.
//!
//! # Example
//!
//! ```rust
//! use mock_rendezvous::prelude::*;
//!
//! let fx = Fixture::new();
//! let port = fx.mock("turtle");
//! fx.watch_calls();
//!
//! let inner = port.clone();
//! let launch = fx.launch(async move {
//!     inner.call::<()>("PenDown", args![]).await;
//!     inner.call::<()>("PenUp", args![]).await;
//! });
//!
//! let call = fx.wait_for_call(CallFilter::on(&port).method("PenDown")).unwrap();
//! call.respond(()).unwrap();
//! fx.wait_for_call(CallFilter::on(&port).method("PenUp")).unwrap().respond(()).unwrap();
//!
//! let result = fx.wait_for_result_from(&launch).unwrap();
//! assert!(result.completed());
//! fx.finish().unwrap();
//! ```

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use crate::engine::{
    self, Core, LaunchContext, LaunchHandle, LaunchId, LaunchState, NextEvent, Runnable,
};
use crate::error::{Error, Result};
use crate::event::{ArgPredicate, CallFilter, EventState};
use crate::handle::{EventHandle, MockCallHandle, ResultHandle};
use crate::mock::{ExpectCall, MockPort, WatchScope, WatchSpec};

/// The per-test rendezvous engine.
///
/// Create one per test case (the `#[mock_rendezvous::test]` attribute does
/// this for you), launch code under test, and drive it through the wait
/// operations. Call [`finish`] at the end of the test; a fixture dropped
/// without `finish` runs the same teardown checks and panics on failure so
/// abandoned launches are never silently leaked.
///
/// [`finish`]: Fixture::finish
pub struct Fixture {
    core: Rc<RefCell<Core>>,
    finished: bool,
}

impl Fixture {
    /// Create a fresh engine with no launches, watches, or expectations.
    #[must_use]
    pub fn new() -> Self {
        tracing::debug!("fixture created");
        Self {
            core: Rc::new(RefCell::new(Core::new())),
            finished: false,
        }
    }

    // ========================================================================
    // Mock wiring
    // ========================================================================

    /// Create a mock port with the given diagnostic name.
    ///
    /// Embed the port in a user mock; clones share identity.
    #[must_use]
    pub fn mock(&self, name: &str) -> MockPort {
        MockPort::new(name, Rc::clone(&self.core))
    }

    /// Route every call on every mock of this fixture through the rendezvous
    /// path.
    pub fn watch_calls(&self) {
        self.push_watch(WatchScope::AnyMock);
    }

    /// Route every call on one mock through the rendezvous path.
    pub fn watch(&self, mock: &MockPort) {
        self.push_watch(WatchScope::Mock(mock.id()));
    }

    /// Route one method of one mock through the rendezvous path.
    pub fn watch_method(&self, mock: &MockPort, method: &'static str) {
        self.push_watch(WatchScope::Method(mock.id(), method));
    }

    /// Route one method through the rendezvous path only when its arguments
    /// satisfy `predicate`.
    pub fn watch_method_where(
        &self,
        mock: &MockPort,
        method: &'static str,
        predicate: ArgPredicate,
    ) {
        self.push_watch(WatchScope::MethodMatching(mock.id(), method, predicate));
    }

    fn push_watch(&self, scope: WatchScope) {
        self.core.borrow_mut().watches.push(WatchSpec { scope });
    }

    /// Register a standing expectation answering unwatched calls of `method`.
    ///
    /// Finalize with [`ExpectCall::returns`] or [`ExpectCall::returns_with`];
    /// cardinalities are checked by [`verify`] and at teardown.
    ///
    /// [`verify`]: Fixture::verify
    pub fn expect_call(&self, mock: &MockPort, method: &'static str) -> ExpectCall<'_> {
        ExpectCall::new(&self.core, mock, method)
    }

    // ========================================================================
    // Launching
    // ========================================================================

    /// Start `future` as an independently scheduled launch.
    ///
    /// Returns immediately; the launch first runs during a later wait
    /// operation. The future need not be `Send`.
    pub fn launch<T, F>(&self, future: F) -> LaunchHandle<T>
    where
        T: 'static,
        F: Future<Output = T> + 'static,
    {
        self.spawn(None, future)
    }

    /// Like [`launch`], with a name used in diagnostics.
    ///
    /// [`launch`]: Fixture::launch
    pub fn launch_named<T, F>(&self, name: impl Into<String>, future: F) -> LaunchHandle<T>
    where
        T: 'static,
        F: Future<Output = T> + 'static,
    {
        self.spawn(Some(name.into()), future)
    }

    fn spawn<T, F>(&self, name: Option<String>, future: F) -> LaunchHandle<T>
    where
        T: 'static,
        F: Future<Output = T> + 'static,
    {
        let id = LaunchId::new();
        let core = Rc::clone(&self.core);
        let wrapped = async move {
            let output = future.await;
            core.borrow_mut().complete(id, Box::new(output));
        };

        let mut c = self.core.borrow_mut();
        c.launches
            .push(LaunchContext::new(id, name, std::any::type_name::<T>()));
        c.ready.push_back(Runnable {
            id,
            future: Box::pin(wrapped),
        });
        tracing::debug!(launch = %id, "launched");
        LaunchHandle::new(id)
    }

    /// Current state of a launch, if it belongs to this fixture.
    #[must_use]
    pub fn launch_state<T>(&self, launch: &LaunchHandle<T>) -> Option<LaunchState> {
        self.core.borrow().state_of(launch.id())
    }

    // ========================================================================
    // Wait operations
    // ========================================================================

    /// Block until a pending call event satisfies `filter`, claim the
    /// earliest such event, and return its handle.
    ///
    /// # Errors
    ///
    /// [`Error::NoProgress`] if no launch can advance and no satisfying event
    /// exists; a recorded [`Error::UnexpectedCall`] takes precedence.
    pub fn wait_for_call(&self, filter: CallFilter) -> Result<MockCallHandle> {
        loop {
            if let Some(id) = self.core.borrow_mut().claim(&filter) {
                return Ok(MockCallHandle::new(id, Rc::clone(&self.core)));
            }
            if !self.step() {
                return Err(self.stall_error(filter.describe()));
            }
        }
    }

    /// [`wait_for_call`] restricted to events originating from `launch`.
    ///
    /// [`wait_for_call`]: Fixture::wait_for_call
    ///
    /// # Errors
    ///
    /// As [`Fixture::wait_for_call`].
    pub fn wait_for_call_from<T>(
        &self,
        filter: CallFilter,
        launch: &LaunchHandle<T>,
    ) -> Result<MockCallHandle> {
        self.wait_for_call(filter.from_launch(launch))
    }

    /// Block until the most recently created launch whose completion has not
    /// yet been observed completes.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`] if no launch is awaiting a result;
    /// [`Error::NoProgress`] if the launch cannot complete.
    pub fn wait_for_result(&self) -> Result<ResultHandle> {
        let target = self.core.borrow().latest_unobserved();
        let Some(id) = target else {
            return Err(Error::stale("no launch awaiting a result"));
        };
        self.await_completion(id)
    }

    /// Block until `launch` completes.
    ///
    /// # Errors
    ///
    /// As [`Fixture::wait_for_result`].
    pub fn wait_for_result_from<T>(&self, launch: &LaunchHandle<T>) -> Result<ResultHandle> {
        self.await_completion(launch.id())
    }

    /// Block until any watched call or launch completion is available, in
    /// publication order, and consume it.
    ///
    /// # Errors
    ///
    /// [`Error::NoProgress`] if nothing can happen anymore.
    pub fn next_event(&self) -> Result<EventHandle> {
        loop {
            let next = self.core.borrow_mut().take_next_event();
            if let Some(next) = next {
                return Ok(match next {
                    NextEvent::Call(id) => {
                        EventHandle::Call(MockCallHandle::new(id, Rc::clone(&self.core)))
                    }
                    NextEvent::Completion(launch) => {
                        EventHandle::Result(ResultHandle::new(launch, Rc::clone(&self.core)))
                    }
                });
            }
            if !self.step() {
                return Err(self.stall_error("any call or completion".to_string()));
            }
        }
    }

    fn await_completion(&self, id: LaunchId) -> Result<ResultHandle> {
        loop {
            {
                let mut core = self.core.borrow_mut();
                match core.state_of(id) {
                    None => return Err(Error::stale(format!("unknown launch {id}"))),
                    Some(LaunchState::Completed) => {
                        core.mark_observed(id);
                        return Ok(ResultHandle::new(id, Rc::clone(&self.core)));
                    }
                    Some(LaunchState::Abandoned) => {
                        return Err(Error::stale(format!("launch {id} abandoned")));
                    }
                    Some(_) => {}
                }
            }
            if !self.step() {
                return Err(self.stall_error(format!("result of {id}")));
            }
        }
    }

    fn step(&self) -> bool {
        engine::step(&self.core)
    }

    fn stall_error(&self, wanted: String) -> Error {
        let core = self.core.borrow();
        if let Some(failure) = core.failures.first() {
            return failure.clone();
        }
        Error::NoProgress {
            wanted,
            launches: core.launch_report(),
        }
    }

    // ========================================================================
    // Verification and teardown
    // ========================================================================

    /// Check recorded failures and standing-expectation cardinalities now.
    ///
    /// Verification timing is explicit: it happens here and at teardown,
    /// never implicitly during waits.
    ///
    /// # Errors
    ///
    /// The first recorded failure, or [`Error::UnsatisfiedExpectation`].
    pub fn verify(&self) -> Result<()> {
        let core = self.core.borrow();
        if let Some(failure) = core.failures.first() {
            return Err(failure.clone());
        }
        if let Some(expectation) = core.expectations.iter().find(|e| !e.satisfied()) {
            return Err(Error::UnsatisfiedExpectation(expectation.describe()));
        }
        Ok(())
    }

    /// End the test case: verify expectations, report unclaimed call events,
    /// and mark and report incomplete launches as abandoned.
    ///
    /// # Errors
    ///
    /// The first teardown failure, in order: recorded failures, unclaimed
    /// events, abandoned launches, unsatisfied expectations.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.teardown(true)
    }

    /// [`finish`] without the expectation-cardinality check.
    ///
    /// [`finish`]: Fixture::finish
    ///
    /// # Errors
    ///
    /// As [`Fixture::finish`], minus unsatisfied expectations.
    pub fn finish_unverified(mut self) -> Result<()> {
        self.finished = true;
        self.teardown(false)
    }

    fn teardown(&self, verify: bool) -> Result<()> {
        let mut core = self.core.borrow_mut();

        let abandoned: Vec<String> = core
            .launches
            .iter_mut()
            .filter(|l| l.state != LaunchState::Completed)
            .map(|l| {
                l.state = LaunchState::Abandoned;
                l.display_name()
            })
            .collect();
        if !abandoned.is_empty() {
            tracing::error!(launches = %abandoned.join("; "), "abandoned at teardown");
        }

        if let Some(failure) = core.failures.first() {
            return Err(failure.clone());
        }
        if let Some(event) = core.events.iter().find(|e| e.state == EventState::Pending) {
            return Err(Error::UnexpectedCall {
                mock: event.mock_name.clone(),
                method: event.method.to_string(),
                args: format!("{} [never claimed]", event.args.render_all()),
            });
        }
        if !abandoned.is_empty() {
            return Err(Error::AbandonedLaunch(abandoned.join("; ")));
        }
        if verify {
            if let Some(expectation) = core.expectations.iter().find(|e| !e.satisfied()) {
                return Err(Error::UnsatisfiedExpectation(expectation.describe()));
            }
        }
        Ok(())
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("Fixture")
            .field("launches", &core.launches.len())
            .field("events", &core.events.len())
            .field("watches", &core.watches.len())
            .finish_non_exhaustive()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        if self.finished || std::thread::panicking() {
            return;
        }
        if let Err(error) = self.teardown(true) {
            panic!("rendezvous fixture dropped with failures: {error}");
        }
    }
}
