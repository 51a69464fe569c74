//! The cooperative scheduler core.
//!
//! All fixture state lives here: launches and their queues, the event
//! channel, watch and expectation registries, and recorded failures. Exactly
//! one execution runs at any instant; [`step`] polls the oldest ready launch
//! and control returns to the test body between polls. Wakers only touch a
//! small `Send + Sync` wake queue, so the core itself can hold non-`Send`
//! futures.

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};

use parking_lot::Mutex;

use crate::engine::launch::{LaunchContext, LaunchId, LaunchState, Runnable};
use crate::error::Error;
use crate::event::{Args, CallEvent, CallFilter, EventId, EventState};
use crate::mock::{Expectation, MockId, WatchSpec};

/// Queue of launches woken since the last scheduler step, in wake order.
///
/// This is the only state wakers touch; it must be `Send + Sync` because
/// `std::task::Waker` is.
pub(crate) type WakeQueue = Arc<Mutex<Vec<LaunchId>>>;

/// A recorded launch completion, ordered against call events by `seq`.
pub(crate) struct Completion {
    pub seq: u64,
    pub launch: LaunchId,
}

/// The earliest unconsumed event of either kind, for server-style waits.
pub(crate) enum NextEvent {
    Call(EventId),
    Completion(LaunchId),
}

pub(crate) struct Core {
    pub launches: Vec<LaunchContext>,
    pub ready: VecDeque<Runnable>,
    pub waiting: Vec<Runnable>,
    pub wakes: WakeQueue,
    pub events: Vec<CallEvent>,
    pub completions: Vec<Completion>,
    pub watches: Vec<WatchSpec>,
    pub expectations: Vec<Expectation>,
    pub failures: Vec<Error>,
    /// The launch currently being polled, read by the interceptor to tag
    /// published events.
    pub current: Option<LaunchId>,
    next_seq: u64,
}

impl Core {
    pub fn new() -> Self {
        Self {
            launches: Vec::new(),
            ready: VecDeque::new(),
            waiting: Vec::new(),
            wakes: Arc::new(Mutex::new(Vec::new())),
            events: Vec::new(),
            completions: Vec::new(),
            watches: Vec::new(),
            expectations: Vec::new(),
            failures: Vec::new(),
            current: None,
            next_seq: 0,
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    // ========================================================================
    // Launch bookkeeping
    // ========================================================================

    pub fn context(&self, id: LaunchId) -> Option<&LaunchContext> {
        self.launches.iter().find(|l| l.id == id)
    }

    pub fn context_mut(&mut self, id: LaunchId) -> Option<&mut LaunchContext> {
        self.launches.iter_mut().find(|l| l.id == id)
    }

    pub fn state_of(&self, id: LaunchId) -> Option<LaunchState> {
        self.context(id).map(|l| l.state)
    }

    pub fn set_state(&mut self, id: LaunchId, state: LaunchState) {
        if let Some(ctx) = self.context_mut(id) {
            ctx.state = state;
        }
    }

    /// Record a launch's completion; called by the launch wrapper while the
    /// launch is being polled.
    pub fn complete(&mut self, id: LaunchId, result: Box<dyn Any>) {
        let seq = self.bump_seq();
        if let Some(ctx) = self.context_mut(id) {
            ctx.state = LaunchState::Completed;
            ctx.result = Some(result);
        }
        self.completions.push(Completion { seq, launch: id });
        tracing::debug!(launch = %id, "launch completed");
    }

    /// The most recently created launch whose completion has not yet been
    /// observed by a result wait.
    pub fn latest_unobserved(&self) -> Option<LaunchId> {
        self.launches
            .iter()
            .rev()
            .find(|l| !l.observed && l.state != LaunchState::Abandoned)
            .map(|l| l.id)
    }

    pub fn mark_observed(&mut self, id: LaunchId) {
        if let Some(ctx) = self.context_mut(id) {
            ctx.observed = true;
        }
    }

    pub fn launch_report(&self) -> String {
        if self.launches.is_empty() {
            return "none".to_string();
        }
        let parts: Vec<_> = self
            .launches
            .iter()
            .map(|l| format!("{} [{}]", l.display_name(), l.state))
            .collect();
        parts.join("; ")
    }

    // ========================================================================
    // Event channel
    // ========================================================================

    pub fn publish(
        &mut self,
        launch: LaunchId,
        mock: MockId,
        mock_name: String,
        method: &'static str,
        args: Args,
        response_type: (std::any::TypeId, &'static str),
    ) -> EventId {
        let id = EventId::new();
        let seq = self.bump_seq();
        let event = CallEvent {
            id,
            seq,
            launch,
            mock,
            mock_name,
            method,
            args,
            state: EventState::Pending,
            response_type,
            response: None,
            waker: None,
        };
        tracing::debug!(event = %id, launch = %launch, call = %event.describe(), "call intercepted");
        self.events.push(event);
        id
    }

    pub fn event(&self, id: EventId) -> Option<&CallEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn event_mut(&mut self, id: EventId) -> Option<&mut CallEvent> {
        self.events.iter_mut().find(|e| e.id == id)
    }

    pub fn set_event_waker(&mut self, id: EventId, waker: Waker) {
        if let Some(ev) = self.event_mut(id) {
            ev.waker = Some(waker);
        }
    }

    /// Take the injected response of a responded event, if present.
    pub fn take_response(&mut self, id: EventId) -> Option<Box<dyn Any>> {
        let ev = self.event_mut(id)?;
        if ev.state == EventState::Responded {
            ev.response.take()
        } else {
            None
        }
    }

    /// Claim the earliest pending event satisfying `filter`.
    ///
    /// Events are stored in publication order, so the first match is the
    /// FIFO tie-break winner.
    pub fn claim(&mut self, filter: &CallFilter) -> Option<EventId> {
        let ev = self
            .events
            .iter_mut()
            .find(|e| e.state == EventState::Pending && filter.matches(e))?;
        ev.state = EventState::Claimed;
        tracing::debug!(event = %ev.id, call = %ev.describe(), "event claimed");
        Some(ev.id)
    }

    /// Consume the earliest unconsumed event of either kind: a pending call
    /// event is claimed, a completion is marked observed.
    pub fn take_next_event(&mut self) -> Option<NextEvent> {
        let call = self
            .events
            .iter()
            .find(|e| e.state == EventState::Pending)
            .map(|e| (e.seq, e.id));
        let completion = self
            .completions
            .iter()
            .find(|c| self.context(c.launch).is_some_and(|l| !l.observed))
            .map(|c| (c.seq, c.launch));

        match (call, completion) {
            (None, None) => None,
            (Some((_, id)), None) => {
                self.claim_by_id(id);
                Some(NextEvent::Call(id))
            }
            (None, Some((_, launch))) => {
                self.mark_observed(launch);
                Some(NextEvent::Completion(launch))
            }
            (Some((call_seq, id)), Some((completion_seq, launch))) => {
                if call_seq < completion_seq {
                    self.claim_by_id(id);
                    Some(NextEvent::Call(id))
                } else {
                    self.mark_observed(launch);
                    Some(NextEvent::Completion(launch))
                }
            }
        }
    }

    fn claim_by_id(&mut self, id: EventId) {
        if let Some(ev) = self.event_mut(id) {
            ev.state = EventState::Claimed;
        }
    }

    // ========================================================================
    // Watch and expectation registries
    // ========================================================================

    pub fn is_watched(&self, mock: MockId, method: &str, args: &Args) -> bool {
        self.watches.iter().any(|w| w.covers(mock, method, args))
    }

    /// Answer an unwatched call from a standing expectation, if one matches.
    ///
    /// Records the call against the expectation; a saturated `Times`
    /// cardinality is reported as an unexpected call but still answered so
    /// the launch can keep running.
    pub fn answer_expected(
        &mut self,
        mock: MockId,
        mock_name: &str,
        method: &'static str,
        args: &Args,
    ) -> Option<Box<dyn Any>> {
        let index = self
            .expectations
            .iter()
            .position(|e| e.matches(mock, method, args))?;
        let value = {
            let exp = &mut self.expectations[index];
            exp.calls += 1;
            (exp.produce)()
        };
        if self.expectations[index].saturated() {
            let failure = Error::UnexpectedCall {
                mock: mock_name.to_string(),
                method: method.to_string(),
                args: format!("{} [expectation saturated]", args.render_all()),
            };
            tracing::error!(%failure, "saturated expectation");
            self.failures.push(failure);
        } else {
            tracing::trace!(mock = mock_name, method, "call auto-answered by expectation");
        }
        Some(value)
    }

    pub fn record_unexpected(&mut self, mock_name: &str, method: &str, args: &Args) {
        let failure = Error::UnexpectedCall {
            mock: mock_name.to_string(),
            method: method.to_string(),
            args: args.render_all(),
        };
        tracing::error!(%failure, "unexpected call");
        self.failures.push(failure);
    }

    // ========================================================================
    // Wake handling
    // ========================================================================

    /// Move woken launches from the waiting list to the ready queue, in wake
    /// order. Wakes for launches that are neither waiting nor currently being
    /// polled are stale and dropped.
    pub fn drain_wakes(&mut self) {
        let woken: Vec<LaunchId> = std::mem::take(&mut *self.wakes.lock());
        for id in woken {
            if let Some(pos) = self.waiting.iter().position(|t| t.id == id) {
                let task = self.waiting.remove(pos);
                self.ready.push_back(task);
            }
        }
    }
}

/// Waker for one launch: records the wake and leaves requeueing to the
/// scheduler.
struct LaunchWaker {
    id: LaunchId,
    wakes: WakeQueue,
}

impl Wake for LaunchWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.wakes.lock().push(self.id);
    }
}

/// Poll one ready launch. Returns `true` if a launch was polled.
///
/// The core borrow is released around the poll so the interceptor (running
/// inside the launch) can access it.
pub(crate) fn step(core: &Rc<RefCell<Core>>) -> bool {
    let (mut task, wakes) = {
        let mut c = core.borrow_mut();
        c.drain_wakes();
        let Some(task) = c.ready.pop_front() else {
            return false;
        };
        c.current = Some(task.id);
        c.set_state(task.id, LaunchState::Running);
        (task, Arc::clone(&c.wakes))
    };

    let waker = Waker::from(Arc::new(LaunchWaker { id: task.id, wakes }));
    let mut cx = Context::from_waker(&waker);
    let poll = task.future.as_mut().poll(&mut cx);

    let mut c = core.borrow_mut();
    c.current = None;
    match poll {
        Poll::Ready(()) => {
            // The launch wrapper recorded the completion during the poll;
            // the future is dropped here.
        }
        Poll::Pending => {
            if c.state_of(task.id) == Some(LaunchState::Running) {
                c.set_state(task.id, LaunchState::SuspendedAtCall);
            }
            let self_woken = {
                let mut wakes = c.wakes.lock();
                match wakes.iter().position(|id| *id == task.id) {
                    Some(pos) => {
                        wakes.remove(pos);
                        true
                    }
                    None => false,
                }
            };
            if self_woken {
                c.ready.push_back(task);
            } else {
                c.waiting.push(task);
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(core: &Rc<RefCell<Core>>, future: impl std::future::Future<Output = ()> + 'static) -> LaunchId {
        let id = LaunchId::new();
        let mut c = core.borrow_mut();
        c.launches.push(LaunchContext::new(id, None, "()"));
        c.ready.push_back(Runnable {
            id,
            future: Box::pin(future),
        });
        id
    }

    #[test]
    fn test_step_empty_core() {
        let core = Rc::new(RefCell::new(Core::new()));
        assert!(!step(&core));
    }

    #[test]
    fn test_completion_recorded() {
        let core = Rc::new(RefCell::new(Core::new()));
        let id = LaunchId::new();
        {
            let mut c = core.borrow_mut();
            c.launches.push(LaunchContext::new(id, None, "i32"));
            let inner = Rc::clone(&core);
            c.ready.push_back(Runnable {
                id,
                future: Box::pin(async move {
                    inner.borrow_mut().complete(id, Box::new(7i32));
                }),
            });
        }

        assert!(step(&core));
        let c = core.borrow();
        assert_eq!(c.state_of(id), Some(LaunchState::Completed));
        assert_eq!(c.completions.len(), 1);
        assert!(c.ready.is_empty());
        assert!(c.waiting.is_empty());
    }

    #[test]
    fn test_pending_launch_moves_to_waiting() {
        let core = Rc::new(RefCell::new(Core::new()));
        let id = spawn(&core, std::future::pending::<()>());

        assert!(step(&core));
        let c = core.borrow();
        assert_eq!(c.state_of(id), Some(LaunchState::SuspendedAtCall));
        assert_eq!(c.waiting.len(), 1);
        assert!(c.ready.is_empty());
    }

    #[test]
    fn test_self_woken_launch_requeues() {
        struct YieldOnce {
            yielded: bool,
        }
        impl std::future::Future for YieldOnce {
            type Output = ();
            fn poll(
                mut self: std::pin::Pin<&mut Self>,
                cx: &mut Context<'_>,
            ) -> Poll<Self::Output> {
                if self.yielded {
                    Poll::Ready(())
                } else {
                    self.yielded = true;
                    cx.waker().wake_by_ref();
                    Poll::Pending
                }
            }
        }

        let core = Rc::new(RefCell::new(Core::new()));
        let id = spawn(&core, YieldOnce { yielded: false });

        assert!(step(&core));
        {
            let c = core.borrow();
            assert_eq!(c.ready.len(), 1, "self-woken launch must requeue");
            assert!(c.waiting.is_empty());
        }
        assert!(step(&core));
        let _ = id;
    }

    #[test]
    fn test_drain_wakes_moves_waiting_to_ready() {
        let core = Rc::new(RefCell::new(Core::new()));
        let id = spawn(&core, std::future::pending::<()>());
        assert!(step(&core));

        {
            let c = core.borrow();
            c.wakes.lock().push(id);
        }
        let mut c = core.borrow_mut();
        c.drain_wakes();
        assert_eq!(c.ready.len(), 1);
        assert!(c.waiting.is_empty());
    }

    #[test]
    fn test_stale_wakes_dropped() {
        let core = Rc::new(RefCell::new(Core::new()));
        {
            let c = core.borrow();
            c.wakes.lock().push(LaunchId::new());
        }
        let mut c = core.borrow_mut();
        c.drain_wakes();
        assert!(c.ready.is_empty());
        assert!(c.wakes.lock().is_empty());
    }

    #[test]
    fn test_launch_report() {
        let core = Rc::new(RefCell::new(Core::new()));
        assert_eq!(core.borrow().launch_report(), "none");

        let id = spawn(&core, std::future::pending::<()>());
        assert!(step(&core));
        let report = core.borrow().launch_report();
        assert!(report.contains(&id.to_string()));
        assert!(report.contains("SuspendedAtCall"));
    }

    #[test]
    fn test_latest_unobserved_prefers_newest() {
        let mut c = Core::new();
        let first = LaunchId::new();
        let second = LaunchId::new();
        c.launches.push(LaunchContext::new(first, None, "()"));
        c.launches.push(LaunchContext::new(second, None, "()"));

        assert_eq!(c.latest_unobserved(), Some(second));
        c.mark_observed(second);
        assert_eq!(c.latest_unobserved(), Some(first));
        c.mark_observed(first);
        assert_eq!(c.latest_unobserved(), None);
    }
}
