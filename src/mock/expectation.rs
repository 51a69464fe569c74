//! Standing expectations: the auto-answer path for unwatched calls.
//!
//! An expectation answers matching calls immediately, without suspending the
//! launch, and carries a cardinality that is checked at [`Fixture::verify`]
//! and at teardown. This keeps expectation verification an explicit,
//! well-defined step rather than an implicit side effect of waiting.
//!
//! [`Fixture::verify`]: crate::Fixture::verify

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::Core;
use crate::event::{ArgPredicate, Args};
use crate::matcher::Matcher;
use crate::mock::{MockId, MockPort};

/// How many calls a standing expectation allows and requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    /// Any number of calls, including zero.
    AnyNumber,
    /// Exactly `n` calls.
    Times(usize),
    /// At least `n` calls.
    AtLeast(usize),
}

/// A registered standing expectation.
pub(crate) struct Expectation {
    pub mock: MockId,
    pub mock_name: String,
    pub method: &'static str,
    pub predicates: Vec<ArgPredicate>,
    pub cardinality: Cardinality,
    pub calls: usize,
    pub produce: Box<dyn Fn() -> Box<dyn Any>>,
}

impl Expectation {
    pub(crate) fn matches(&self, mock: MockId, method: &str, args: &Args) -> bool {
        self.mock == mock && self.method == method && self.predicates.iter().all(|p| p.eval(args))
    }

    /// More calls arrived than an exact cardinality allows.
    pub(crate) fn saturated(&self) -> bool {
        matches!(self.cardinality, Cardinality::Times(n) if self.calls > n)
    }

    /// The cardinality is met.
    pub(crate) fn satisfied(&self) -> bool {
        match self.cardinality {
            Cardinality::AnyNumber => true,
            Cardinality::Times(n) => self.calls == n,
            Cardinality::AtLeast(n) => self.calls >= n,
        }
    }

    pub(crate) fn describe(&self) -> String {
        let cardinality = match self.cardinality {
            Cardinality::AnyNumber => "any number of times".to_string(),
            Cardinality::Times(n) => format!("exactly {n} times"),
            Cardinality::AtLeast(n) => format!("at least {n} times"),
        };
        format!(
            "{}.{} expected {}, called {} times",
            self.mock_name, self.method, cardinality, self.calls
        )
    }
}

/// Builder for a standing expectation, created by [`Fixture::expect_call`].
///
/// The expectation is registered by the terminal [`returns`] /
/// [`returns_with`] call.
///
/// [`Fixture::expect_call`]: crate::Fixture::expect_call
/// [`returns`]: ExpectCall::returns
/// [`returns_with`]: ExpectCall::returns_with
///
/// # Example
///
/// ```rust,ignore
/// fx.expect_call(&port, "InkCheck").returns(());
/// fx.expect_call(&port, "GetX").times(2).returns(7);
/// ```
#[must_use = "an expectation is only registered by returns()/returns_with()"]
pub struct ExpectCall<'a> {
    core: &'a Rc<RefCell<Core>>,
    mock: MockId,
    mock_name: String,
    method: &'static str,
    predicates: Vec<ArgPredicate>,
    cardinality: Cardinality,
}

impl<'a> ExpectCall<'a> {
    pub(crate) fn new(core: &'a Rc<RefCell<Core>>, mock: &MockPort, method: &'static str) -> Self {
        Self {
            core,
            mock: mock.id(),
            mock_name: mock.name().to_string(),
            method,
            predicates: Vec::new(),
            cardinality: Cardinality::AnyNumber,
        }
    }

    /// Only answer calls whose `index`-th argument satisfies `matcher`.
    pub fn where_arg<T, M>(mut self, index: usize, matcher: M) -> Self
    where
        T: std::any::Any,
        M: Matcher<T> + 'static,
    {
        self.predicates.push(ArgPredicate::arg(index, matcher));
        self
    }

    /// Require exactly `n` calls.
    pub fn times(mut self, n: usize) -> Self {
        self.cardinality = Cardinality::Times(n);
        self
    }

    /// Require at least `n` calls.
    pub fn at_least(mut self, n: usize) -> Self {
        self.cardinality = Cardinality::AtLeast(n);
        self
    }

    /// Register the expectation, answering each call with a clone of `value`.
    pub fn returns<R: Any + Clone>(self, value: R) {
        self.register(Box::new(move || Box::new(value.clone())));
    }

    /// Register the expectation, answering each call with `produce()`.
    pub fn returns_with<R: Any, F: Fn() -> R + 'static>(self, produce: F) {
        self.register(Box::new(move || Box::new(produce())));
    }

    fn register(self, produce: Box<dyn Fn() -> Box<dyn Any>>) {
        let expectation = Expectation {
            mock: self.mock,
            mock_name: self.mock_name,
            method: self.method,
            predicates: self.predicates,
            cardinality: self.cardinality,
            calls: 0,
            produce,
        };
        tracing::debug!(expectation = %expectation.describe(), "expectation registered");
        self.core.borrow_mut().expectations.push(expectation);
    }
}
