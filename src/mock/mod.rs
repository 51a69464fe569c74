//! Mock-side surface of the engine
//!
//! User mocks embed a [`MockPort`] and route every mocked method through
//! [`MockPort::call`]. Watch registrations decide which calls rendezvous with
//! the test body; standing expectations auto-answer the rest.

mod expectation;
mod port;
mod watch;

pub use expectation::{Cardinality, ExpectCall};
pub use port::{CallFuture, MockId, MockPort};

pub(crate) use expectation::Expectation;
pub(crate) use watch::{WatchScope, WatchSpec};
