//! # mock-rendezvous
//!
//! > Deterministic rendezvous between a test body and mocked async code
//!
//! **mock-rendezvous** lets a single-threaded test launch async code under
//! test, block until that code reaches a specific mocked dependency call,
//! assert on the call's arguments, inject its return value, and resume - with
//! strict ordering and exactly-once delivery. No sleeps, no polling, no
//! threads.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mock_rendezvous::prelude::*;
//!
//! #[mock_rendezvous::test]
//! fn draws_a_dot(fx: &mut Fixture) -> mock_rendezvous::Result<()> {
//!     let turtle = MockTurtle { port: fx.mock("turtle") };
//!     let port = turtle.port.clone();
//!     fx.watch_calls();
//!
//!     let painter = Painter::new(turtle);
//!     let launch = fx.launch(async move { painter.draw_dot().await });
//!
//!     fx.wait_for_call(CallFilter::on(&port).method("PenDown"))?.respond(())?;
//!     fx.wait_for_call(CallFilter::on(&port).method("PenUp"))?.respond(())?;
//!     fx.wait_for_result_from(&launch)?;
//!     Ok(())
//! }
//! ```
//!
//! ## How it works
//!
//! - 🚀 **Launches** - each call under test runs as an independently
//!   scheduled future on a cooperative, single-threaded scheduler
//! - 🪝 **Interception** - mocks route methods through [`MockPort::call`],
//!   which suspends the launch and publishes a call event
//! - 🎯 **Rendezvous** - `wait_for_call` claims the earliest matching event;
//!   `respond` injects the return value and resumes exactly that launch
//! - 🧾 **Teardown safety** - launches left incomplete are reported as
//!   abandoned, never silently leaked
//!
//! [`MockPort::call`]: mock::MockPort::call

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod error;
pub mod event;
pub mod fixture;
pub mod handle;
pub mod matcher;
pub mod mock;
pub mod trace;

/// Prelude for convenient imports
///
/// ```rust
/// use mock_rendezvous::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{args, assert_that};
    pub use crate::engine::{LaunchHandle, LaunchId, LaunchState};
    pub use crate::error::{Error, Result};
    pub use crate::event::{ArgPredicate, Args, CallFilter};
    pub use crate::fixture::Fixture;
    pub use crate::handle::{EventHandle, MockCallHandle, ResultHandle, SignatureHandle};
    pub use crate::matcher::{anything, eq, gt, gte, lt, lte, not, satisfies, Matcher};
    pub use crate::mock::{Cardinality, MockPort};
}

// Re-exports
pub use error::{Error, Result};
pub use fixture::Fixture;

// Re-export the test macro when the macros feature is enabled
#[cfg(feature = "macros")]
pub use mock_rendezvous_macros::test;
