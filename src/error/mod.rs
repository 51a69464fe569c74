//! Error definitions
//!
//! This module provides error types for mock-rendezvous. Fatal misuse of the
//! engine (deadlocks, double responses, stale handles) and assertion-style
//! mismatches (wrong launch, unsatisfied expectations) share one enum so test
//! bodies can propagate everything with `?`.

use thiserror::Error;

/// Main error type for mock-rendezvous
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A wait cannot be satisfied and no launch can make progress.
    #[error("no progress possible while waiting for {wanted}; live launches: {launches}")]
    NoProgress {
        /// Description of what the wait was looking for.
        wanted: String,
        /// States of all live launches at the time of the stall.
        launches: String,
    },

    /// A call matched neither a watch nor a standing expectation.
    #[error("unexpected call: {mock}.{method}({args})")]
    UnexpectedCall {
        /// Name of the mock that received the call.
        mock: String,
        /// Method that was invoked.
        method: String,
        /// Rendered argument list.
        args: String,
    },

    /// A second response was attempted on an already-responded call event.
    #[error("call {mock}.{method} already returned")]
    AlreadyReturned {
        /// Name of the mock the event belongs to.
        mock: String,
        /// Method of the event.
        method: String,
    },

    /// A handle referenced a launch, event, or result that is gone.
    #[error("stale handle: {0}")]
    StaleHandle(String),

    /// A result handle was applied to a launch it does not correspond to.
    #[error("result handle for launch {actual} applied to launch {requested}")]
    WrongLaunch {
        /// Launch the result handle belongs to.
        actual: String,
        /// Launch the caller asked about.
        requested: String,
    },

    /// A typed accessor disagreed with the captured value's type.
    #[error("type mismatch for {what}: stored {stored}, requested {requested}")]
    TypeMismatch {
        /// What was being accessed (argument, response, result).
        what: String,
        /// Type name of the stored value.
        stored: String,
        /// Type name the caller requested.
        requested: String,
    },

    /// Launches were still incomplete when the test case ended.
    #[error("abandoned launches at teardown: {0}")]
    AbandonedLaunch(String),

    /// A standing expectation's cardinality was not met.
    #[error("unsatisfied expectation: {0}")]
    UnsatisfiedExpectation(String),
}

impl Error {
    /// Create a stale-handle error.
    #[must_use]
    pub fn stale(message: impl Into<String>) -> Self {
        Self::StaleHandle(message.into())
    }

    pub(crate) fn type_mismatch(
        what: impl Into<String>,
        stored: &'static str,
        requested: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            what: what.into(),
            stored: stored.to_string(),
            requested: requested.to_string(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
