//! Call events, argument snapshots, and wait filters
//!
//! Every intercepted mock invocation becomes a call event: an immutable
//! argument snapshot plus a consumption state (`Pending` → `Claimed` →
//! `Responded`). Events and launch completions share one fixture-wide
//! publication order, and wait operations select events through a
//! [`CallFilter`].

mod args;
mod call;
mod filter;

pub use args::Args;
pub use call::{EventId, EventState};
pub use filter::{ArgPredicate, CallFilter};

pub(crate) use call::CallEvent;
