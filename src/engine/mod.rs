//! Cooperative launch scheduling
//!
//! Each launch is an independently resumable future owned by the fixture's
//! scheduler. Exactly one execution runs at any instant; control passes only
//! at mock-call interceptions and wait operations, never preemptively, so
//! launch-local invariants need no synchronization.

mod core;
mod launch;

pub use launch::{LaunchHandle, LaunchId, LaunchState};

pub(crate) use self::core::{step, Core, NextEvent};
pub(crate) use launch::{LaunchContext, Runnable};
