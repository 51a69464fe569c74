//! Test tracing bootstrap.
//!
//! The engine emits `tracing` events for every launch, interception, claim,
//! and response. Call [`init`] (or pass `trace = true` to
//! `#[mock_rendezvous::test]`) to see them interleaved with test output.

use tracing_subscriber::fmt;

/// Install a subscriber writing engine events to the test writer.
///
/// Safe to call from every test; only the first call in a process installs
/// the subscriber.
pub fn init() {
    let _ = fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
