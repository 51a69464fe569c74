//! Integration tests for the `#[mock_rendezvous::test]` macro.

#![cfg(feature = "macros")]

use std::cell::Cell;
use std::rc::Rc;

use mock_rendezvous::prelude::*;

struct MyStruct;

impl MyStruct {
    fn method1(&self, a: i32) -> i32 {
        a * 3
    }

    fn plus(&self, a: i32) -> i32 {
        a + 100
    }
}

/// Basic launch with the default result wait.
#[mock_rendezvous::test]
fn basic_launch_and_result(fx: &mut Fixture) {
    let instance = MyStruct;
    let launch = fx.launch(async move { instance.method1(24) });

    let result = fx.wait_for_result().unwrap();
    assert!(result.completed());
    assert_eq!(result.value(&launch).unwrap(), 72);
}

/// The body may return `Result` and use `?` on waits.
#[mock_rendezvous::test]
fn result_returning_body(fx: &mut Fixture) -> mock_rendezvous::Result<()> {
    let instance = MyStruct;
    let launch = fx.launch(async move { instance.plus(9) });

    let result = fx.wait_for_result_from(&launch)?;
    assert_eq!(result.value(&launch)?, 109);
    Ok(())
}

/// A void launch is observed through its side effects.
#[mock_rendezvous::test]
fn shared_state_mutation(fx: &mut Fixture) {
    let value = Rc::new(Cell::new(24));
    let inner = Rc::clone(&value);
    let launch = fx.launch(async move { inner.set(inner.get() * 3) });

    fx.wait_for_result_from(&launch).unwrap();
    assert_eq!(value.get(), 72);
}

/// `verify = false` skips the cardinality check at teardown.
#[mock_rendezvous::test(verify = false)]
fn lenient_teardown_skips_cardinalities(fx: &mut Fixture) {
    let port = fx.mock("turtle");
    fx.expect_call(&port, "GetX").times(2).returns(7i32);

    let inner = port.clone();
    let launch = fx.launch(async move {
        let _: i32 = inner.call("GetX", args![]).await;
    });
    fx.wait_for_result_from(&launch).unwrap();
    // One call of two: strict teardown would fail, lenient passes.
}

/// `trace = true` installs the subscriber; the test itself just runs.
#[mock_rendezvous::test(trace = true)]
fn trace_enabled(fx: &mut Fixture) {
    let launch = fx.launch(async { 1 });
    let result = fx.wait_for_result_from(&launch).unwrap();
    assert_eq!(result.value(&launch).unwrap(), 1);
}

/// The generated teardown flags launches the test forgot to drive.
#[mock_rendezvous::test]
#[should_panic(expected = "rendezvous teardown failed")]
fn abandoned_launch_fails_teardown(fx: &mut Fixture) {
    let port = fx.mock("turtle");
    fx.watch_calls();

    let inner = port.clone();
    let _launch = fx.launch(async move {
        inner.call::<()>("PenDown", args![]).await;
    });
    let _call = fx.wait_for_call(CallFilter::any()).unwrap();
    // No respond, no result wait: teardown must flag the abandoned launch.
}
