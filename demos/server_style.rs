//! Example: server-style event loop
//!
//! Instead of scripting each wait, consume whatever event comes next - call
//! or completion - and branch on its kind. Useful when the code under test
//! decides the order.

use mock_rendezvous::prelude::*;

fn main() {
    println!("🤝 mock-rendezvous - Server-style waiting\n");

    let fx = Fixture::new();
    let port = fx.mock("device");
    fx.watch_calls();

    let inner = port.clone();
    let launch = fx.launch_named("session", async move {
        inner.call::<()>("Open", args![]).await;
        let budget: i32 = inner.call("Budget", args![]).await;
        for chunk in 0..budget {
            inner.call::<()>("Write", args![chunk]).await;
        }
        inner.call::<()>("Close", args![]).await;
        budget
    });

    let mut seen = Vec::new();
    loop {
        match fx.next_event().expect("the session can always progress") {
            EventHandle::Call(call) => {
                println!("   -> {}.{}({})", call.mock_name(), call.method(), {
                    call.arg_rendered(0).unwrap_or_default()
                });
                seen.push(call.method());
                if call.method() == "Budget" {
                    call.typed::<i32>().respond(3).expect("budget response");
                } else {
                    call.respond(()).expect("void response");
                }
            }
            EventHandle::Result(result) => {
                let value = result.value(&launch).expect("session result");
                println!("   session finished with budget {value}");
                break;
            }
        }
    }

    assert_eq!(seen, ["Open", "Budget", "Write", "Write", "Write", "Close"]);
    fx.finish().expect("clean teardown");
    println!("\n✅ Server-style loop complete!");
}
