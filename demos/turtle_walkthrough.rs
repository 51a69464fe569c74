//! Example: rendezvous basics
//!
//! Launches a painter, intercepts its turtle calls one by one, injects return
//! values, and collects the final result - all deterministically on one
//! thread.

use mock_rendezvous::prelude::*;

trait Turtle {
    async fn pen_down(&self);
    async fn pen_up(&self);
    async fn get_x(&self) -> i32;
}

struct MockTurtle {
    port: MockPort,
}

impl Turtle for MockTurtle {
    async fn pen_down(&self) {
        self.port.call("PenDown", args![]).await
    }
    async fn pen_up(&self) {
        self.port.call("PenUp", args![]).await
    }
    async fn get_x(&self) -> i32 {
        self.port.call("GetX", args![]).await
    }
}

struct Painter<T: Turtle> {
    turtle: T,
}

impl<T: Turtle> Painter<T> {
    async fn draw_dot(&self) {
        self.turtle.pen_down().await;
        self.turtle.pen_up().await;
    }

    async fn report_x(&self) -> i32 {
        self.turtle.get_x().await * 2
    }
}

fn main() {
    println!("🤝 mock-rendezvous - Driving mocked calls step by step\n");

    example_dot();
    example_injected_value();

    println!("\n✅ Walkthrough complete!");
}

/// Intercept two void calls in order.
fn example_dot() {
    println!("📌 Example 1: Ordered interception");

    let fx = Fixture::new();
    let port = fx.mock("turtle");
    fx.watch_calls();

    let painter = Painter {
        turtle: MockTurtle { port: port.clone() },
    };
    let launch = fx.launch(async move { painter.draw_dot().await });
    println!("   Launched draw_dot; nothing has run yet");

    let call = fx
        .wait_for_call(CallFilter::on(&port).method("PenDown"))
        .expect("PenDown should arrive first");
    println!("   Intercepted {}.{}", call.mock_name(), call.method());
    call.respond(()).expect("first response");

    let call = fx
        .wait_for_call(CallFilter::on(&port).method("PenUp"))
        .expect("PenUp should arrive second");
    println!("   Intercepted {}.{}", call.mock_name(), call.method());
    call.respond(()).expect("second response");

    let result = fx.wait_for_result_from(&launch).expect("launch completes");
    println!("   Launch completed: {}\n", result.completed());
    fx.finish().expect("clean teardown");
}

/// Inject a return value and observe it round-trip through the launch.
fn example_injected_value() {
    println!("📌 Example 2: Injecting a return value");

    let fx = Fixture::new();
    let port = fx.mock("turtle");
    fx.watch_calls();

    let painter = Painter {
        turtle: MockTurtle { port: port.clone() },
    };
    let launch = fx.launch(async move { painter.report_x().await });

    let call = fx
        .wait_for_call(CallFilter::on(&port).method("GetX"))
        .expect("GetX should arrive");
    println!("   Responding 21 to {}.{}", call.mock_name(), call.method());
    call.typed::<i32>().respond(21).expect("typed response");

    let result = fx.wait_for_result_from(&launch).expect("launch completes");
    let value = result.value(&launch).expect("typed result");
    println!("   Launch returned {value} (21 * 2)\n");
    assert_eq!(value, 42);
    fx.finish().expect("clean teardown");
}
