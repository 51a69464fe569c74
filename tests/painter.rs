//! Integration tests: driving a painter through a mocked turtle.
//!
//! These exercise the full rendezvous loop end to end: launches, watches,
//! argument capture, injected return values, standing expectations, and
//! multi-launch interleaving.

use std::rc::Rc;

use mock_rendezvous::prelude::*;

// ============================================================================
// Code under test
// ============================================================================

trait Turtle {
    async fn pen_up(&self);
    async fn pen_down(&self);
    async fn forward(&self, distance: i32);
    async fn turn(&self, degrees: i32);
    async fn go_to(&self, x: i32, y: i32);
    async fn get_x(&self) -> i32;
    async fn get_y(&self) -> i32;
    async fn ink_check(&self);
}

struct MockTurtle {
    port: MockPort,
}

impl Turtle for MockTurtle {
    async fn pen_up(&self) {
        self.port.call("PenUp", args![]).await
    }
    async fn pen_down(&self) {
        self.port.call("PenDown", args![]).await
    }
    async fn forward(&self, distance: i32) {
        self.port.call("Forward", args![distance]).await
    }
    async fn turn(&self, degrees: i32) {
        self.port.call("Turn", args![degrees]).await
    }
    async fn go_to(&self, x: i32, y: i32) {
        self.port.call("GoTo", args![x, y]).await
    }
    async fn get_x(&self) -> i32 {
        self.port.call("GetX", args![]).await
    }
    async fn get_y(&self) -> i32 {
        self.port.call("GetY", args![]).await
    }
    async fn ink_check(&self) {
        self.port.call("InkCheck", args![]).await
    }
}

struct Painter<T: Turtle> {
    turtle: T,
}

impl<T: Turtle> Painter<T> {
    fn new(turtle: T) -> Self {
        Self { turtle }
    }

    async fn empty_method(&self) {}

    async fn draw_dot(&self) {
        self.turtle.pen_down().await;
        self.turtle.pen_up().await;
    }

    async fn draw_square(&self, size: i32) {
        self.turtle.pen_down().await;
        for _ in 0..4 {
            self.turtle.forward(size).await;
            self.turtle.turn(90).await;
        }
        self.turtle.pen_up().await;
    }

    async fn draw_square_ink_checks(&self, size: i32) {
        self.turtle.pen_down().await;
        for i in 0..4 {
            self.turtle.forward(size).await;
            self.turtle.turn(90).await;
            if i % 2 == 0 {
                self.turtle.ink_check().await;
            }
        }
        self.turtle.pen_up().await;
    }

    async fn check_position(&self) {
        if self.turtle.get_x().await < -100
            || self.turtle.get_x().await > 100
            || self.turtle.get_y().await < -100
            || self.turtle.get_y().await > 100
        {
            self.turtle.go_to(0, 0).await;
        }
    }

    async fn go_to_top_left(&self) {
        self.turtle.go_to(-1, 1).await;
    }

    async fn go_to_point_on_circle(&self, radius: i32, angle: f32) {
        #[allow(clippy::cast_possible_truncation)]
        let x = (radius as f32 * angle.sin()).round() as i32;
        #[allow(clippy::cast_possible_truncation)]
        let y = (radius as f32 * angle.cos()).round() as i32;
        self.turtle.go_to(x, y).await;
    }
}

fn painter(fx: &Fixture, name: &str) -> (Painter<MockTurtle>, MockPort) {
    let port = fx.mock(name);
    (Painter::new(MockTurtle { port: port.clone() }), port)
}

// ============================================================================
// Scenarios
// ============================================================================

#[mock_rendezvous::test]
fn go_to_point_top_left(fx: &mut Fixture) -> mock_rendezvous::Result<()> {
    let (painter, port) = painter(fx, "turtle");
    fx.watch_calls();

    let launch = fx.launch(async move { painter.go_to_top_left().await });

    let call = fx.wait_for_call(CallFilter::any())?;
    assert!(call.is_call(&port, "GoTo"));
    assert!(call.is_call_matching(
        &CallFilter::on(&port)
            .method("GoTo")
            .matching("x < y", |args| {
                match (args.get_ref::<i32>(0), args.get_ref::<i32>(1)) {
                    (Some(x), Some(y)) => x < y,
                    _ => false,
                }
            })
    ));
    call.respond(())?;
    fx.wait_for_result_from(&launch)?;
    Ok(())
}

#[mock_rendezvous::test]
fn go_to_watched_by_argument_shape(fx: &mut Fixture) -> mock_rendezvous::Result<()> {
    let (painter, port) = painter(fx, "turtle");
    fx.watch_method_where(
        &port,
        "GoTo",
        ArgPredicate::matching("x < y", |args| {
            match (args.get_ref::<i32>(0), args.get_ref::<i32>(1)) {
                (Some(x), Some(y)) => x < y,
                _ => false,
            }
        }),
    );

    let launch = fx.launch(async move { painter.go_to_top_left().await });

    fx.wait_for_call(CallFilter::any())?.respond(())?;
    fx.wait_for_result_from(&launch)?;
    // Expectation verification is an explicit step, not a wait side effect.
    fx.verify()?;
    Ok(())
}

#[mock_rendezvous::test]
fn dot(fx: &mut Fixture) -> mock_rendezvous::Result<()> {
    let (painter, port) = painter(fx, "turtle");
    fx.watch_calls();

    let _launch = fx.launch(async move { painter.draw_dot().await });

    let call: SignatureHandle<()> = fx
        .wait_for_call(CallFilter::on(&port).method("PenDown"))?
        .typed();
    call.respond(())?;
    fx.wait_for_call(CallFilter::on(&port).method("PenUp"))?
        .respond(())?;
    fx.wait_for_result()?;
    Ok(())
}

#[mock_rendezvous::test]
fn check_position(fx: &mut Fixture) -> mock_rendezvous::Result<()> {
    let port = fx.mock("turtle");
    let painter = Rc::new(Painter::new(MockTurtle { port: port.clone() }));
    fx.watch_calls();

    // Far out of range: one position read short-circuits into a correction.
    let out_of_range = Rc::clone(&painter);
    let launch = fx.launch(async move { out_of_range.check_position().await });
    fx.wait_for_call(CallFilter::on(&port).method("GetX"))?
        .typed::<i32>()
        .respond(-200)?;
    fx.wait_for_call(
        CallFilter::on(&port)
            .method("GoTo")
            .where_arg(0, eq(0))
            .where_arg(1, eq(0)),
    )?
    .respond(())?;
    fx.wait_for_result_from(&launch)?;

    // In range: all four reads happen, no correction.
    let in_range = Rc::clone(&painter);
    let launch = fx.launch(async move { in_range.check_position().await });
    fx.wait_for_call(CallFilter::on(&port).method("GetX"))?
        .respond(20i32)?;
    fx.wait_for_call(CallFilter::on(&port).method("GetX"))?
        .respond(20i32)?;
    fx.wait_for_call(CallFilter::on(&port).method("GetY"))?
        .respond(10i32)?;
    fx.wait_for_call(CallFilter::on(&port).method("GetY"))?
        .respond(10i32)?;
    fx.wait_for_result_from(&launch)?;
    Ok(())
}

#[mock_rendezvous::test]
fn square(fx: &mut Fixture) -> mock_rendezvous::Result<()> {
    let (painter, port) = painter(fx, "turtle");
    fx.watch_calls();

    let launch = fx.launch(async move { painter.draw_square(5).await });

    fx.wait_for_call(CallFilter::on(&port).method("PenDown"))?
        .respond(())?;
    for _ in 0..4 {
        fx.wait_for_call(CallFilter::on(&port).method("Forward").where_arg(0, eq(5)))?
            .respond(())?;
        fx.wait_for_call(CallFilter::on(&port).method("Turn").where_arg(0, eq(90)))?
            .respond(())?;
    }
    fx.wait_for_call(CallFilter::on(&port).method("PenUp"))?
        .respond(())?;
    fx.wait_for_result_from(&launch)?;
    Ok(())
}

#[mock_rendezvous::test]
fn square_flexible_case(fx: &mut Fixture) -> mock_rendezvous::Result<()> {
    let (painter, port) = painter(fx, "turtle");
    fx.watch_calls();

    let launch = fx.launch(async move { painter.draw_square(5).await });

    fx.wait_for_call(CallFilter::on(&port).method("PenDown"))?
        .respond(())?;

    // Accept broadly, classify, branch.
    let last = loop {
        let call = fx.wait_for_call(CallFilter::on(&port))?;
        if !call.is_call(&port, "Forward") {
            break call;
        }
        assert_eq!(call.arg::<i32>(0)?, 5);
        call.respond(())?;
        fx.wait_for_call(CallFilter::on(&port).method("Turn").where_arg(0, eq(90)))?
            .respond(())?;
    };

    assert!(last.is_call(&port, "PenUp"));
    last.respond(())?;
    fx.wait_for_result_from(&launch)?;
    Ok(())
}

#[mock_rendezvous::test]
fn square_with_ink_checks(fx: &mut Fixture) -> mock_rendezvous::Result<()> {
    let (painter, port) = painter(fx, "turtle");
    fx.expect_call(&port, "InkCheck").at_least(1).returns(());
    fx.watch_method(&port, "PenDown");
    fx.watch_method(&port, "PenUp");
    fx.watch_method(&port, "Forward");
    fx.watch_method(&port, "Turn");

    let launch = fx.launch(async move { painter.draw_square_ink_checks(5).await });

    // Ink checks are auto-answered; only the drawing calls rendezvous.
    fx.wait_for_call(CallFilter::on(&port).method("PenDown"))?
        .respond(())?;
    for _ in 0..4 {
        fx.wait_for_call(CallFilter::on(&port).method("Forward").where_arg(0, eq(5)))?
            .respond(())?;
        fx.wait_for_call(CallFilter::on(&port).method("Turn").where_arg(0, eq(90)))?
            .respond(())?;
    }
    fx.wait_for_call(CallFilter::on(&port).method("PenUp"))?
        .respond(())?;
    fx.wait_for_result_from(&launch)?;
    fx.verify()?;
    Ok(())
}

#[mock_rendezvous::test]
fn point_on_circle_exposes_literal_arguments(fx: &mut Fixture) -> mock_rendezvous::Result<()> {
    let (painter, port) = painter(fx, "turtle");
    fx.watch_calls();

    let launch = fx.launch(async move { painter.go_to_point_on_circle(1000, 2.2).await });

    let call = fx.wait_for_call(CallFilter::on(&port).method("GoTo"))?;
    let x = call.arg::<i32>(0)?;
    let y = call.arg::<i32>(1)?;
    let radius_sq = x * x + y * y;
    assert_that!(
        radius_sq,
        satisfies(
            |r: &i32| (*r - 1_000_000).abs() <= 2_000,
            "within rounding tolerance of 1000 squared"
        )
    );
    call.respond(())?;
    fx.wait_for_result_from(&launch)?;
    Ok(())
}

#[mock_rendezvous::test]
fn multi_launch(fx: &mut Fixture) -> mock_rendezvous::Result<()> {
    let port = fx.mock("turtle");
    let painter = Rc::new(Painter::new(MockTurtle { port: port.clone() }));
    fx.watch_calls();

    let dot = Rc::clone(&painter);
    let l1 = fx.launch_named("dot", async move { dot.draw_dot().await });

    let c1 = fx.wait_for_call_from(CallFilter::on(&port).method("PenDown"), &l1)?;

    // While l1 sits suspended mid-call, a second launch runs to completion.
    let empty = Rc::clone(&painter);
    let l2 = fx.launch_named("empty", async move { empty.empty_method().await });
    fx.wait_for_result_from(&l2)?;

    c1.respond(())?;
    fx.wait_for_call(CallFilter::on(&port).method("PenUp"))?
        .respond(())?;
    fx.wait_for_result_from(&l1)?;
    Ok(())
}

#[mock_rendezvous::test]
fn server_style_event_loop(fx: &mut Fixture) -> mock_rendezvous::Result<()> {
    let (painter, port) = painter(fx, "turtle");
    fx.watch_calls();

    let launch = fx.launch(async move { painter.draw_dot().await });

    // Consume whatever comes next until the launch completes.
    let mut calls = Vec::new();
    loop {
        match fx.next_event()? {
            EventHandle::Call(call) => {
                calls.push(call.method());
                call.respond(())?;
            }
            EventHandle::Result(result) => {
                assert!(result.is_result_of(&launch));
                break;
            }
        }
    }
    assert_eq!(calls, ["PenDown", "PenUp"]);
    let _ = port;
    Ok(())
}
