//! Behavioural tests for the server bootstrap sequence.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use super::support::{self, HealthEvent, TestWorld, body_of, get};

const PAGE_BODY: &str = "<main>hello</main>";

#[fixture]
fn world() -> RefCell<TestWorld> {
    support::world()
}

#[given("a healthy configuration loader")]
fn given_healthy_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_successful_loader();
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_failing_loader();
}

#[when("the server bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<TestWorld>) {
    world.borrow_mut().bootstrap();
}

#[when("a page at {path} is registered")]
fn when_page_registered(world: &RefCell<TestWorld>, path: String) {
    world.borrow_mut().register_page(&path, PAGE_BODY);
}

#[when("the server starts serving")]
fn when_server_serves(world: &RefCell<TestWorld>) {
    world.borrow_mut().serve();
}

#[when("the server stops")]
fn when_server_stops(world: &RefCell<TestWorld>) {
    world.borrow_mut().stop();
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(
        world.bootstrap_error().is_none(),
        "bootstrap error: {:?}",
        world.bootstrap_error()
    );
    assert!(world.bootstrapped(), "server should have been created");
}

#[then("bootstrap fails")]
fn then_bootstrap_fails(world: &RefCell<TestWorld>) {
    assert!(
        world.borrow().bootstrap_error().is_some(),
        "bootstrap succeeded unexpectedly"
    );
}

#[then("requesting {path} returns the page")]
fn then_page_served(world: &RefCell<TestWorld>, path: String) {
    let addr = world.borrow().address().expect("server listening");
    let response = get(addr, &path);
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(body_of(&response).contains(PAGE_BODY));
}

#[then("the reporter recorded bootstrap start")]
fn then_reporter_start(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    assert!(
        events.contains(&HealthEvent::BootstrapStarting),
        "bootstrap start event missing: {events:?}"
    );
}

#[then("the reporter recorded bootstrap success")]
fn then_reporter_success(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    assert!(
        events.contains(&HealthEvent::BootstrapSucceeded),
        "bootstrap success event missing: {events:?}"
    );
}

#[then("the reporter recorded bootstrap failure")]
fn then_reporter_failure(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    let failed = events
        .iter()
        .any(|event| matches!(event, HealthEvent::BootstrapFailed(_)));
    assert!(failed, "bootstrap failure event missing: {events:?}");
}

#[then("the reporter recorded the listener start")]
fn then_reporter_listener_start(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let addr = world.address().expect("server listening");
    assert!(
        world
            .reporter
            .events()
            .contains(&HealthEvent::ListenerStarted(addr))
    );
}

#[then("the reporter recorded the listener stop")]
fn then_reporter_listener_stop(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    let stopped = events
        .iter()
        .any(|event| matches!(event, HealthEvent::ListenerStopped(_)));
    assert!(stopped, "listener stop event missing: {events:?}");
}

#[scenario(path = "tests/features/server_bootstrap.feature")]
fn server_bootstrap(world: RefCell<TestWorld>) {
    let _ = world;
}
