//! Tests for the HTTP listener.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use rstest::{fixture, rstest};

use super::ListenerError;
use super::listener::HttpListener;

#[fixture]
fn router() -> Router {
    Router::new()
        .route("/", get(|| async { "ready" }))
        .route("/hang", get(std::future::pending::<&'static str>))
}

fn fetch(stream: &mut TcpStream, path: &str) -> String {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("set read timeout");
    write!(
        stream,
        "GET {path} HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n"
    )
    .expect("write request");
    let mut response = String::new();
    stream.read_to_string(&mut response).expect("read response");
    response
}

#[rstest]
fn tcp_listener_serves_the_router(router: Router) {
    let listener = HttpListener::bind("127.0.0.1", 0).expect("bind tcp listener");
    let addr = listener.local_addr();
    assert_ne!(addr.port(), 0, "kernel should assign a port");
    let handle = listener.start(router).expect("start listener");

    for _ in 0..2 {
        let mut client = TcpStream::connect(addr).expect("connect client");
        let response = fetch(&mut client, "/");
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.ends_with("ready"));
    }

    handle.shutdown();
    handle.join().expect("join listener");
}

#[rstest]
fn shutdown_does_not_wait_for_open_requests(router: Router) {
    let listener = HttpListener::bind("127.0.0.1", 0).expect("bind tcp listener");
    let addr = listener.local_addr();
    let handle = listener.start(router).expect("start listener");
    let mut hanging = TcpStream::connect(addr).expect("connect client");
    hanging
        .write_all(b"GET /hang HTTP/1.1\r\nHost: test\r\n\r\n")
        .expect("write request");
    thread::sleep(Duration::from_millis(100));

    let (done, finished) = mpsc::channel();
    thread::spawn(move || {
        handle.shutdown();
        done.send(handle.join().is_ok()).expect("report join");
    });

    assert_eq!(finished.recv_timeout(Duration::from_secs(5)), Ok(true));
}

#[rstest]
fn occupied_ports_fail_to_bind() {
    let existing = TcpListener::bind(("127.0.0.1", 0)).expect("bind existing listener");
    let port = existing.local_addr().expect("existing address").port();

    let error = HttpListener::bind("127.0.0.1", port).expect_err("port in use");
    assert!(matches!(error, ListenerError::BindTcp { .. }));
}

#[rstest]
fn unresolvable_hosts_are_reported() {
    let error = HttpListener::bind("host.invalid", 8080).expect_err("should not resolve");
    assert!(matches!(
        error,
        ListenerError::Resolve { .. } | ListenerError::ResolveEmpty { .. }
    ));
}
