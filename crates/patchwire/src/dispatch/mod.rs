//! HTTP request dispatch.
//!
//! Requests are served by an axum [`Router`](axum::Router) built from the
//! application. Each request moves through routing, body buffering, decoding,
//! handler execution and response. Two routes never complete: `GET /__live`
//! and `GET /__sse` hold the connection open as server-sent event streams
//! until the client leaves, with a `ping` event on every heartbeat.
//!
//! ## Protocol
//!
//! Actions are invoked with a JSON array of typed fields:
//!
//! ```text
//! POST /counter-increment HTTP/1.1
//! Content-Type: application/json
//!
//! [{"name":"id","type":"string","value":"c1"}]
//! ```
//!
//! The response is the HTML fragment returned by the handler. Patch streams
//! carry events of the form:
//!
//! ```text
//! event: patch
//! data: {"id":"t-1","swap":"outline","html":"<p>ready</p>"}
//! ```

mod errors;
mod handler;
mod request;
mod response;
mod router;

pub use self::errors::DispatchError;
pub(crate) use self::router::router;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
