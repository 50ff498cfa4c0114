//! TCP listener for the HTTP endpoint.
//!
//! The transport module binds the configured address on the calling thread,
//! so bind failures surface synchronously, and then serves an axum
//! [`Router`](axum::Router) on a background thread that owns a tokio runtime.

mod errors;
mod listener;
#[cfg(test)]
mod listener_tests;

pub use self::errors::ListenerError;
pub(crate) use self::listener::{HttpListener, ListenerHandle};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
