//! Error types for listener operations.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced while binding or running the HTTP listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured host name could not be resolved.
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        /// Host as configured.
        host: String,
        /// Port as configured.
        port: u16,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// Resolution succeeded but produced no addresses.
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty {
        /// Host as configured.
        host: String,
        /// Port as configured.
        port: u16,
    },
    /// The socket could not be bound.
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        /// Address that was tried.
        addr: SocketAddr,
        /// Bind error.
        #[source]
        source: io::Error,
    },
    /// The bound socket did not report its address.
    #[error("failed to read the bound address: {source}")]
    LocalAddr {
        /// Socket error.
        #[source]
        source: io::Error,
    },
    /// The socket could not be switched to non-blocking mode.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Socket error.
        #[source]
        source: io::Error,
    },
    /// The async runtime could not be built.
    #[error("failed to build the HTTP runtime: {source}")]
    Runtime {
        /// Runtime builder error.
        #[source]
        source: io::Error,
    },
    /// The serving thread could not be spawned.
    #[error("failed to spawn the HTTP thread: {source}")]
    Spawn {
        /// Spawn error.
        #[source]
        source: io::Error,
    },
    /// The serving thread panicked.
    #[error("listener thread panicked")]
    ThreadPanic,
}
