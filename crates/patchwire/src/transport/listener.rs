//! Listener implementation for the HTTP endpoint.

use std::future::IntoFuture;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use axum::Router;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::Notify;
use tracing::{info, warn};

use super::{LISTENER_TARGET, ListenerError};

/// Time in-flight handlers get to finish once the listener stops.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Listener bound to a TCP address.
#[derive(Debug)]
pub(crate) struct HttpListener {
    addr: SocketAddr,
    listener: TcpListener,
}

impl HttpListener {
    pub(crate) fn bind(host: &str, port: u16) -> Result<Self, ListenerError> {
        let listener = bind_tcp(host, port)?;
        let addr = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddr { source })?;
        Ok(Self { addr, listener })
    }

    /// Address actually bound, with the kernel-assigned port when `0` was
    /// requested.
    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves `router` on a background thread until the handle shuts it
    /// down.
    pub(crate) fn start(self, router: Router) -> Result<ListenerHandle, ListenerError> {
        self.listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;
        let runtime = Builder::new_multi_thread()
            .thread_name("patchwire-conn")
            .enable_all()
            .build()
            .map_err(|source| ListenerError::Runtime { source })?;

        let shutdown = Arc::new(Notify::new());
        let signal = Arc::clone(&shutdown);
        let addr = self.addr;
        let handle = thread::Builder::new()
            .name("patchwire-http".to_owned())
            .spawn(move || run_server(runtime, self, router, &signal))
            .map_err(|source| ListenerError::Spawn { source })?;
        Ok(ListenerHandle {
            addr,
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to the background listener thread.
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    addr: SocketAddr,
    shutdown: Arc<Notify>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stops accepting connections and tears down open streams.
    pub(crate) fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.notify_one();
    }
}

fn run_server(runtime: Runtime, listener: HttpListener, router: Router, shutdown: &Notify) {
    let addr = listener.addr;
    runtime.block_on(async move {
        let tcp = match tokio::net::TcpListener::from_std(listener.listener) {
            Ok(tcp) => tcp,
            Err(error) => {
                warn!(target: LISTENER_TARGET, %addr, %error, "failed to register listener");
                return;
            }
        };
        info!(target: LISTENER_TARGET, %addr, "http listener active");
        let server = axum::serve(tcp, router.into_make_service()).into_future();
        tokio::select! {
            result = server => {
                if let Err(error) = result {
                    warn!(target: LISTENER_TARGET, %addr, %error, "http server failed");
                }
            }
            () = shutdown.notified() => {}
        }
    });
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    info!(target: LISTENER_TARGET, %addr, "http listener stopped");
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_owned(),
        port,
    })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}
