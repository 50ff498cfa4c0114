//! Lifecycle events for the server.

use std::net::SocketAddr;
use std::sync::Arc;

use patchwire_config::Config;

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer notified as the server starts, serves and stops.
pub trait HealthReporter: Send + Sync {
    /// Called before configuration is loaded.
    fn bootstrap_starting(&self);

    /// Called once configuration and logging are ready.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Called when bootstrap gives up.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Called once the HTTP listener accepts connections.
    fn listener_started(&self, addr: SocketAddr);

    /// Called after the listener thread has exited.
    fn listener_stopped(&self, addr: SocketAddr);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_started(&self, addr: SocketAddr) {
        (**self).listener_started(addr);
    }

    fn listener_stopped(&self, addr: SocketAddr) {
        (**self).listener_stopped(addr);
    }
}

/// Reporter that writes each event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Creates the reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            listen = %config.listen_address(),
            live_reload = config.live_reload(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "server bootstrap failed"
        );
    }

    fn listener_started(&self, addr: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_started",
            %addr,
            "serving on http://{addr}"
        );
    }

    fn listener_stopped(&self, addr: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_stopped",
            %addr,
            "server stopped"
        );
    }
}
