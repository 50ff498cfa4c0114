//! Server bootstrap: configuration, logging and the HTTP listener.

use std::net::SocketAddr;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use patchwire_config::Config;

use crate::app::{App, AppSettings};
use crate::dispatch;
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{HttpListener, ListenerError, ListenerHandle};

/// Source of server configuration, replaceable in tests.
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that layers defaults, file, environment and command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that hands out a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Loader that always returns `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced while bringing the server up.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// The log sink could not be installed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The HTTP listener could not be started.
    #[error("failed to start HTTP listener: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
}

/// A configured server whose routes can still be registered.
pub struct Server {
    config: Config,
    app: App,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Server {
    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Application that requests are dispatched to.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Handle to the installed log sink.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Binds the configured address and starts accepting connections.
    ///
    /// # Errors
    ///
    /// Fails when the address cannot be resolved or bound, or the runtime or
    /// listener thread cannot be started.
    pub fn serve(self) -> Result<ServerHandle, BootstrapError> {
        let started = HttpListener::bind(self.config.host(), self.config.port())
            .and_then(|listener| listener.start(dispatch::router(self.app.clone())));
        match started {
            Ok(listener) => {
                self.reporter.listener_started(listener.local_addr());
                Ok(ServerHandle {
                    listener,
                    app: self.app,
                    reporter: self.reporter,
                })
            }
            Err(source) => {
                let error = BootstrapError::Listener { source };
                self.reporter.bootstrap_failed(&error);
                Err(error)
            }
        }
    }
}

/// Running server.
///
/// Dropping the handle asks the listener to stop. Open requests get a short
/// grace period and event streams are closed.
pub struct ServerHandle {
    listener: ListenerHandle,
    app: App,
    reporter: Arc<dyn HealthReporter>,
}

impl ServerHandle {
    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Application the server dispatches to.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Stops accepting new connections and closes open streams.
    pub fn shutdown(&self) {
        self.listener.shutdown();
    }

    /// Waits for the listener thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] when the listener thread panicked.
    pub fn join(self) -> Result<(), ListenerError> {
        let addr = self.listener.local_addr();
        let result = self.listener.join();
        self.reporter.listener_stopped(addr);
        result
    }
}

/// Loads configuration, installs logging and creates the application.
///
/// `settings` adjusts the page settings derived from configuration before the
/// application is created.
///
/// # Errors
///
/// Fails when configuration cannot be loaded or logging cannot be installed.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    settings: impl FnOnce(AppSettings) -> AppSettings,
) -> Result<Server, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let app = App::with_settings(settings(AppSettings::from_config(&config)));
    reporter.bootstrap_succeeded(&config);

    Ok(Server {
        config,
        app,
        telemetry,
        reporter,
    })
}
