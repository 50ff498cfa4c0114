//! Scenario world for the bootstrap lifecycle.

use std::cell::RefCell;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::bootstrap::{BootstrapError, ConfigLoader, Server, ServerHandle, bootstrap_with};

use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::reporter::RecordingHealthReporter;

/// Loader, reporter and whatever the bootstrap produced.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    pub reporter: Arc<RecordingHealthReporter>,
    server: Option<Server>,
    handle: Option<ServerHandle>,
    error: Option<BootstrapError>,
}

impl TestWorld {
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: Box::new(TestConfigLoader::new()),
            reporter: Arc::new(RecordingHealthReporter::default()),
            server: None,
            handle: None,
            error: None,
        }
    }

    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
    }

    pub fn use_successful_loader(&mut self) {
        self.loader = Box::new(TestConfigLoader::new());
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.server.is_some() || self.error.is_some() {
            return;
        }
        match bootstrap_with(&*self.loader, self.reporter.clone(), |settings| settings) {
            Ok(server) => self.server = Some(server),
            Err(error) => self.error = Some(error),
        }
    }

    /// Registers a page on the bootstrapped application.
    pub fn register_page(&mut self, path: &str, body: &'static str) {
        let server = self.server.as_ref().expect("server bootstrapped");
        server
            .app()
            .page(path, move |_ctx| Ok(body.to_owned()))
            .expect("register page");
    }

    /// Starts serving the bootstrapped application.
    pub fn serve(&mut self) {
        let Some(server) = self.server.take() else {
            return;
        };
        match server.serve() {
            Ok(handle) => self.handle = Some(handle),
            Err(error) => self.error = Some(error),
        }
    }

    /// Stops the listener and waits for it.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.shutdown();
            handle.join().expect("listener join");
        }
    }

    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn bootstrapped(&self) -> bool {
        self.server.is_some() || self.handle.is_some()
    }

    #[must_use]
    pub fn address(&self) -> Option<SocketAddr> {
        self.handle.as_ref().map(ServerHandle::local_addr)
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestWorld {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.shutdown();
            if handle.join().is_err() {
                tracing::warn!("listener thread panicked during teardown");
            }
        }
    }
}

/// Default test world fixture.
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
