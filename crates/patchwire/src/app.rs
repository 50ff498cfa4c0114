//! Application state shared by the dispatch loop, contexts and deferred jobs.

use std::io;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use patchwire_config::Config;

use crate::action::{
    ActionEntry, ActionTable, Callable, Handler, HandlerResult, Method, RegistrationError,
};
use crate::client;
use crate::context::Context;
use crate::deferred::{DeferredExecutor, DeferredJob, JobOutcome};
use crate::patch::{PatchChannel, PatchMessage, Subscription};

/// Page-level and protocol settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    /// Document title used for every page.
    pub title: String,
    /// Extra markup appended to each page head.
    pub head: String,
    /// Whether pages watch `/__live` and reload after a restart.
    pub live_reload: bool,
    /// Interval between heartbeat events on open streams.
    pub heartbeat: Duration,
    /// Largest request body that is buffered.
    pub max_body_bytes: usize,
    /// Time allowed for the request head and body to arrive.
    pub body_timeout: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl AppSettings {
    /// Derives settings from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: env!("CARGO_PKG_NAME").to_owned(),
            head: String::new(),
            live_reload: config.live_reload(),
            heartbeat: config.heartbeat_interval(),
            max_body_bytes: config.max_body_bytes(),
            body_timeout: config.body_timeout(),
        }
    }

    /// Replaces the document title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Replaces the extra head markup.
    #[must_use]
    pub fn with_head(mut self, head: impl Into<String>) -> Self {
        self.head = head.into();
        self
    }
}

#[derive(Debug)]
struct AppState {
    table: RwLock<ActionTable>,
    channel: PatchChannel,
    executor: DeferredExecutor,
    settings: AppSettings,
}

/// A running application: its routes, patch channel and deferred executor.
///
/// Cloning is cheap and every clone refers to the same state. Separate
/// `App::new` calls produce fully independent instances.
#[derive(Debug, Clone)]
pub struct App {
    state: Arc<AppState>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Creates an application with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(AppSettings::default())
    }

    /// Creates an application with explicit settings.
    #[must_use]
    pub fn with_settings(settings: AppSettings) -> Self {
        Self {
            state: Arc::new(AppState {
                table: RwLock::new(ActionTable::new()),
                channel: PatchChannel::new(),
                executor: DeferredExecutor::new(),
                settings,
            }),
        }
    }

    /// Settings the application was created with.
    #[must_use]
    pub fn settings(&self) -> &AppSettings {
        &self.state.settings
    }

    /// Registers a GET page.
    ///
    /// # Errors
    ///
    /// Fails for empty, reserved or duplicate paths.
    pub fn page<F>(&self, path: &str, handler: F) -> Result<String, RegistrationError>
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        self.write_table().register_page(path, handler)
    }

    /// Registers a POST action under an explicit path.
    ///
    /// # Errors
    ///
    /// Fails for empty or reserved paths.
    pub fn action<F>(&self, path: &str, handler: F) -> Result<String, RegistrationError>
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        self.write_table().register_action(path, handler)
    }

    /// Registers `callable` if needed and returns its action path.
    ///
    /// # Errors
    ///
    /// Fails when the callable's name does not yield a usable path.
    pub fn callable(&self, callable: &Callable) -> Result<String, RegistrationError> {
        if let Some(path) = self.path_of(callable) {
            return Ok(path);
        }
        self.write_table().derive_callable(callable)
    }

    /// Path `callable` is registered under, if any.
    #[must_use]
    pub fn path_of(&self, callable: &Callable) -> Option<String> {
        self.read_table().path_of(callable)
    }

    /// Looks up the route for a request.
    #[must_use]
    pub fn resolve(&self, method: Method, path: &str) -> Option<ActionEntry> {
        self.read_table().resolve(method, path)
    }

    /// Patch channel shared by every stream of this application.
    #[must_use]
    pub fn channel(&self) -> &PatchChannel {
        &self.state.channel
    }

    /// Opens a new patch subscription.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.state.channel.subscribe()
    }

    /// Broadcasts a patch, returning the number of streams reached.
    pub fn publish(&self, message: PatchMessage) -> usize {
        self.state.channel.publish(message)
    }

    /// Runs `job` on its own thread.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the worker thread cannot be spawned.
    pub fn schedule(&self, job: DeferredJob) -> io::Result<JoinHandle<JobOutcome>> {
        self.state.executor.schedule(self, job)
    }

    /// Number of deferred jobs that have not finished yet.
    #[must_use]
    pub fn deferred_in_flight(&self) -> usize {
        self.state.executor.in_flight()
    }

    /// Wraps `body` into a complete page using this application's settings.
    #[must_use]
    pub fn document(&self, body: &str) -> String {
        let settings = &self.state.settings;
        client::document(&settings.title, &settings.head, body, settings.live_reload)
    }

    fn read_table(&self) -> std::sync::RwLockReadGuard<'_, ActionTable> {
        self.state
            .table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_table(&self) -> std::sync::RwLockWriteGuard<'_, ActionTable> {
        self.state
            .table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
