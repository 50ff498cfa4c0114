//! Route and action registration.
//!
//! The [`ActionTable`] maps `(method, path)` pairs to handlers. Pages are
//! registered explicitly and reject duplicates. Actions are idempotent:
//! registering a path that is already bound returns the existing binding, so
//! a [`Callable`] can be registered every time it is rendered without any
//! bookkeeping at the call site.

mod errors;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::context::Context;

pub use self::errors::{HandlerError, RegistrationError};

pub(crate) const ACTION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::action");

/// Path of the live-reload event stream.
pub const LIVE_PATH: &str = "/__live";
/// Path of the patch event stream.
pub const PATCH_PATH: &str = "/__sse";

/// Value returned by every handler: an HTML fragment or a failure.
pub type HandlerResult = Result<String, HandlerError>;

/// Shared, thread-safe handler function.
pub type Handler = Arc<dyn Fn(&mut Context) -> HandlerResult + Send + Sync>;

/// HTTP methods understood by the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Full page navigation.
    Get,
    /// Action invocation from the client runtime.
    Post,
}

impl Method {
    /// Parses a request-line method. Anything other than GET and POST is
    /// unsupported.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            _ => None,
        }
    }

    /// Returns the canonical request-line token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A handler paired with the stable name its action path derives from.
///
/// # Example
///
/// ```
/// use patchwire::Callable;
///
/// let increment = Callable::new("counter.increment", |_ctx| Ok("<b>1</b>".to_owned()));
/// assert_eq!(increment.name(), "counter.increment");
/// ```
#[derive(Clone)]
pub struct Callable {
    name: Arc<str>,
    handler: Handler,
}

impl Callable {
    /// Wraps `handler` under `name`.
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            handler: Arc::new(handler),
        }
    }

    /// Stable name chosen by the caller.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handler.
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Runs the handler against `ctx`.
    ///
    /// # Errors
    ///
    /// Propagates the handler's own failure.
    pub fn invoke(&self, ctx: &mut Context) -> HandlerResult {
        (self.handler)(ctx)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Callable")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Registered route.
#[derive(Clone)]
pub struct ActionEntry {
    method: Method,
    path: String,
    handler: Handler,
}

impl ActionEntry {
    /// Method the route answers to.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Normalised path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Shared handler.
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl fmt::Debug for ActionEntry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ActionEntry")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Registry of pages and actions keyed by method and normalised path.
#[derive(Debug, Default)]
pub struct ActionTable {
    entries: HashMap<(Method, String), ActionEntry>,
}

impl ActionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GET page.
    ///
    /// # Errors
    ///
    /// Fails when the path is empty, reserved, or already registered.
    pub fn register_page(
        &mut self,
        path: &str,
        handler: Handler,
    ) -> Result<String, RegistrationError> {
        let path = normalize_path(Method::Get, path)?;
        let key = (Method::Get, path.clone());
        if self.entries.contains_key(&key) {
            return Err(RegistrationError::DuplicateRoute {
                method: Method::Get,
                path,
            });
        }
        debug!(target: ACTION_TARGET, method = "GET", path = %path, "registered page");
        self.insert(key, handler);
        Ok(path)
    }

    /// Registers a POST action, returning the bound path.
    ///
    /// When the path is already bound the existing binding is kept and its
    /// path returned.
    ///
    /// # Errors
    ///
    /// Fails when the path is empty or reserved.
    pub fn register_action(
        &mut self,
        path: &str,
        handler: Handler,
    ) -> Result<String, RegistrationError> {
        let path = normalize_path(Method::Post, path)?;
        let key = (Method::Post, path.clone());
        if let Some(existing) = self.entries.get(&key) {
            if !Arc::ptr_eq(&existing.handler, &handler) {
                warn!(
                    target: ACTION_TARGET,
                    path = %path,
                    "action path already bound to another handler; keeping the first"
                );
            }
            return Ok(path);
        }
        debug!(target: ACTION_TARGET, method = "POST", path = %path, "registered action");
        self.insert(key, handler);
        Ok(path)
    }

    /// Registers `callable` under the path derived from its name.
    ///
    /// # Errors
    ///
    /// Fails when the name sanitises to nothing or onto a reserved path.
    pub fn derive_callable(&mut self, callable: &Callable) -> Result<String, RegistrationError> {
        let path = callable_path(callable.name())?;
        self.register_action(&path, Arc::clone(callable.handler()))
    }

    /// Returns the path `callable`'s handler is registered under, if any.
    #[must_use]
    pub fn path_of(&self, callable: &Callable) -> Option<String> {
        self.entries
            .values()
            .find(|entry| {
                entry.method == Method::Post && Arc::ptr_eq(&entry.handler, callable.handler())
            })
            .map(|entry| entry.path.clone())
    }

    /// Looks up the route for a request.
    #[must_use]
    pub fn resolve(&self, method: Method, path: &str) -> Option<ActionEntry> {
        let path = normalize_request_path(path);
        self.entries.get(&(method, path)).cloned()
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: (Method, String), handler: Handler) {
        let entry = ActionEntry {
            method: key.0,
            path: key.1.clone(),
            handler,
        };
        self.entries.insert(key, entry);
    }
}

/// Normalises a registration path.
///
/// # Errors
///
/// Returns [`RegistrationError::EmptyPath`] for blank paths and
/// [`RegistrationError::Reserved`] for the runtime's stream endpoints.
pub fn normalize_path(method: Method, path: &str) -> Result<String, RegistrationError> {
    if path.trim().is_empty() {
        return Err(RegistrationError::EmptyPath { method });
    }
    let path = normalize_request_path(path);
    if path == LIVE_PATH || path == PATCH_PATH {
        return Err(RegistrationError::Reserved { path });
    }
    Ok(path)
}

/// Normalises an incoming request path: leading `/`, no trailing `/`,
/// ASCII lowercase. Blank paths become `/`.
#[must_use]
pub fn normalize_request_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    let mut normalised = String::with_capacity(trimmed.len() + 1);
    if !trimmed.starts_with('/') {
        normalised.push('/');
    }
    normalised.push_str(trimmed);
    normalised.make_ascii_lowercase();
    normalised
}

/// Replaces characters outside `[A-Za-z0-9_-]` with `-` and trims the
/// result of leading and trailing dashes.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() || character == '_' || character == '-' {
                character
            } else {
                '-'
            }
        })
        .collect();
    replaced.trim_matches('-').to_owned()
}

fn callable_path(name: &str) -> Result<String, RegistrationError> {
    let sanitized = sanitize_name(name);
    if sanitized.is_empty() {
        return Err(RegistrationError::EmptyName {
            name: name.to_owned(),
        });
    }
    Ok(format!("/{sanitized}"))
}
