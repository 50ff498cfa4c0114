//! Per-request handler context.
//!
//! A [`Context`] is built fresh for every request and for every deferred
//! job. It exposes the decoded body, request metadata and the session id,
//! and it is the entry point for the Call/Submit/Send/Defer verbs that turn a
//! [`Callable`] into a client-side invocation string.

mod escape;
mod session;
mod verbs;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::action::{Callable, RegistrationError};
use crate::app::App;
use crate::body::{self, BodyItem, Values};
use crate::deferred::DeferredJob;
use crate::patch::PatchMessage;
use crate::target::Target;

pub use self::escape::{escape_html, escape_script};
pub(crate) use self::session::{SESSION_COOKIE, is_valid_session_id, mint_session_id};
pub use self::verbs::{ActionBuilder, DeferBuilder, Skeleton, Verb};

/// Request metadata visible to handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    /// Request-line method token.
    pub method: String,
    /// Path without the query string.
    pub path: String,
    /// Decoded query parameters in order of appearance.
    pub query: Vec<(String, String)>,
    /// Header name/value pairs; names are lowercase.
    pub headers: Vec<(String, String)>,
}

impl RequestInfo {
    /// First header value with the given (case-insensitive) name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Value of the named cookie.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .filter(|(key, _)| key == "cookie")
            .flat_map(|(_, value)| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

/// Handler-facing view of one request.
#[derive(Debug)]
pub struct Context {
    app: App,
    request: RequestInfo,
    session_id: String,
    items: Vec<BodyItem>,
    scripts: Vec<String>,
    jobs: Vec<DeferredJob>,
}

impl Context {
    /// Creates a context with no request metadata and an empty body.
    pub fn new(app: App, session_id: impl Into<String>) -> Self {
        Self {
            app,
            request: RequestInfo::default(),
            session_id: session_id.into(),
            items: Vec::new(),
            scripts: Vec::new(),
            jobs: Vec::new(),
        }
    }

    /// Replaces the body items.
    #[must_use]
    pub fn with_items(mut self, items: Vec<BodyItem>) -> Self {
        self.items = items;
        self
    }

    /// Replaces the request metadata.
    #[must_use]
    pub fn with_request(mut self, request: RequestInfo) -> Self {
        self.request = request;
        self
    }

    /// Application the request belongs to.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Request metadata.
    #[must_use]
    pub fn request(&self) -> &RequestInfo {
        &self.request
    }

    /// Session identity shared by the request and the jobs it defers.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Raw body items as sent by the client.
    #[must_use]
    pub fn body_items(&self) -> &[BodyItem] {
        &self.items
    }

    /// Decodes the body into `target`, returning how many items applied.
    ///
    /// Fields the body does not mention keep their current values.
    pub fn body<T>(&self, target: &mut T) -> usize
    where
        T: Serialize + DeserializeOwned,
    {
        body::decode(&self.items, target)
    }

    /// First query parameter with the given name.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.request
            .query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Registers `callable` on demand and returns its action path.
    ///
    /// # Errors
    ///
    /// Fails when the callable's name does not yield a usable path.
    pub fn callable(&self, callable: &Callable) -> Result<String, RegistrationError> {
        self.app.callable(callable)
    }

    /// Builds an event-driven invocation (`onclick`, `onchange`, ...).
    ///
    /// # Errors
    ///
    /// Fails when `callable` cannot be registered.
    pub fn call(
        &self,
        callable: &Callable,
        values: Values,
    ) -> Result<ActionBuilder, RegistrationError> {
        self.verb(Verb::Call, callable, values)
    }

    /// Builds a form submission that merges the form's live fields over
    /// `values`.
    ///
    /// # Errors
    ///
    /// Fails when `callable` cannot be registered.
    pub fn submit(
        &self,
        callable: &Callable,
        values: Values,
    ) -> Result<ActionBuilder, RegistrationError> {
        self.verb(Verb::Submit, callable, values)
    }

    /// Builds an invocation usable from scripts and timers.
    ///
    /// # Errors
    ///
    /// Fails when `callable` cannot be registered.
    pub fn send(
        &self,
        callable: &Callable,
        values: Values,
    ) -> Result<ActionBuilder, RegistrationError> {
        self.verb(Verb::Send, callable, values)
    }

    /// Defers `callable` until after this response; its output arrives as a
    /// patch.
    ///
    /// # Errors
    ///
    /// Fails when `callable` cannot be registered.
    pub fn defer(
        &mut self,
        callable: &Callable,
        values: Values,
    ) -> Result<DeferBuilder<'_>, RegistrationError> {
        self.app.callable(callable)?;
        Ok(DeferBuilder::new(self, callable.clone(), values))
    }

    /// Shows a success toast.
    pub fn success(&mut self, message: &str) {
        self.toast("success", message);
    }

    /// Shows an error toast.
    pub fn error(&mut self, message: &str) {
        self.toast("error", message);
    }

    /// Shows an informational toast.
    pub fn info(&mut self, message: &str) {
        self.toast("info", message);
    }

    /// Reloads the page once the response is applied.
    pub fn reload(&mut self) {
        self.script("location.reload();".to_owned());
    }

    /// Navigates to `url` once the response is applied.
    pub fn redirect(&mut self, url: &str) {
        self.script(format!("location.href = {};", escape_script(url)));
    }

    /// Sets the document title.
    pub fn title(&mut self, text: &str) {
        self.script(format!("document.title = {};", escape_script(text)));
    }

    /// Publishes `html` to `target` right away, using its default swap mode.
    pub fn patch(&self, target: &Target, html: impl Into<String>) -> usize {
        self.app.publish(PatchMessage::for_target(target, html))
    }

    /// Appends the out-of-band scripts to `html` and hands back the jobs
    /// deferred during the request.
    pub(crate) fn finish(self, mut html: String) -> (String, Vec<DeferredJob>) {
        for script in &self.scripts {
            html.push_str("<script>");
            html.push_str(script);
            html.push_str("</script>");
        }
        (html, self.jobs)
    }

    pub(crate) fn push_job(&mut self, job: DeferredJob) {
        self.jobs.push(job);
    }

    fn verb(
        &self,
        verb: Verb,
        callable: &Callable,
        values: Values,
    ) -> Result<ActionBuilder, RegistrationError> {
        let path = self.app.callable(callable)?;
        Ok(ActionBuilder::new(verb, path, values))
    }

    fn toast(&mut self, kind: &str, message: &str) {
        self.script(format!(
            "__pw_toast({}, {});",
            escape_script(kind),
            escape_script(message)
        ));
    }

    fn script(&mut self, body: String) {
        self.scripts.push(body);
    }
}

#[cfg(test)]
mod tests;
