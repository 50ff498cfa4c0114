//! Server-driven UI runtime.
//!
//! Handlers run on the server and return HTML fragments. The browser invokes
//! them through a small embedded client (`__pw_call`, `__pw_submit`,
//! `__pw_send`) and swaps the returned markup into the element named by a
//! [`Target`]. Work that is too slow for the request path is deferred: the
//! request returns a skeleton immediately and the finished fragment arrives
//! later as a patch over the `/__sse` event stream.
//!
//! ```no_run
//! use patchwire::{App, Callable, Target, Values};
//!
//! # fn main() -> Result<(), patchwire::RegistrationError> {
//! let app = App::new();
//! let target = Target::new();
//! let increment = Callable::new("counter.increment", |ctx| {
//!     let id = ctx.query("id").unwrap_or_default().to_owned();
//!     Ok(format!("<span>{id}</span>"))
//! });
//!
//! let page_target = target.clone();
//! app.page("/counter", move |ctx| {
//!     let click = ctx
//!         .call(&increment, Values::new().set("id", "c1"))?
//!         .replace(&page_target);
//!     Ok(format!(
//!         r#"<div {}><button onclick="{click}">+1</button></div>"#,
//!         page_target.attr()
//!     ))
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! The [`bootstrap_with`] sequence loads [`patchwire_config::Config`],
//! installs the log sink and yields a [`Server`] whose [`App`] can be
//! populated before [`Server::serve`] binds the listener.

mod action;
mod app;
mod body;
mod bootstrap;
mod client;
mod context;
mod deferred;
mod dispatch;
mod health;
mod patch;
mod target;
pub mod telemetry;
mod transport;

pub use action::{
    ActionEntry, ActionTable, Callable, Handler, HandlerError, HandlerResult, LIVE_PATH, Method,
    PATCH_PATH, RegistrationError, normalize_request_path, sanitize_name,
};
pub use app::{App, AppSettings};
pub use body::{
    BodyItem, BodyValue, MAX_ARRAY_INDEX, MAX_PATH_SEGMENTS, Values, decode, parse_items,
};
pub use bootstrap::{
    BootstrapError, ConfigLoader, Server, ServerHandle, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use client::{ERROR_PAGE, RUNTIME_CSS, RUNTIME_JS, document};
pub use context::{
    ActionBuilder, Context, DeferBuilder, RequestInfo, Skeleton, Verb, escape_html, escape_script,
};
pub use deferred::{DeferredExecutor, DeferredJob, JobOutcome};
pub use dispatch::DispatchError;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use patch::{PatchChannel, PatchMessage, SUBSCRIBER_QUEUE, Subscription};
pub use target::{Swap, Target, UnknownSwap};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
