//! Error types for route registration and handler execution.

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

use super::Method;

/// Configuration errors raised while registering routes.
///
/// These are fatal at startup: they indicate a programming mistake in how the
/// application wires its pages and actions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// The path was empty after trimming.
    #[error("cannot register a {method} route with an empty path")]
    EmptyPath {
        /// Method of the rejected route.
        method: Method,
    },

    /// A page with the same normalised path already exists.
    #[error("{method} route '{path}' is already registered")]
    DuplicateRoute {
        /// Method of the rejected route.
        method: Method,
        /// Normalised path that collided.
        path: String,
    },

    /// A callable's name sanitised to nothing.
    #[error("callable name '{name}' does not yield a usable path")]
    EmptyName {
        /// Name as supplied by the caller.
        name: String,
    },

    /// The path belongs to one of the built-in streams.
    #[error("path '{path}' is reserved by the runtime")]
    Reserved {
        /// Normalised reserved path.
        path: String,
    },
}

/// Failure reported by a page or action handler.
///
/// The dispatch loop turns these into the generic error page; the message is
/// only logged, never shown to the browser.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Free-form failure description.
    #[error("{0}")]
    Message(String),

    /// Underlying error raised by the handler's collaborators.
    #[error(transparent)]
    Source(Box<dyn StdError + Send + Sync + 'static>),
}

impl HandlerError {
    /// Creates an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wraps an arbitrary error.
    pub fn source(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Source(Box::new(error))
    }
}

impl From<io::Error> for HandlerError {
    fn from(error: io::Error) -> Self {
        Self::source(error)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(error: serde_json::Error) -> Self {
        Self::source(error)
    }
}

impl From<RegistrationError> for HandlerError {
    fn from(error: RegistrationError) -> Self {
        Self::source(error)
    }
}
