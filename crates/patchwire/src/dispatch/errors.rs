//! Error types for request body buffering.
//!
//! Handler failures are not represented here: they are reported by the
//! handler as a `HandlerError` and turned into the generic error page. These
//! variants explain why a request body was abandoned.

use std::time::Duration;

use thiserror::Error;

/// Reasons a request body was dropped before decoding.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The body failed to arrive intact within the size ceiling.
    #[error("request body unreadable within the {limit} byte ceiling: {source}")]
    Body {
        /// Configured body ceiling in bytes.
        limit: usize,
        /// Underlying body error.
        #[source]
        source: axum::Error,
    },

    /// The body did not finish arriving before the deadline.
    #[error("request body did not arrive within {timeout:?}")]
    BodyTimeout {
        /// Deadline for the whole body.
        timeout: Duration,
    },
}
