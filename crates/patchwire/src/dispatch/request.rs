//! Request metadata, sessions and body buffering for the dispatch loop.
//!
//! The body is collected up to a size ceiling under one deadline that covers
//! the whole read. A body that is too large, unreadable or late is abandoned
//! and the request proceeds without it.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use tracing::debug;

use crate::context::{RequestInfo, SESSION_COOKIE, is_valid_session_id, mint_session_id};

use super::DISPATCH_TARGET;
use super::errors::DispatchError;

/// Body after buffering.
#[derive(Debug, Default)]
pub(crate) struct BufferedBody {
    pub(crate) bytes: Bytes,
    /// Set when the body was dropped for size or time.
    pub(crate) abandoned: bool,
}

/// Collects `body`, abandoning it past `limit` bytes or once `timeout`
/// elapses.
pub(crate) async fn buffer_body(body: Body, limit: usize, timeout: Duration) -> BufferedBody {
    match read_body(body, limit, timeout).await {
        Ok(bytes) => BufferedBody {
            bytes,
            abandoned: false,
        },
        Err(error) => {
            debug!(target: DISPATCH_TARGET, %error, "abandoning request body");
            BufferedBody {
                bytes: Bytes::new(),
                abandoned: true,
            }
        }
    }
}

async fn read_body(body: Body, limit: usize, timeout: Duration) -> Result<Bytes, DispatchError> {
    match tokio::time::timeout(timeout, axum::body::to_bytes(body, limit)).await {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(source)) => Err(DispatchError::Body { limit, source }),
        Err(_) => Err(DispatchError::BodyTimeout { timeout }),
    }
}

/// Metadata handed to handlers.
pub(crate) fn request_info(parts: &Parts) -> RequestInfo {
    RequestInfo {
        method: parts.method.as_str().to_owned(),
        path: parts.uri.path().to_owned(),
        query: parts.uri.query().map(decode_query).unwrap_or_default(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_owned(), value.to_owned()))
            })
            .collect(),
    }
}

/// Decodes a query string into its pairs.
pub(crate) fn decode_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Session id from the request cookie, or a fresh one.
pub(crate) fn session_for(headers: &HeaderMap) -> (String, bool) {
    let existing = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && is_valid_session_id(value))
        .map(|(_, value)| value.to_owned());
    match existing {
        Some(id) => (id, false),
        None => (mint_session_id(), true),
    }
}
