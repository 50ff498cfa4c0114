//! Response construction for the dispatch loop.
//!
//! Plain responses carry a complete HTML or text body. Responses whose
//! handler deferred work hand the jobs to the executor only once the body has
//! been written out. The two event streams are axum [`Sse`] responses with a
//! `ping` keep-alive.

use std::convert::Infallible;
use std::future;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, warn};

use crate::app::App;
use crate::client::NOT_FOUND_BODY;
use crate::context::SESSION_COOKIE;
use crate::deferred::DeferredJob;
use crate::patch::ping_event;

use super::DISPATCH_TARGET;

const HTML: &str = "text/html; charset=utf-8";
const NO_STORE: &str = "no-store";

/// Reconnect delay suggested to `EventSource` clients.
const STREAM_RETRY: Duration = Duration::from_millis(1000);

/// Complete HTML response.
pub(crate) fn html(status: StatusCode, body: String) -> Response {
    (status, [(CONTENT_TYPE, HTML), (CACHE_CONTROL, NO_STORE)], body).into_response()
}

/// Plain-text `404`.
pub(crate) fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

/// `200` HTML response that schedules `jobs` after its body is consumed.
pub(crate) fn html_then_schedule(app: App, body: String, jobs: Vec<DeferredJob>) -> Response {
    if jobs.is_empty() {
        return html(StatusCode::OK, body);
    }
    let length = body.len();
    let head = stream::once(future::ready(Ok::<_, Infallible>(Bytes::from(body))));
    let tail = stream::once(async move { schedule_all(&app, jobs) })
        .filter_map(|()| future::ready(None::<Result<Bytes, Infallible>>));

    let mut response = Response::new(Body::from_stream(head.chain(tail)));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    response
}

fn schedule_all(app: &App, jobs: Vec<DeferredJob>) {
    for job in jobs {
        if let Err(error) = app.schedule(job) {
            warn!(target: DISPATCH_TARGET, %error, "failed to schedule deferred job");
        }
    }
}

/// Adds the session cookie for a freshly minted id.
pub(crate) fn set_session_cookie(response: &mut Response, session_id: &str) {
    let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(error) => debug!(target: DISPATCH_TARGET, %error, "unusable session cookie"),
    }
}

/// Asks the server to close the connection after this response.
pub(crate) fn close_connection(response: &mut Response) {
    response
        .headers_mut()
        .insert(CONNECTION, HeaderValue::from_static("close"));
}

fn opening() -> impl Stream<Item = Result<Event, Infallible>> {
    stream::once(future::ready(Ok(Event::default().retry(STREAM_RETRY))))
}

fn heartbeat(app: &App) -> KeepAlive {
    KeepAlive::new()
        .interval(app.settings().heartbeat)
        .event(ping_event())
}

/// Patch stream: every published patch as a `patch` event.
///
/// The subscription is taken before the response is returned, so patches
/// published after the handler runs reach this client.
pub(crate) fn patch_stream(app: &App) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    let subscription = app.subscribe();
    let patches = stream::unfold(subscription, |mut subscription| async move {
        subscription
            .recv()
            .await
            .map(|message| (message, subscription))
    })
    .filter_map(|message| {
        future::ready(match message.to_event() {
            Ok(event) => Some(Ok(event)),
            Err(error) => {
                debug!(target: DISPATCH_TARGET, %error, "failed to encode patch");
                None
            }
        })
    });
    Sse::new(opening().chain(patches)).keep_alive(heartbeat(app))
}

/// Live-reload stream: heartbeats only, for the lifetime of the process.
pub(crate) fn live_stream(app: &App) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    Sse::new(opening().chain(stream::pending())).keep_alive(heartbeat(app))
}
