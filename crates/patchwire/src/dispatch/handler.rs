//! Request handlers mounted on the axum router.
//!
//! Every request that is not one of the exact event-stream paths lands in
//! [`dispatch`]: it is classified, its body buffered and decoded, the page or
//! action handler run on the blocking pool and the response returned. Deferred
//! jobs queued by the handler are scheduled only after the response body has
//! been written.

use std::panic::{AssertUnwindSafe, catch_unwind};

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use crate::action::ActionEntry;
use crate::app::App;
use crate::body::{BodyItem, parse_items};
use crate::client::ERROR_PAGE;
use crate::context::{Context, RequestInfo};
use crate::deferred::DeferredJob;

use super::DISPATCH_TARGET;
use super::request::{buffer_body, request_info, session_for};
use super::response::{
    close_connection, html, html_then_schedule, live_stream, not_found, patch_stream,
    set_session_cookie,
};
use super::router::{Route, classify};

/// Outcome of running a page or action handler.
enum Rendered {
    Html(String, Vec<DeferredJob>),
    Failed,
}

/// Fallback handler: pages, actions and everything unknown.
pub(crate) async fn dispatch(State(app): State<App>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let route = classify(&app, parts.method.as_str(), parts.uri.path());
    debug!(
        target: DISPATCH_TARGET,
        method = %parts.method,
        path = %parts.uri.path(),
        "dispatching request"
    );

    let (session_id, fresh_session) = session_for(&parts.headers);
    let info = request_info(&parts);
    let mut response = match route {
        Route::NotFound => not_found(),
        Route::LiveReload => return live_stream(&app).into_response(),
        Route::Patches => return patch_stream(&app).into_response(),
        Route::Page(entry) => {
            respond(&app, entry, info, Vec::new(), session_id.clone(), true).await
        }
        Route::Action(entry) => {
            let settings = app.settings();
            let buffered =
                buffer_body(body, settings.max_body_bytes, settings.body_timeout).await;
            let items = parse_items(&buffered.bytes);
            let mut response =
                respond(&app, entry, info, items, session_id.clone(), false).await;
            if buffered.abandoned {
                close_connection(&mut response);
            }
            response
        }
    };
    if fresh_session {
        set_session_cookie(&mut response, &session_id);
    }
    response
}

/// `GET /__sse`.
pub(crate) async fn patches(State(app): State<App>) -> Response {
    patch_stream(&app).into_response()
}

/// `GET /__live`.
pub(crate) async fn live(State(app): State<App>) -> Response {
    live_stream(&app).into_response()
}

/// Method fallback for the stream paths.
pub(crate) async fn unrouted() -> Response {
    not_found()
}

async fn respond(
    app: &App,
    entry: ActionEntry,
    info: RequestInfo,
    items: Vec<BodyItem>,
    session_id: String,
    page: bool,
) -> Response {
    let ctx = Context::new(app.clone(), session_id)
        .with_request(info)
        .with_items(items);
    let rendered = match tokio::task::spawn_blocking(move || run_handler(&entry, ctx)).await {
        Ok(rendered) => rendered,
        Err(failure) => {
            error!(target: DISPATCH_TARGET, error = %failure, "handler task failed");
            Rendered::Failed
        }
    };

    match rendered {
        Rendered::Html(markup, jobs) => {
            let body = if page { app.document(&markup) } else { markup };
            html_then_schedule(app.clone(), body, jobs)
        }
        Rendered::Failed => html(StatusCode::INTERNAL_SERVER_ERROR, ERROR_PAGE.to_owned()),
    }
}

/// Runs the handler with panics contained to this request.
fn run_handler(entry: &ActionEntry, mut ctx: Context) -> Rendered {
    let handler = entry.handler();
    match catch_unwind(AssertUnwindSafe(|| handler(&mut ctx))) {
        Ok(Ok(markup)) => {
            let (markup, jobs) = ctx.finish(markup);
            Rendered::Html(markup, jobs)
        }
        Ok(Err(failure)) => {
            error!(
                target: DISPATCH_TARGET,
                path = entry.path(),
                error = %failure,
                "handler failed"
            );
            Rendered::Failed
        }
        Err(_) => {
            error!(target: DISPATCH_TARGET, path = entry.path(), "handler panicked");
            Rendered::Failed
        }
    }
}
