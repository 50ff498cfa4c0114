//! Routing.
//!
//! The exact event-stream paths are mounted as axum routes. Everything else
//! falls through to [`dispatch`], which classifies the method and normalised
//! path against the application's registry: a registered page, a registered
//! action, or nothing.

use axum::Router;
use axum::routing::get;

use crate::action::{ActionEntry, LIVE_PATH, Method, PATCH_PATH, normalize_request_path};
use crate::app::App;

use super::handler::{dispatch, live, patches, unrouted};

/// Builds the axum router serving `app`.
pub(crate) fn router(app: App) -> Router {
    let mut router = Router::new().route(PATCH_PATH, get(patches).fallback(unrouted));
    if app.settings().live_reload {
        router = router.route(LIVE_PATH, get(live).fallback(unrouted));
    }
    router.fallback(dispatch).with_state(app)
}

/// Destination of a request.
#[derive(Debug)]
pub(crate) enum Route {
    /// `GET /__live`: heartbeat-only stream for reload detection.
    LiveReload,
    /// `GET /__sse`: patch stream.
    Patches,
    /// Registered GET page.
    Page(ActionEntry),
    /// Registered POST action.
    Action(ActionEntry),
    /// Nothing registered.
    NotFound,
}

/// Classifies a request against the application's routes.
pub(crate) fn classify(app: &App, method: &str, path: &str) -> Route {
    let Some(method) = Method::parse(method) else {
        return Route::NotFound;
    };
    let normalised = normalize_request_path(path);
    match (method, normalised.as_str()) {
        (Method::Get, LIVE_PATH) if app.settings().live_reload => Route::LiveReload,
        (Method::Get, PATCH_PATH) => Route::Patches,
        _ => match app.resolve(method, &normalised) {
            Some(entry) if method == Method::Get => Route::Page(entry),
            Some(entry) => Route::Action(entry),
            None => Route::NotFound,
        },
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::app::AppSettings;

    #[fixture]
    fn app() -> App {
        let app = App::new();
        app.page("/todos", |_ctx| Ok("page".to_owned()))
            .expect("page");
        app.action("/todos/add", |_ctx| Ok("action".to_owned()))
            .expect("action");
        app
    }

    #[rstest]
    #[case("GET", "/__live", "live")]
    #[case("GET", "/__sse", "patches")]
    #[case("GET", "/todos", "page")]
    #[case("GET", "/TODOS/", "page")]
    #[case("POST", "/todos/add", "action")]
    #[case("POST", "/todos", "not found")]
    #[case("GET", "/todos/add", "not found")]
    #[case("POST", "/__sse", "not found")]
    #[case("DELETE", "/todos", "not found")]
    #[case("GET", "/missing", "not found")]
    fn classifies_requests(
        app: App,
        #[case] method: &str,
        #[case] path: &str,
        #[case] expected: &str,
    ) {
        let route = match classify(&app, method, path) {
            Route::LiveReload => "live",
            Route::Patches => "patches",
            Route::Page(_) => "page",
            Route::Action(_) => "action",
            Route::NotFound => "not found",
        };
        assert_eq!(route, expected);
    }

    #[test]
    fn live_reload_can_be_disabled() {
        let settings = AppSettings {
            live_reload: false,
            ..AppSettings::default()
        };
        let app = App::with_settings(settings);
        assert!(matches!(classify(&app, "GET", "/__live"), Route::NotFound));
    }
}
