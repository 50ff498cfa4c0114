//! Demo server: a shared counter and a deferred panel.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::{error, info};

use patchwire::{
    App, BootstrapError, Callable, RegistrationError, Skeleton, StructuredHealthReporter, SystemConfigLoader,
    Target, Values, bootstrap_with,
};

const MAIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::main");

#[derive(Debug, Default, Serialize, Deserialize)]
struct Step {
    by: i64,
}

fn main() -> ExitCode {
    let reporter = Arc::new(StructuredHealthReporter::new());
    let server = match bootstrap_with(&SystemConfigLoader, reporter, |settings| {
        settings.with_title("patchwire demo")
    }) {
        Ok(server) => server,
        Err(error) => return report_startup_failure(&error),
    };

    if let Err(error) = register_demo(server.app()) {
        error!(target: MAIN_TARGET, %error, "failed to register demo routes");
        return ExitCode::FAILURE;
    }

    let handle = match server.serve() {
        Ok(handle) => handle,
        Err(error) => return report_startup_failure(&error),
    };

    match Signals::new([SIGINT, SIGTERM]) {
        Ok(mut signals) => {
            if let Some(signal) = signals.forever().next() {
                info!(target: MAIN_TARGET, signal, "shutdown signal received");
            }
        }
        Err(error) => {
            error!(target: MAIN_TARGET, %error, "failed to install signal handlers");
        }
    }

    handle.shutdown();
    match handle.join() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(target: MAIN_TARGET, %error, "listener did not stop cleanly");
            ExitCode::FAILURE
        }
    }
}

/// Writes `error` to stderr, since logging may not be installed yet.
fn report_startup_failure(error: &BootstrapError) -> ExitCode {
    let mut stderr = io::stderr().lock();
    if let Err(write_error) = writeln!(stderr, "patchwire: {error}") {
        error!(target: MAIN_TARGET, error = %write_error, "failed to report startup failure");
    }
    ExitCode::FAILURE
}

fn register_demo(app: &App) -> Result<(), RegistrationError> {
    let count = Arc::new(AtomicI64::new(0));
    let display = Target::new();

    let increment = {
        let count = Arc::clone(&count);
        Callable::new("counter.increment", move |ctx| {
            let mut step = Step { by: 1 };
            ctx.body(&mut step);
            let value = count.fetch_add(step.by, Ordering::SeqCst) + step.by;
            if value % 10 == 0 {
                ctx.success(&format!("Reached {value}"));
            }
            Ok(format!("<strong>{value}</strong>"))
        })
    };

    let report = Callable::new("report.slow", |_ctx| {
        thread::sleep(Duration::from_millis(800));
        Ok(r#"<section class="report"><h2>Report</h2><p>Ready.</p></section>"#.to_owned())
    });

    app.page("/", move |ctx| {
        let once = ctx
            .call(&increment, Values::new().set("by", 1_i64))?
            .render(&display);
        let five = ctx
            .call(&increment, Values::new().set("by", 5_i64))?
            .render(&display);
        let panel = Target::new();
        let placeholder = ctx
            .defer(&report, Values::new())?
            .skeleton(Skeleton::List)
            .replace(&panel);
        Ok(format!(
            r#"<h1>Counter</h1>
<p>Value: <span {attr}><strong>{value}</strong></span></p>
<button onclick="{once}">+1</button> <button onclick="{five}">+5</button>
{placeholder}"#,
            attr = display.attr(),
            value = count.load(Ordering::SeqCst),
        ))
    })?;
    Ok(())
}
