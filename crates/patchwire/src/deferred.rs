//! Fire-and-forget execution of deferred handlers.
//!
//! A deferred job runs after the response that scheduled it has been written.
//! Its HTML is published as a single patch message; a failing or panicking
//! job publishes nothing and is only logged.

use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::action::Callable;
use crate::app::App;
use crate::body::BodyItem;
use crate::context::Context;
use crate::patch::PatchMessage;
use crate::target::Swap;

pub(crate) const DEFERRED_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::deferred");

/// A handler queued to render a target after the current response.
#[derive(Debug, Clone)]
pub struct DeferredJob {
    callable: Callable,
    target_id: String,
    swap: Swap,
    items: Vec<BodyItem>,
    session_id: String,
}

impl DeferredJob {
    /// Creates a job rendering `callable` into `target_id`.
    pub fn new(
        callable: Callable,
        target_id: impl Into<String>,
        swap: Swap,
        items: Vec<BodyItem>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            callable,
            target_id: target_id.into(),
            swap,
            items,
            session_id: session_id.into(),
        }
    }

    /// Id of the element the result patches.
    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Swap mode of the resulting patch.
    #[must_use]
    pub fn swap(&self) -> Swap {
        self.swap
    }

    /// Session the job runs on behalf of.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Result of running a deferred job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// A patch was published to this many streams.
    Published(usize),
    /// The handler failed or panicked; nothing was published.
    Dropped,
}

/// Spawns one worker thread per job.
#[derive(Debug, Clone, Default)]
pub struct DeferredExecutor {
    in_flight: Arc<AtomicUsize>,
}

impl DeferredExecutor {
    /// Creates an idle executor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `job` in the background against `app`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the worker thread cannot be spawned; the
    /// job is then lost.
    pub fn schedule(&self, app: &App, job: DeferredJob) -> io::Result<JoinHandle<JobOutcome>> {
        let app = app.clone();
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.fetch_add(1, Ordering::SeqCst);
        let spawned = thread::Builder::new()
            .name("patchwire-deferred".to_owned())
            .spawn(move || {
                let outcome = run(&app, job);
                in_flight.fetch_sub(1, Ordering::SeqCst);
                outcome
            });
        if spawned.is_err() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        spawned
    }

    /// Number of jobs that have been scheduled and not yet finished.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

fn run(app: &App, job: DeferredJob) -> JobOutcome {
    let DeferredJob {
        callable,
        target_id,
        swap,
        items,
        session_id,
    } = job;
    let mut ctx = Context::new(app.clone(), session_id).with_items(items);
    let result = catch_unwind(AssertUnwindSafe(|| callable.invoke(&mut ctx)));

    let html = match result {
        Ok(Ok(html)) => html,
        Ok(Err(error)) => {
            debug!(
                target: DEFERRED_TARGET,
                callable = callable.name(),
                target_id = %target_id,
                %error,
                "deferred job failed; dropping"
            );
            return JobOutcome::Dropped;
        }
        Err(_) => {
            debug!(
                target: DEFERRED_TARGET,
                callable = callable.name(),
                target_id = %target_id,
                "deferred job panicked; dropping"
            );
            return JobOutcome::Dropped;
        }
    };

    let (html, nested) = ctx.finish(html);
    let delivered = app.publish(PatchMessage::new(target_id, swap, html));
    for job in nested {
        if let Err(error) = app.schedule(job) {
            debug!(target: DEFERRED_TARGET, %error, "failed to schedule nested deferred job");
        }
    }
    JobOutcome::Published(delivered)
}
