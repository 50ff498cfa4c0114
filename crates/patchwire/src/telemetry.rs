//! Log sink installation for the server.
//!
//! Output goes to standard error in the format chosen by
//! [`Config::log_format`], filtered by [`Config::log_filter`].

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{EnvFilter, fmt};

use patchwire_config::{Config, LogFormat};

static SINK_INSTALLED: OnceCell<()> = OnceCell::new();

/// Proof that the global log sink is in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while installing the log sink.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression did not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Expression taken from configuration.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another global subscriber was already registered.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// Later calls return a handle without reinstalling anything, even when the
/// configuration differs.
///
/// # Examples
///
/// ```rust
/// use patchwire::telemetry;
/// use patchwire_config::Config;
///
/// # fn main() -> Result<(), patchwire::TelemetryError> {
/// let config = Config::default();
/// telemetry::initialise(&config)?;
/// telemetry::initialise(&config)?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Fails when the filter expression is invalid or a foreign subscriber is
/// already installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    SINK_INSTALLED
        .get_or_try_init(|| install(config))
        .map(|()| TelemetryHandle)
}

fn install(config: &Config) -> Result<(), TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    let subscriber = build_subscriber(filter, config.log_format());
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

fn parse_filter(expression: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(expression).map_err(|error| TelemetryError::Filter {
        filter: expression.to_owned(),
        message: error.to_string(),
    })
}

fn build_subscriber(filter: EnvFilter, format: LogFormat) -> Box<dyn Subscriber + Send + Sync> {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    match format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("info")]
    #[case("patchwire=debug,warn")]
    #[case("patchwire::dispatch=trace")]
    fn accepts_filter_expressions(#[case] expression: &str) {
        assert!(parse_filter(expression).is_ok());
    }

    #[test]
    fn rejects_malformed_filters() {
        let error = parse_filter("patchwire=loud").expect_err("invalid level");
        assert!(error.to_string().contains("patchwire=loud"));
    }
}
