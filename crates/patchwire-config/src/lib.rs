//! Shared configuration for the patchwire server.
//!
//! Values are layered by [`ortho_config`]: built-in defaults, then an optional
//! TOML file (`--config-path` or `PATCHWIRE_CONFIG_PATH`), then `PATCHWIRE_*`
//! environment variables, then command-line flags.

mod defaults;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_BODY_TIMEOUT_MS, DEFAULT_HEARTBEAT_SECS, DEFAULT_HOST, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT, default_body_timeout_ms, default_heartbeat_secs,
    default_host, default_live_reload, default_log_filter, default_log_filter_string,
    default_log_format, default_max_body_bytes, default_port,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PATCHWIRE")]
pub struct Config {
    /// Interface the HTTP listener binds to.
    #[serde(default = "default_host")]
    #[ortho_config(default = default_host())]
    pub host: String,
    /// TCP port of the HTTP listener. `0` asks the OS for a free port.
    #[serde(default = "default_port")]
    #[ortho_config(default = default_port())]
    pub port: u16,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format of the log sink.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Request bodies larger than this are discarded.
    #[serde(default = "default_max_body_bytes")]
    #[ortho_config(default = default_max_body_bytes())]
    pub max_body_bytes: usize,
    /// Milliseconds allowed for a request body to arrive.
    #[serde(default = "default_body_timeout_ms")]
    #[ortho_config(default = default_body_timeout_ms())]
    pub body_timeout_ms: u64,
    /// Seconds between heartbeat events on long-lived streams.
    #[serde(default = "default_heartbeat_secs")]
    #[ortho_config(default = default_heartbeat_secs())]
    pub heartbeat_secs: u64,
    /// Serves the `/__live` reload stream when enabled.
    #[serde(default = "default_live_reload")]
    #[ortho_config(default = default_live_reload())]
    pub live_reload: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            max_body_bytes: default_max_body_bytes(),
            body_timeout_ms: default_body_timeout_ms(),
            heartbeat_secs: default_heartbeat_secs(),
            live_reload: default_live_reload(),
        }
    }
}

impl Config {
    /// Interface the HTTP listener binds to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port of the HTTP listener.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` pair for display and binding.
    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format of the log sink.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Request body ceiling in bytes.
    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Body buffering timeout, never shorter than one millisecond.
    #[must_use]
    pub fn body_timeout(&self) -> Duration {
        Duration::from_millis(self.body_timeout_ms.max(1))
    }

    /// Interval between heartbeat events.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }

    /// Whether the `/__live` reload stream is served.
    #[must_use]
    pub fn live_reload(&self) -> bool {
        self.live_reload
    }
}
