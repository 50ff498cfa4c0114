//! Built-in defaults shared by the server binary and embedding applications.

/// Default interface the HTTP listener binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default TCP port for the HTTP listener.
pub const DEFAULT_PORT: u16 = 8080;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Largest request body buffered before it is discarded.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Time allowed for a request body to arrive, in milliseconds.
pub const DEFAULT_BODY_TIMEOUT_MS: u64 = 5_000;

/// Interval between `ping` events on long-lived streams, in seconds.
pub const DEFAULT_HEARTBEAT_SECS: u64 = 15;

/// Default interface the HTTP listener binds to.
pub fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

/// Default TCP port for the HTTP listener.
pub fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default request body ceiling.
pub fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default body buffering timeout.
pub fn default_body_timeout_ms() -> u64 {
    DEFAULT_BODY_TIMEOUT_MS
}

/// Default heartbeat interval for event streams.
pub fn default_heartbeat_secs() -> u64 {
    DEFAULT_HEARTBEAT_SECS
}

/// Live reload is enabled unless switched off.
pub fn default_live_reload() -> bool {
    true
}
