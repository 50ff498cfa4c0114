//! Session identity carried in a cookie.

use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};
use time::OffsetDateTime;

/// Cookie holding the session id.
pub(crate) const SESSION_COOKIE: &str = "pw_sid";

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Mints a new opaque session id.
pub(crate) fn mint_session_id() -> String {
    let sequence = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    let seed = format!(
        "{}:{sequence}:{}",
        OffsetDateTime::now_utc().unix_timestamp_nanos(),
        process::id()
    );
    let digest = Sha256::digest(seed.as_bytes());
    digest
        .iter()
        .take(16)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Returns `true` when `value` looks like an id minted by this module.
pub(crate) fn is_valid_session_id(value: &str) -> bool {
    value.len() == 32 && value.bytes().all(|byte| byte.is_ascii_hexdigit())
}
