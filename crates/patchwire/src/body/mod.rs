//! Request body items and their typed decoding.
//!
//! Action requests carry a flat JSON array of `{name, type, value}` triples.
//! Names are dotted paths (`Filter.0.Dates.From`) and the `type` tag selects
//! how the string value is coerced. [`decode`] folds such a list into any
//! serde-compatible target, creating nested containers along the way, and
//! never fails: whatever cannot be applied is left at its prior value.

mod decode;
mod values;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use tracing::debug;

pub use self::decode::{MAX_ARRAY_INDEX, MAX_PATH_SEGMENTS, decode};
pub use self::values::Values;

pub(crate) const BODY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::body");

/// Type tag used for plain strings.
pub const TAG_STRING: &str = "string";
/// Type tag used for integers.
pub const TAG_INT: &str = "int";
/// Type tag used for non-integral numbers.
pub const TAG_FLOAT: &str = "float64";
/// Type tag used for booleans.
pub const TAG_BOOL: &str = "bool";
/// Type tag used for date-time values.
pub const TAG_TIME: &str = "Time";

/// One named value of a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyItem {
    /// Dotted field path.
    pub name: String,
    /// Declared type tag.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Raw value as sent by the browser.
    #[serde(default)]
    pub value: String,
}

impl BodyItem {
    /// Creates an item from its parts.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Coerces the raw value according to the type tag.
    ///
    /// Returns `None` only for date-time tags whose value cannot be parsed;
    /// numeric tags degrade to zero and unknown tags keep the raw string.
    #[must_use]
    pub fn coerce(&self) -> Option<BodyValue> {
        match self.kind.as_str() {
            "date" | "time" | "datetime-local" | "Time" => parse_time(&self.value).map(BodyValue::Time),
            "float64" => Some(BodyValue::Float(self.value.trim().parse().unwrap_or(0.0))),
            // Only the exact literal counts as true.
            "bool" | "checkbox" => Some(BodyValue::Bool(self.value == "true")),
            "int" | "int64" | "number" => Some(BodyValue::Int(self.value.trim().parse().unwrap_or(0))),
            _ => Some(BodyValue::String(self.value.clone())),
        }
    }
}

/// Typed intermediate value of a body item.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyValue {
    /// Raw text.
    String(String),
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Date-time value.
    Time(OffsetDateTime),
}

impl BodyValue {
    /// Encodes the value as a `(type, value)` pair for the wire.
    #[must_use]
    pub fn encode(&self) -> (&'static str, String) {
        match self {
            Self::String(text) => (TAG_STRING, text.clone()),
            Self::Int(number) => (TAG_INT, number.to_string()),
            Self::Float(number) if is_integral(*number) => (TAG_INT, format!("{number:.0}")),
            Self::Float(number) => (TAG_FLOAT, number.to_string()),
            Self::Bool(flag) => (TAG_BOOL, flag.to_string()),
            Self::Time(moment) => (TAG_TIME, moment.format(&Rfc3339).unwrap_or_default()),
        }
    }

    /// Converts the value into the JSON node assigned during decoding.
    ///
    /// Date-time values become RFC 3339 strings so that fields declared with
    /// `time::serde::rfc3339` accept them.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(text) => serde_json::Value::String(text.clone()),
            Self::Int(number) => serde_json::Value::from(*number),
            Self::Float(number) => serde_json::Number::from_f64(*number)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Bool(flag) => serde_json::Value::Bool(*flag),
            Self::Time(moment) => moment
                .format(&Rfc3339)
                .map_or(serde_json::Value::Null, serde_json::Value::String),
        }
    }
}

impl From<&str> for BodyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for BodyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for BodyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for BodyValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for BodyValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for BodyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for BodyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<OffsetDateTime> for BodyValue {
    fn from(value: OffsetDateTime) -> Self {
        Self::Time(value)
    }
}

/// Parses a request body into items.
///
/// Malformed or empty bodies yield an empty list rather than an error.
#[must_use]
pub fn parse_items(bytes: &[u8]) -> Vec<BodyItem> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Vec::new();
    }
    match serde_json::from_slice(bytes) {
        Ok(items) => items,
        Err(error) => {
            debug!(target: BODY_TARGET, %error, "ignoring malformed request body");
            Vec::new()
        }
    }
}

fn is_integral(number: f64) -> bool {
    // Beyond 2^53 not every integer is representable, so keep the float form.
    number.is_finite() && number.fract() == 0.0 && number.abs() < 9_007_199_254_740_992.0
}

/// Parses the date-time shapes produced by browsers and by [`BodyValue::encode`].
fn parse_time(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(moment);
    }
    let local_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let local_minutes = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    if let Ok(moment) = PrimitiveDateTime::parse(raw, local_seconds)
        .or_else(|_| PrimitiveDateTime::parse(raw, local_minutes))
    {
        return Some(moment.assume_offset(UtcOffset::UTC));
    }
    if let Ok(day) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Some(day.midnight().assume_offset(UtcOffset::UTC));
    }
    let clock_seconds = format_description!("[hour]:[minute]:[second]");
    let clock_minutes = format_description!("[hour]:[minute]");
    Time::parse(raw, clock_seconds)
        .or_else(|_| Time::parse(raw, clock_minutes))
        .ok()
        .map(|clock| OffsetDateTime::UNIX_EPOCH.replace_time(clock))
}
