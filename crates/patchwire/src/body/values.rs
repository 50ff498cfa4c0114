//! Outgoing extra values attached to client-side invocations.

use serde::Serialize;
use serde_json::Value;

use super::{BodyItem, BodyValue};

/// Ordered set of named values sent along with an action request.
///
/// Setting a name twice keeps the last value, mirroring how live form fields
/// override seeded ones on submission.
///
/// # Example
///
/// ```
/// use patchwire::Values;
///
/// let values = Values::new().set("id", "c1").set("step", 2_i64);
/// assert_eq!(values.items().len(), 2);
/// assert_eq!(values.items()[1].kind, "int");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    items: Vec<BodyItem>,
}

impl Values {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any earlier value of that name.
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<BodyValue>) -> Self {
        push(&mut self, name.into(), value.into());
        self
    }

    /// Flattens a serialisable value into dotted names.
    ///
    /// Nested objects and sequences become `outer.inner` and `list.0` paths;
    /// `null` fields are skipped. Integral numbers are tagged `int`, other
    /// numbers `float64`.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error when `value` cannot be represented as
    /// JSON (for example maps with non-string keys).
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let tree = serde_json::to_value(value)?;
        let mut values = Self::new();
        flatten(&mut values, String::new(), tree);
        Ok(values)
    }

    /// Appends every item of `other`, letting it override equal names.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        for item in other.items {
            self.items.retain(|existing| existing.name != item.name);
            self.items.push(item);
        }
        self
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[BodyItem] {
        &self.items
    }

    /// Returns `true` when no values are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consumes the set, returning its items.
    #[must_use]
    pub fn into_items(self) -> Vec<BodyItem> {
        self.items
    }
}

fn flatten(values: &mut Values, prefix: String, node: Value) {
    match node {
        Value::Null => {}
        Value::Object(map) => {
            for (key, child) in map {
                flatten(values, join(&prefix, &key), child);
            }
        }
        Value::Array(children) => {
            for (index, child) in children.into_iter().enumerate() {
                flatten(values, join(&prefix, &index.to_string()), child);
            }
        }
        Value::Bool(flag) => push(values, prefix, BodyValue::Bool(flag)),
        Value::String(text) => push(values, prefix, BodyValue::String(text)),
        Value::Number(number) => {
            let value = match (number.as_i64(), number.as_f64()) {
                (Some(integer), _) => BodyValue::Int(integer),
                (None, Some(float)) => BodyValue::Float(float),
                (None, None) => BodyValue::String(number.to_string()),
            };
            push(values, prefix, value);
        }
    }
}

fn push(values: &mut Values, name: String, value: BodyValue) {
    if name.is_empty() {
        return;
    }
    let (kind, raw) = value.encode();
    values.items.retain(|item| item.name != name);
    values.items.push(BodyItem::new(name, kind, raw));
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}
