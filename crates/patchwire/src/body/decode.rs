//! Folding body items into a typed target.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::{BODY_TARGET, BodyItem};

/// Deepest dotted name that is applied.
pub const MAX_PATH_SEGMENTS: usize = 32;
/// Largest array index a dotted name may address.
pub const MAX_ARRAY_INDEX: usize = 1024;

/// Applies `items` to `target`, returning how many items were applied.
///
/// The target's current value is serialised into a JSON tree, every item's
/// dotted name is walked (objects are created for missing segments, arrays
/// for numeric ones) and the coerced value is assigned at the leaf. The tree
/// is then deserialised back into the target. When the combined result does
/// not fit the target type, items are applied one by one and only those that
/// fit are kept. The target is never left half-written: it is either replaced
/// by a fully deserialised value or untouched.
pub fn decode<T>(items: &[BodyItem], target: &mut T) -> usize
where
    T: Serialize + DeserializeOwned,
{
    if items.is_empty() {
        return 0;
    }
    let base = match serde_json::to_value(&*target) {
        Ok(base) => base,
        Err(error) => {
            debug!(target: BODY_TARGET, %error, "target cannot be represented as JSON");
            return 0;
        }
    };

    let assignments: Vec<(Vec<&str>, Value)> = items
        .iter()
        .filter(|item| !item.name.is_empty())
        .filter_map(|item| {
            let Some(segments) = path_segments(&item.name) else {
                debug!(
                    target: BODY_TARGET,
                    field = %truncated(&item.name),
                    "body field path exceeds limits; skipping"
                );
                return None;
            };
            item.coerce().map(|value| (segments, value.to_json()))
        })
        .collect();

    let mut combined = base.clone();
    for (segments, value) in &assignments {
        assign(&mut combined, segments, value.clone());
    }
    if let Ok(decoded) = serde_json::from_value::<T>(combined) {
        *target = decoded;
        return assignments.len();
    }

    let mut tree = base;
    let mut applied = 0;
    for (segments, value) in assignments {
        let mut candidate = tree.clone();
        if !assign(&mut candidate, &segments, value) {
            continue;
        }
        match serde_json::from_value::<T>(candidate.clone()) {
            Ok(_) => {
                tree = candidate;
                applied += 1;
            }
            Err(error) => {
                debug!(
                    target: BODY_TARGET,
                    field = %segments.join("."),
                    %error,
                    "skipping body field"
                );
            }
        }
    }
    if applied > 0
        && let Ok(decoded) = serde_json::from_value::<T>(tree)
    {
        *target = decoded;
    }
    applied
}

/// Splits a dotted name, or `None` when it is too deep or addresses an
/// array index beyond [`MAX_ARRAY_INDEX`].
pub(crate) fn path_segments(name: &str) -> Option<Vec<&str>> {
    let segments: Vec<&str> = name.splitn(MAX_PATH_SEGMENTS + 1, '.').collect();
    if segments.len() > MAX_PATH_SEGMENTS {
        return None;
    }
    let oversized = segments
        .iter()
        .filter_map(|segment| segment.parse::<usize>().ok())
        .any(|index| index > MAX_ARRAY_INDEX);
    (!oversized).then_some(segments)
}

/// Assigns `leaf` at the path below `root`, returning `false` when the path
/// could not be walked.
pub(crate) fn assign(root: &mut Value, segments: &[&str], leaf: Value) -> bool {
    let mut node = root;
    for (position, segment) in segments.iter().enumerate() {
        let next = segments.get(position + 1).copied();
        match child_slot(node, segment, next) {
            Some(child) => node = child,
            None => return false,
        }
    }
    *node = leaf;
    true
}

/// Returns the slot for `segment` inside `node`, converting `node` into a
/// container first when it is not one of the right shape.
fn child_slot<'a>(node: &'a mut Value, segment: &str, next: Option<&str>) -> Option<&'a mut Value> {
    let index = segment.parse::<usize>().ok();
    let fits = node.is_object() || (node.is_array() && index.is_some());
    if !fits {
        *node = if index.is_some() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
    }

    match (node, index) {
        (Value::Array(items), Some(index)) => {
            if items.len() <= index {
                items.resize_with(index + 1, || placeholder(next));
            }
            items.get_mut(index)
        }
        (Value::Object(map), _) => Some(
            map.entry(segment.to_owned())
                .or_insert_with(|| placeholder(next)),
        ),
        _ => None,
    }
}

fn placeholder(next: Option<&str>) -> Value {
    match next {
        None => Value::Null,
        Some(segment) if segment.parse::<usize>().is_ok() => Value::Array(Vec::new()),
        Some(_) => Value::Object(Map::new()),
    }
}

/// Leading part of an over-long name, for logging.
fn truncated(name: &str) -> &str {
    let end = name
        .char_indices()
        .nth(64)
        .map_or(name.len(), |(position, _)| position);
    name.get(..end).unwrap_or(name)
}
