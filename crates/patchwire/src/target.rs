//! Addressable regions of rendered HTML.
//!
//! A [`Target`] pairs a process-unique element id with the default [`Swap`]
//! mode used when new HTML arrives for it. Targets are usually created once
//! per logical UI region and captured by the handlers that render into it.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

static NEXT_TARGET: AtomicU64 = AtomicU64::new(1);

/// How new HTML replaces the existing HTML at a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Swap {
    /// Replace the element's inner content.
    #[default]
    Inline,
    /// Replace the element itself.
    Outline,
    /// Insert after the element's last child.
    Append,
    /// Insert before the element's first child.
    Prepend,
    /// Leave the DOM untouched; the call only has side effects.
    None,
}

impl Swap {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Outline => "outline",
            Self::Append => "append",
            Self::Prepend => "prepend",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Swap {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when a swap mode string is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown swap mode '{0}'")]
pub struct UnknownSwap(String);

impl FromStr for Swap {
    type Err = UnknownSwap;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "outline" => Ok(Self::Outline),
            "append" => Ok(Self::Append),
            "prepend" => Ok(Self::Prepend),
            "none" => Ok(Self::None),
            _ => Err(UnknownSwap(value.to_owned())),
        }
    }
}

/// Identifier and default swap mode of a patchable region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    id: String,
    swap: Swap,
}

impl Target {
    /// Creates a target with a fresh process-unique id and inline swapping.
    #[must_use]
    pub fn new() -> Self {
        let sequence = NEXT_TARGET.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("t-{sequence}"),
            swap: Swap::Inline,
        }
    }

    /// Returns a copy of this target that defaults to another swap mode.
    #[must_use]
    pub fn with_swap(&self, swap: Swap) -> Self {
        Self {
            id: self.id.clone(),
            swap,
        }
    }

    /// Element id of the region.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Default swap mode.
    #[must_use]
    pub fn swap(&self) -> Swap {
        self.swap
    }

    /// Renders the `id` attribute for the region's root element.
    #[must_use]
    pub fn attr(&self) -> String {
        format!("id=\"{}\"", self.id)
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.id)
    }
}
