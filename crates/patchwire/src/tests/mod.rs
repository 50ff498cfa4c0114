//! Crate-level suites: bootstrap lifecycle and end-to-end runtime scenarios.

mod behaviour;
mod support;
