//! Shared doubles and worlds for the crate-level suites.

mod config_loader;
mod http;
mod reporter;
mod world;

pub use config_loader::TestConfigLoader;
pub use http::{PatchStream, body_of, get, post};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
