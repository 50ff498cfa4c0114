//! Configuration loaders for the success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use patchwire_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader that binds an ephemeral loopback port.
#[derive(Debug, Default)]
pub struct TestConfigLoader;

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            host: "127.0.0.1".to_owned(),
            port: 0,
            heartbeat_secs: 1,
            ..Config::default()
        })
    }
}

/// Loader that fails by passing an unparseable port on the command line.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("patchwire"),
            OsString::from("--port"),
            OsString::from("not-a-port"),
        ];
        Config::load_from_iter(args)
    }
}
