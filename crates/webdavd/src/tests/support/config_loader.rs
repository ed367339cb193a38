//! Configuration loaders for launch scenarios covering success and failure.

use std::sync::Arc;

use webdavd_config::{Config, ConfigError};

use super::fixture::{LOOPBACK_LISTEN, ServerFixture};
use crate::bootstrap::ConfigLoader;

/// Loader that serves a fixture-backed document with the given listen entries.
#[derive(Debug, Clone)]
pub struct TestConfigLoader {
    fixture: Arc<ServerFixture>,
    listen: String,
}

impl TestConfigLoader {
    /// One loopback listener on an ephemeral port.
    pub fn new(fixture: Arc<ServerFixture>) -> Self {
        Self::with_listen(fixture, LOOPBACK_LISTEN)
    }

    pub fn with_listen(fixture: Arc<ServerFixture>, listen: &str) -> Self {
        Self {
            fixture,
            listen: listen.to_owned(),
        }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::from_toml_str(&self.fixture.config_text(&self.listen))
    }
}

/// Loader that fails because the document declares no servers.
#[derive(Debug, Clone, Copy)]
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::from_toml_str("")
    }
}
