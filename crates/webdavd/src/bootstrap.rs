//! Daemon bootstrap orchestration.

use std::sync::Arc;

use thiserror::Error;
use webdavd_config::{Config, ConfigError, DaemonArgs};

use crate::content::ContentError;
use crate::context::ServerContext;
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration cannot be read or is
    /// invalid.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that reads the file named on the command line.
#[derive(Debug, Clone)]
pub struct SystemConfigLoader {
    args: DaemonArgs,
}

impl SystemConfigLoader {
    /// Creates a loader for parsed command-line arguments.
    #[must_use]
    pub const fn new(args: DaemonArgs) -> Self {
        Self { args }
    }
}

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load_from_args(&self.args)
    }
}

/// Loader that returns a pre-built configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already validated configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// A server's MIME table or static pages failed to load.
    #[error("failed to load content for server {server}: {source}")]
    Content {
        /// Index of the `[[server]]` entry.
        server: usize,
        /// Underlying content error.
        #[source]
        source: ContentError,
    },
}

/// Result of a successful bootstrap invocation.
#[derive(Debug)]
pub struct Daemon {
    config: Config,
    contexts: Vec<Arc<ServerContext>>,
    telemetry: TelemetryHandle,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Number of servers with loaded content.
    #[must_use]
    pub fn server_count(&self) -> usize {
        self.contexts.len()
    }

    pub(crate) fn contexts(&self) -> &[Arc<ServerContext>] {
        &self.contexts
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry, or server
/// content fails to load. The reporter sees the failure first.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();
    match bootstrap_inner(loader) {
        Ok(daemon) => {
            reporter.bootstrap_succeeded(&daemon.config);
            Ok(daemon)
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

fn bootstrap_inner(loader: &dyn ConfigLoader) -> Result<Daemon, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    let contexts = config
        .servers()
        .iter()
        .enumerate()
        .map(|(server, settings)| {
            ServerContext::load(settings.clone())
                .map(Arc::new)
                .map_err(|source| BootstrapError::Content { server, source })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Daemon {
        config,
        contexts,
        telemetry,
    })
}
