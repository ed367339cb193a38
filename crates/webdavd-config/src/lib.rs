//! Configuration for `webdavd`.
//!
//! The daemon reads one TOML document holding one or more `[[server]]`
//! tables. Loading validates everything up front and produces an immutable
//! [`Config`] snapshot; any problem is a [`ConfigError`] and stops startup.

mod cli;
pub mod defaults;
mod document;
mod error;
mod listen;
mod server;
mod session;

use std::fs;

use camino::Utf8Path;

pub use self::cli::{DaemonArgs, LogFormat};
pub use self::defaults::{DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
pub use self::error::ConfigError;
pub use self::listen::{Encryption, ForwardTo, ListenSpec};
pub use self::server::{CertificateBundle, ServerConfig};
pub use self::session::{SessionTimeoutError, parse_session_timeout};

use self::document::Document;

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Validated configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    servers: Vec<ServerConfig>,
    log_filter: String,
    log_format: LogFormat,
}

impl Config {
    /// Reads and validates the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or fails
    /// validation.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path.as_str())
    }

    /// Loads the file named by the command line and applies logging
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] as for [`Config::load`].
    pub fn load_from_args(args: &DaemonArgs) -> Result<Self, ConfigError> {
        let config = Self::load(&args.config)?;
        Ok(config.with_logging(args.log_filter.clone(), args.log_format))
    }

    /// Validates an in-memory document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, "<inline>")
    }

    fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let document: Document = toml::from_str(text).map_err(|source| ConfigError::Parse {
            origin: origin.to_owned(),
            source,
        })?;
        if document.server.is_empty() {
            return Err(ConfigError::NoServers);
        }

        let servers = document
            .server
            .into_iter()
            .enumerate()
            .map(|(index, server)| ServerConfig::from_document(index, server))
            .collect::<Result<Vec<_>, _>>()?;

        let first = servers.first().and_then(ServerConfig::restricted_user);
        if let Some(other) = servers
            .iter()
            .map(ServerConfig::restricted_user)
            .find(|user| *user != first)
        {
            return Err(ConfigError::RestrictedMismatch {
                first: first.map(str::to_owned),
                other: other.map(str::to_owned),
            });
        }

        Ok(Self {
            servers,
            log_filter: defaults::default_log_filter_string(),
            log_format: defaults::default_log_format(),
        })
    }

    /// Replaces the logging settings where an override is given.
    #[must_use]
    pub fn with_logging(mut self, filter: Option<String>, format: Option<LogFormat>) -> Self {
        if let Some(filter) = filter {
            self.log_filter = filter;
        }
        if let Some(format) = format {
            self.log_format = format;
        }
        self
    }

    /// Configured servers, in document order. Never empty.
    #[must_use]
    pub fn servers(&self) -> &[ServerConfig] {
        &self.servers
    }

    /// The restricted user every server agreed on.
    #[must_use]
    pub fn restricted_user(&self) -> Option<&str> {
        self.servers.first().and_then(ServerConfig::restricted_user)
    }

    /// Returns the log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Error log of the first server, which the process-wide subscriber uses.
    #[must_use]
    pub fn error_log(&self) -> Option<&Utf8Path> {
        self.servers.first().and_then(ServerConfig::error_log)
    }

    /// Access log of the first server.
    #[must_use]
    pub fn access_log(&self) -> Option<&Utf8Path> {
        self.servers.first().and_then(ServerConfig::access_log)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::*;

    const FULL: &str = r#"
        [[server]]
        restricted = "nobody"
        session-timeout = "1:00:00"
        max-ip-connections = 5
        rap-timeout = 30
        mime-file = "/srv/mime.types"
        rap-binary = "/opt/rap"
        auth-service = "dav"
        access-log = "/var/log/dav/access.log"
        static-response-dir = "/srv/pages/"

        [[server.listen]]
        port = 8080
        host = "127.0.0.1"

        [[server.listen]]
        port = 8081
        forward-to = { port = 443 }
    "#;

    #[rstest]
    fn full_document_is_honoured() {
        let config = Config::from_toml_str(FULL).expect("config loads");
        let server = config.servers().first().expect("one server");
        assert_eq!(config.restricted_user(), Some("nobody"));
        assert_eq!(server.session_timeout(), Duration::from_secs(3600));
        assert_eq!(server.max_ip_connections(), 5);
        assert_eq!(server.rap_timeout(), Duration::from_secs(30));
        assert_eq!(server.rap_binary().as_str(), "/opt/rap");
        assert_eq!(server.auth_service(), "dav");
        assert_eq!(server.static_response_dir().as_str(), "/srv/pages");
        assert_eq!(config.access_log().map(Utf8Path::as_str), Some("/var/log/dav/access.log"));
        assert_eq!(config.error_log(), None);

        let redirect = server
            .listen()
            .get(1)
            .and_then(ListenSpec::forward_to)
            .expect("forward target");
        assert_eq!(redirect.encryption(), Encryption::Tls);
    }

    #[rstest]
    fn omitted_values_take_defaults() {
        let config = Config::from_toml_str("[[server]]\n[[server.listen]]\nport = 80\n")
            .expect("config loads");
        let server = config.servers().first().expect("one server");
        assert_eq!(server.max_ip_connections(), 20);
        assert_eq!(server.session_timeout(), Duration::from_secs(300));
        assert_eq!(server.rap_timeout(), Duration::from_secs(120));
        assert_eq!(server.mime_file().as_str(), "/etc/mime.types");
        assert_eq!(server.rap_binary().as_str(), "/usr/sbin/webdav-rap");
        assert_eq!(server.static_response_dir().as_str(), "/usr/share/webdav");
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[rstest]
    fn logging_overrides_replace_defaults() {
        let config = Config::from_toml_str("[[server]]\n[[server.listen]]\nport = 80\n")
            .expect("config loads")
            .with_logging(Some("debug".into()), Some(LogFormat::Compact));
        assert_eq!(config.log_filter(), "debug");
        assert_eq!(config.log_format(), LogFormat::Compact);
    }
}
