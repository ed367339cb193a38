use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::session::SessionTimeoutError;

/// Reasons a configuration cannot be loaded. All of them are fatal at
/// startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// File that was read.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The document is not valid TOML or does not match the schema.
    #[error("invalid configuration in {origin}: {source}")]
    Parse {
        /// File name or `<inline>`.
        origin: String,
        /// Parser failure, including unknown keys and out-of-range numbers.
        #[source]
        source: toml::de::Error,
    },
    /// No `[[server]]` table was given.
    #[error("configuration declares no servers")]
    NoServers,
    /// A server has no `[[server.listen]]` entry.
    #[error("server {server} declares no listen entries")]
    NoListen {
        /// Zero-based server index.
        server: usize,
    },
    /// The session-timeout text did not parse.
    #[error("server {server} has invalid session-timeout `{value}`: {source}")]
    SessionTimeout {
        /// Zero-based server index.
        server: usize,
        /// Rejected text.
        value: String,
        /// Parse failure.
        #[source]
        source: SessionTimeoutError,
    },
    /// A TLS listener was declared without any certificate bundle.
    #[error("server {server} listens with TLS on port {port} but has no ssl-cert entry")]
    MissingCertificate {
        /// Zero-based server index.
        server: usize,
        /// Port of the TLS listener.
        port: u16,
    },
    /// Servers disagree on the restricted user.
    #[error("all servers must use the same restricted user, found {first:?} and {other:?}")]
    RestrictedMismatch {
        /// Restricted user of the first server.
        first: Option<String>,
        /// Conflicting value.
        other: Option<String>,
    },
}
