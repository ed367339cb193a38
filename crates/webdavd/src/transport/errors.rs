//! Failures binding or running a listen socket.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced while binding or running a listener. `endpoint` is the
/// configured `host:port`.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Name resolution for the listen host failed.
    #[error("listen address {endpoint} does not resolve: {source}")]
    Unresolvable {
        /// Configured endpoint.
        endpoint: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// Name resolution succeeded but produced no socket address.
    #[error("listen address {endpoint} resolved to no socket address")]
    NoAddress {
        /// Configured endpoint.
        endpoint: String,
    },
    /// The socket could not be bound, typically because the port is taken or
    /// privileged.
    #[error("cannot bind {endpoint} ({addr}): {source}")]
    Bind {
        /// Configured endpoint.
        endpoint: String,
        /// Resolved address that was tried.
        addr: SocketAddr,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The socket could not be switched to non-blocking accepts.
    #[error("cannot poll {endpoint} for connections: {source}")]
    NonBlocking {
        /// Configured endpoint.
        endpoint: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The accept thread could not be started.
    #[error("cannot start the accept thread for {endpoint}: {source}")]
    Thread {
        /// Configured endpoint.
        endpoint: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked.
    #[error("accept thread for {endpoint} panicked")]
    AcceptPanicked {
        /// Configured endpoint.
        endpoint: String,
    },
}
