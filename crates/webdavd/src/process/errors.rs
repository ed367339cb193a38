//! Defines the error surface for daemon launch and supervision.

use std::io;

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::rap::ReaperError;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the daemon process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrapping the daemon failed.
    #[error("daemon bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// A listen entry asks for TLS, which this build does not terminate.
    #[error("listener {endpoint} requests TLS, which is not supported")]
    TlsUnsupported {
        /// Listen entry.
        endpoint: String,
    },
    /// A listener failed to bind or start.
    #[error("listener failed: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
    /// The restricted account does not exist.
    #[error("restricted user {user} does not exist")]
    UnknownRestrictedUser {
        /// Configured account.
        user: String,
    },
    /// Switching to the restricted account failed.
    #[error("failed to switch to restricted user {user}: {source}")]
    Privileges {
        /// Configured account.
        user: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The child reaper could not be started.
    #[error("failed to start child reaper: {source}")]
    Reaper {
        /// Underlying reaper error.
        #[source]
        source: ReaperError,
    },
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<ListenerError> for LaunchError {
    fn from(source: ListenerError) -> Self {
        Self::Listener { source }
    }
}

impl From<ReaperError> for LaunchError {
    fn from(source: ReaperError) -> Self {
        Self::Reaper { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}
