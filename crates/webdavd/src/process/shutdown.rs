use std::fmt;
use std::io;

use nix::sys::signal::Signal;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;

/// Signals that stop the listener process.
const TERMINATING_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Why the daemon stopped serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// A terminating signal arrived.
    Signal(Signal),
    /// The signal source ended without delivering a signal, or an embedding
    /// caller asked for shutdown directly.
    Requested,
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(signal) => formatter.write_str(signal.as_str()),
            Self::Requested => formatter.write_str("requested"),
        }
    }
}

/// Blocks the launch sequence until the daemon should stop.
pub trait ShutdownSignal: Send + Sync {
    /// Returns once shutdown should begin.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the notification source cannot be set
    /// up.
    fn wait(&self) -> Result<ShutdownCause, ShutdownError>;
}

/// Failure to listen for shutdown notifications.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Registering the terminating signals failed.
    #[error("failed to register termination signals: {source}")]
    Register {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Waits for `SIGTERM`, `SIGINT`, `SIGQUIT`, or `SIGHUP`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<ShutdownCause, ShutdownError> {
        let mut signals = Signals::new(TERMINATING_SIGNALS)
            .map_err(|source| ShutdownError::Register { source })?;
        let cause = signals
            .forever()
            .next()
            .and_then(|raw| Signal::try_from(raw).ok())
            .map_or(ShutdownCause::Requested, ShutdownCause::Signal);
        Ok(cause)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ShutdownCause::Signal(Signal::SIGTERM), "SIGTERM")]
    #[case(ShutdownCause::Signal(Signal::SIGHUP), "SIGHUP")]
    #[case(ShutdownCause::Requested, "requested")]
    fn causes_render_for_logs(#[case] cause: ShutdownCause, #[case] expected: &str) {
        assert_eq!(cause.to_string(), expected);
    }
}
