//! Spawning, authenticating, and releasing RAP subprocesses.

use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};
use webdavd_protocol::{Credentials, Opcode, RapChannel, RapRequest, RapResponse};

use super::{RAP_TARGET, RapError, Reaper};

/// One authenticated RAP, owned by a single request.
///
/// Dropping the session closes the channel, which is the RAP's signal to
/// exit.
pub trait RapSession: Send {
    /// Sends `request` and waits for the paired reply.
    ///
    /// # Errors
    ///
    /// Returns [`RapError`] when the channel fails or the reply does not
    /// decode.
    fn call(&mut self, request: RapRequest) -> Result<RapResponse, RapError>;
}

/// Produces authenticated sessions.
pub trait RapLauncher: Send + Sync {
    /// Session type handed to the dispatcher.
    type Session: RapSession;

    /// Starts a RAP and authenticates `credentials` with it.
    ///
    /// # Errors
    ///
    /// Returns [`RapError::Denied`] when the RAP rejects the credentials and
    /// another [`RapError`] for every other failure. The RAP is destroyed in
    /// both cases.
    fn launch(&self, credentials: &Credentials) -> Result<Self::Session, RapError>;
}

impl<T> RapLauncher for Arc<T>
where
    T: RapLauncher,
{
    type Session = T::Session;

    fn launch(&self, credentials: &Credentials) -> Result<Self::Session, RapError> {
        (**self).launch(credentials)
    }
}

/// Launches the configured RAP executable for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawningLauncher {
    binary: Utf8PathBuf,
    timeout: Duration,
}

impl SpawningLauncher {
    /// Creates a launcher for `binary` whose replies must arrive within
    /// `timeout`.
    #[must_use]
    pub fn new(binary: impl Into<Utf8PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Executable started for each request.
    #[must_use]
    pub fn binary(&self) -> &Utf8Path {
        &self.binary
    }

    fn spawn(&self, user: &str) -> Result<SpawnedRap, RapError> {
        let reaper = Reaper::global()?;
        let (channel, child_end) = RapChannel::pair()?;
        let child_end = child_end.into_owned_fd();
        let stdin = child_end.try_clone().map_err(|source| self.spawn_error(source))?;

        let mut command = Command::new(self.binary.as_std_path());
        command
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(child_end))
            .stderr(Stdio::inherit());
        let pid = reaper
            .spawn(command)
            .map_err(|source| self.spawn_error(source))?;

        channel.set_receive_timeout(Some(self.timeout))?;
        Ok(SpawnedRap {
            pid,
            user: user.to_owned(),
            channel,
        })
    }

    fn spawn_error(&self, source: std::io::Error) -> RapError {
        RapError::Spawn {
            binary: self.binary.clone(),
            source,
        }
    }
}

impl RapLauncher for SpawningLauncher {
    type Session = SpawnedRap;

    fn launch(&self, credentials: &Credentials) -> Result<SpawnedRap, RapError> {
        let mut rap = self.spawn(credentials.user())?;
        let reply = rap.call(RapRequest::Authenticate(credentials.clone()))?;
        match reply {
            RapResponse::Success {
                status: Opcode::RespondOk,
                ..
            } => {
                debug!(target: RAP_TARGET, pid = rap.pid, user = %rap.user, "RAP authenticated");
                Ok(rap)
            }
            RapResponse::Failure {
                status: Opcode::RespondAuthFailed,
                ..
            } => Err(RapError::Denied {
                user: credentials.user().to_owned(),
            }),
            other => {
                warn!(
                    target: RAP_TARGET,
                    pid = rap.pid,
                    opcode = %other.opcode(),
                    "unexpected reply to authentication"
                );
                Err(RapError::UnexpectedReply {
                    opcode: other.opcode(),
                })
            }
        }
    }
}

/// A RAP subprocess together with the listener's end of its channel.
#[derive(Debug)]
pub struct SpawnedRap {
    pid: u32,
    user: String,
    channel: RapChannel,
}

impl SpawnedRap {
    /// Process id of the RAP.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// User the RAP was started for.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }
}

impl RapSession for SpawnedRap {
    fn call(&mut self, request: RapRequest) -> Result<RapResponse, RapError> {
        let message = request.into_message()?;
        let reply = self.channel.send_recv(&message)?;
        Ok(RapResponse::try_from(reply)?)
    }
}

impl Drop for SpawnedRap {
    fn drop(&mut self) {
        debug!(target: RAP_TARGET, pid = self.pid, user = %self.user, "released RAP");
    }
}
