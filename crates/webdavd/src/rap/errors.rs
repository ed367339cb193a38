use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;
use webdavd_protocol::{CodecError, DecodeError, Opcode};

use super::ReaperError;

/// Failures while starting or talking to a RAP.
#[derive(Debug, Error)]
pub enum RapError {
    /// The RAP executable could not be started.
    #[error("failed to spawn RAP {binary}: {source}")]
    Spawn {
        /// Executable that failed to start.
        binary: Utf8PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The child reaper is unavailable.
    #[error(transparent)]
    Reaper(#[from] ReaperError),
    /// The channel failed while sending or receiving.
    #[error("RAP channel failed: {source}")]
    Channel {
        /// Underlying codec error.
        #[source]
        source: CodecError,
    },
    /// The reply did not match any known shape.
    #[error("RAP sent an undecodable reply: {source}")]
    Decode {
        /// Underlying decode error.
        #[source]
        source: DecodeError,
    },
    /// The RAP refused the credentials.
    #[error("authentication denied for user {user}")]
    Denied {
        /// User that was refused. The secret is never recorded.
        user: String,
    },
    /// The RAP answered with an opcode that makes no sense at this point.
    #[error("unexpected RAP reply {opcode}")]
    UnexpectedReply {
        /// Opcode received.
        opcode: Opcode,
    },
}

impl From<CodecError> for RapError {
    fn from(source: CodecError) -> Self {
        Self::Channel { source }
    }
}

impl From<DecodeError> for RapError {
    fn from(source: DecodeError) -> Self {
        Self::Decode { source }
    }
}

impl RapError {
    /// HTTP status the client receives for this failure.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Denied { .. } => 401,
            _ => 500,
        }
    }
}
