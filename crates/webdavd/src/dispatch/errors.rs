//! Error types for request dispatch failures.

use std::io;

use thiserror::Error;
use webdavd_protocol::{DecodeError, Opcode};

use crate::rap::RapError;

/// Failures that end a request with an error status.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Launching, authenticating, or calling the RAP failed.
    #[error(transparent)]
    Rap(#[from] RapError),
    /// The request could not be expressed as a RAP operation.
    #[error("failed to build RAP request: {source}")]
    Request {
        /// Underlying decode error.
        #[source]
        source: DecodeError,
    },
    /// The authenticated user has no account entry.
    #[error("no home directory for user {user}")]
    UnknownUser {
        /// User that was looked up.
        user: String,
    },
    /// Looking up the user's account failed.
    #[error("failed to look up home directory for {user}: {source}")]
    HomeLookup {
        /// User that was looked up.
        user: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The RAP rejected a request the listener built.
    #[error("RAP rejected the request as malformed")]
    RejectedRequest,
    /// The RAP replied with something that does not answer the request.
    #[error("unexpected RAP reply {opcode}")]
    UnexpectedReply {
        /// Opcode received.
        opcode: Opcode,
    },
    /// An upload was granted a handle that cannot be written.
    #[error("RAP granted a read-only handle for an upload")]
    ReadOnlyUpload,
    /// A transferred handle could not be inspected or opened.
    #[error("unusable transferred handle: {source}")]
    Handle {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl From<DecodeError> for DispatchError {
    fn from(source: DecodeError) -> Self {
        Self::Request { source }
    }
}

impl DispatchError {
    /// HTTP status the client receives for this failure.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Rap(error) => error.status(),
            _ => 500,
        }
    }
}
