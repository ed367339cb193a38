//! Error types for HTTP framing.

use std::io;

use thiserror::Error;

/// Errors raised while reading a request from the client.
#[derive(Debug, Error)]
pub(crate) enum HttpError {
    /// Socket I/O failed.
    #[error("connection I/O failed: {source}")]
    Io {
        #[source]
        source: io::Error,
    },
    /// The client went away before the request was complete.
    #[error("client disconnected mid-request")]
    Disconnected,
    /// The request head exceeded the size or header-count limit.
    #[error("request head exceeds {limit} bytes or too many headers")]
    HeadTooLarge { limit: usize },
    /// The request line names a protocol version other than HTTP/1.x.
    #[error("unsupported protocol version")]
    UnsupportedVersion,
    /// The request head does not parse.
    #[error("malformed request head: {reason}")]
    MalformedHead { reason: String },
    /// The body framing headers are invalid.
    #[error("invalid body framing: {reason}")]
    InvalidFraming { reason: &'static str },
    /// A chunk header or terminator is malformed.
    #[error("malformed chunked body: {reason}")]
    MalformedChunk { reason: &'static str },
}

impl From<io::Error> for HttpError {
    fn from(source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            Self::Disconnected
        } else {
            Self::Io { source }
        }
    }
}

impl HttpError {
    /// Status to answer with when the client is still listening.
    pub(crate) const fn status(&self) -> Option<u16> {
        match self {
            Self::HeadTooLarge { .. } => Some(431),
            Self::UnsupportedVersion => Some(505),
            Self::MalformedHead { .. }
            | Self::InvalidFraming { .. }
            | Self::MalformedChunk { .. } => Some(400),
            Self::Io { .. } | Self::Disconnected => None,
        }
    }
}
