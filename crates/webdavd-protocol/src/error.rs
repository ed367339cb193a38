//! Error types for framing, typed decoding, and lock tokens.

use std::io;

use thiserror::Error;

use crate::Opcode;

/// Failures while moving datagrams across a [`crate::RapChannel`].
#[derive(Debug, Error)]
pub enum CodecError {
    /// More parameters than a message can carry.
    #[error("message carries {count} parameters, limit is {limit}", limit = crate::MAX_MESSAGE_PARAMS)]
    TooManyParams {
        /// Parameter count that was attempted.
        count: usize,
    },
    /// The framed message would not fit in one datagram.
    #[error("message of {size} bytes exceeds the {limit} byte datagram limit", limit = crate::MAX_MESSAGE_BYTES)]
    MessageTooLarge {
        /// Framed size in bytes.
        size: usize,
    },
    /// The peer sent a datagram larger than the receive buffer, or its
    /// ancillary data was cut short.
    #[error("received datagram was truncated")]
    Truncated,
    /// The datagram header does not describe the datagram.
    #[error("malformed message header: {reason}")]
    Malformed {
        /// What was wrong with the header.
        reason: &'static str,
    },
    /// The opcode is not part of the protocol.
    #[error("unknown opcode {code}")]
    UnknownOpcode {
        /// Raw opcode value.
        code: u32,
    },
    /// More than one descriptor arrived with a single datagram.
    #[error("received {count} file descriptors where at most one is allowed")]
    UnexpectedHandles {
        /// Number of descriptors received (all of them are closed).
        count: usize,
    },
    /// The peer closed its end while a reply was expected.
    #[error("channel closed unexpectedly")]
    Closed,
    /// No reply arrived before the receive timeout elapsed.
    #[error("timed out waiting for a reply")]
    Timeout,
    /// A socket system call failed.
    #[error("failed to {operation} on RAP channel: {source}")]
    Io {
        /// The operation being performed.
        operation: &'static str,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl CodecError {
    pub(crate) fn io(operation: &'static str, source: impl Into<io::Error>) -> Self {
        Self::Io {
            operation,
            source: source.into(),
        }
    }
}

/// Failures converting a [`crate::Message`] into a typed request or reply.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The opcode is valid but not expected in this direction.
    #[error("unexpected opcode {opcode}")]
    UnexpectedOpcode {
        /// Offending opcode.
        opcode: Opcode,
    },
    /// The parameter count does not fit the opcode.
    #[error("{opcode} carries {actual} parameters, expected {expected}")]
    ParamCount {
        /// Opcode being decoded.
        opcode: Opcode,
        /// Human readable expectation.
        expected: &'static str,
        /// Parameters present.
        actual: usize,
    },
    /// A parameter slot is not valid UTF-8.
    #[error("{opcode} parameter {slot} is not valid UTF-8")]
    NotUtf8 {
        /// Opcode being decoded.
        opcode: Opcode,
        /// Zero-based parameter index.
        slot: usize,
    },
    /// A required parameter slot is empty.
    #[error("{opcode} parameter {slot} must not be empty")]
    EmptyParam {
        /// Opcode being decoded.
        opcode: Opcode,
        /// Zero-based parameter index.
        slot: usize,
    },
    /// A reply that must carry a descriptor arrived without one.
    #[error("{opcode} requires a file handle")]
    MissingHandle {
        /// Opcode being decoded.
        opcode: Opcode,
    },
    /// A descriptor arrived with an opcode that never carries one.
    #[error("{opcode} must not carry a file handle")]
    UnexpectedHandle {
        /// Opcode being decoded.
        opcode: Opcode,
    },
    /// Inspecting the received descriptor failed.
    #[error("failed to inspect received file handle: {source}")]
    Handle {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// A lock token slot did not parse.
    #[error(transparent)]
    LockToken(#[from] LockTokenError),
}

/// Failures parsing the textual lock token form.
#[derive(Debug, Error)]
pub enum LockTokenError {
    /// The text lacks the `urn:uuid:` prefix or the closing bracket.
    #[error("lock token `{text}` is not of the form <urn:uuid:VALUE>")]
    Shape {
        /// Text that was rejected.
        text: String,
    },
    /// The UUID portion is invalid.
    #[error("lock token `{text}` has an invalid UUID: {source}")]
    Uuid {
        /// Text that was rejected.
        text: String,
        /// Parser failure.
        #[source]
        source: uuid::Error,
    },
}
