//! The positional message that crosses the socket.

use std::fmt;

use crate::{CodecError, MAX_MESSAGE_PARAMS, Opcode, TransferredHandle};

/// One protocol datagram: an opcode, up to eight byte-string parameters, and
/// an optional transferred descriptor.
///
/// `Debug` output lists parameter lengths only, so credentials never reach a
/// log line through a formatted message.
pub struct Message {
    opcode: Opcode,
    handle: Option<TransferredHandle>,
    params: Vec<Vec<u8>>,
}

impl Message {
    /// Builds a message without a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TooManyParams`] when more than
    /// [`MAX_MESSAGE_PARAMS`] parameters are supplied.
    pub fn new(opcode: Opcode, params: Vec<Vec<u8>>) -> Result<Self, CodecError> {
        if params.len() > MAX_MESSAGE_PARAMS {
            return Err(CodecError::TooManyParams {
                count: params.len(),
            });
        }
        Ok(Self {
            opcode,
            handle: None,
            params,
        })
    }

    /// Attaches a descriptor to send alongside the parameters.
    #[must_use]
    pub fn with_handle(mut self, handle: TransferredHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// The message opcode.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// All parameters in slot order.
    #[must_use]
    pub fn params(&self) -> &[Vec<u8>] {
        &self.params
    }

    /// The parameter at `slot`, if present.
    #[must_use]
    pub fn param(&self, slot: usize) -> Option<&[u8]> {
        self.params.get(slot).map(Vec::as_slice)
    }

    /// The attached descriptor, if any.
    #[must_use]
    pub const fn handle(&self) -> Option<&TransferredHandle> {
        self.handle.as_ref()
    }

    /// Splits the message into opcode, descriptor, and parameters.
    #[must_use]
    pub fn into_parts(self) -> (Opcode, Option<TransferredHandle>, Vec<Vec<u8>>) {
        (self.opcode, self.handle, self.params)
    }

    pub(crate) const fn from_parts(
        opcode: Opcode,
        handle: Option<TransferredHandle>,
        params: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            opcode,
            handle,
            params,
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lengths: Vec<usize> = self.params.iter().map(Vec::len).collect();
        f.debug_struct("Message")
            .field("opcode", &self.opcode)
            .field("handle", &self.handle.is_some())
            .field("param_lengths", &lengths)
            .finish()
    }
}
