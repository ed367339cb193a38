//! Datagram header layout.
//!
//! A datagram is a little-endian `u32` opcode, a `u32` parameter count, one
//! `u32` length per parameter, then the parameter bytes back to back. The
//! header and each parameter are gathered from separate buffers on send.

use crate::{CodecError, Opcode};

/// Maximum number of parameters a single message carries.
pub const MAX_MESSAGE_PARAMS: usize = 8;

/// Largest datagram either side will send or accept.
pub const MAX_MESSAGE_BYTES: usize = 40_960;

const WORD: usize = size_of::<u32>();

pub(crate) const fn header_len(count: usize) -> usize {
    WORD * (2 + count)
}

/// Builds the header for `params`, checking the count and total size.
pub(crate) fn encode_header(opcode: Opcode, params: &[Vec<u8>]) -> Result<Vec<u8>, CodecError> {
    if params.len() > MAX_MESSAGE_PARAMS {
        return Err(CodecError::TooManyParams {
            count: params.len(),
        });
    }
    let size = header_len(params.len()) + params.iter().map(Vec::len).sum::<usize>();
    if size > MAX_MESSAGE_BYTES {
        return Err(CodecError::MessageTooLarge { size });
    }

    let mut header = Vec::with_capacity(header_len(params.len()));
    header.extend_from_slice(&opcode.code().to_le_bytes());
    push_word(&mut header, params.len())?;
    for param in params {
        push_word(&mut header, param.len())?;
    }
    Ok(header)
}

/// Splits a received datagram into its raw opcode and parameters.
pub(crate) fn decode_frame(datagram: &[u8]) -> Result<(u32, Vec<Vec<u8>>), CodecError> {
    let code = read_word(datagram, 0)?;
    let count = word_to_len(read_word(datagram, WORD)?)?;
    if count > MAX_MESSAGE_PARAMS {
        return Err(CodecError::TooManyParams { count });
    }

    let mut lengths = Vec::with_capacity(count);
    for slot in 0..count {
        lengths.push(word_to_len(read_word(datagram, WORD * (2 + slot))?)?);
    }

    let mut offset = header_len(count);
    let mut params = Vec::with_capacity(count);
    for length in lengths {
        let end = offset.checked_add(length).ok_or(CodecError::Malformed {
            reason: "parameter length overflows",
        })?;
        let bytes = datagram.get(offset..end).ok_or(CodecError::Malformed {
            reason: "parameter extends past the datagram",
        })?;
        params.push(bytes.to_vec());
        offset = end;
    }
    if offset != datagram.len() {
        return Err(CodecError::Malformed {
            reason: "trailing bytes after the last parameter",
        });
    }
    Ok((code, params))
}

fn push_word(header: &mut Vec<u8>, value: usize) -> Result<(), CodecError> {
    let word = u32::try_from(value).map_err(|_| CodecError::MessageTooLarge { size: value })?;
    header.extend_from_slice(&word.to_le_bytes());
    Ok(())
}

fn read_word(bytes: &[u8], offset: usize) -> Result<u32, CodecError> {
    let chunk = bytes
        .get(offset..offset + WORD)
        .and_then(|chunk| <[u8; WORD]>::try_from(chunk).ok())
        .ok_or(CodecError::Malformed {
            reason: "datagram shorter than its header",
        })?;
    Ok(u32::from_le_bytes(chunk))
}

fn word_to_len(word: u32) -> Result<usize, CodecError> {
    usize::try_from(word).map_err(|_| CodecError::Malformed {
        reason: "length does not fit in memory",
    })
}
