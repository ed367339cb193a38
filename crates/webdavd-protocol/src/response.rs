//! Typed replies sent by a RAP to the listener.

use crate::request::utf8;
use crate::{
    AccessMode, CodecError, DecodeError, LockToken, Message, Opcode, TransferredHandle,
};

/// Optional slots of a success reply: `(date?, mime?, location?)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyDetails {
    /// `Date` or `Last-Modified` value supplied by the RAP.
    pub date: Option<String>,
    /// MIME type of the resource.
    pub mime: Option<String>,
    /// `Location` of a created resource.
    pub location: Option<String>,
}

/// Optional slots of an error reply: `(location?, reason?, dav reason?)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDetails {
    /// Resource the error refers to.
    pub location: Option<String>,
    /// Human readable reason.
    pub reason: Option<String>,
    /// WebDAV precondition or postcondition code.
    pub dav_reason: Option<String>,
}

/// Lock granted or refreshed by an interim reply: `(location, token, timeout)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockGrant {
    /// Locked resource.
    pub location: String,
    /// Token identifying the lock.
    pub token: LockToken,
    /// Timeout as the RAP expressed it.
    pub timeout: String,
}

/// Every reply a RAP may send.
#[derive(Debug)]
pub enum RapResponse {
    /// A success or informational status without a body handle.
    Success {
        /// Response opcode, `100` to `299`.
        status: Opcode,
        /// Optional header values.
        details: ReplyDetails,
    },
    /// `200` with a handle that is not write-only. A read-write handle also
    /// decodes here; the receiver decides its direction from the operation
    /// it asked for.
    SourceData {
        /// Readable descriptor.
        handle: TransferredHandle,
        /// Optional header values.
        details: ReplyDetails,
    },
    /// `200` with a write-only handle to receive the request body.
    SinkData {
        /// Writable descriptor.
        handle: TransferredHandle,
        /// Optional header values.
        details: ReplyDetails,
    },
    /// `INTERIM_RESPOND_LOCK`.
    InterimLock(LockGrant),
    /// `INTERIM_RESPOND_RELOCK`.
    InterimRelock(LockGrant),
    /// A client or server error status.
    Failure {
        /// Response opcode, `400` and above.
        status: Opcode,
        /// Optional error detail.
        error: ErrorDetails,
    },
}

impl RapResponse {
    /// The opcode this reply travels under.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Success { status, .. } | Self::Failure { status, .. } => *status,
            Self::SourceData { .. } | Self::SinkData { .. } => Opcode::RespondOk,
            Self::InterimLock(_) => Opcode::InterimRespondLock,
            Self::InterimRelock(_) => Opcode::InterimRespondRelock,
        }
    }

    /// HTTP status the reply maps to. Interim lock replies map to `200`.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self.opcode().http_status() {
            Some(status) => status,
            None => 200,
        }
    }

    /// Lowers the reply into its positional form.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TooManyParams`] only if the slot layout is
    /// violated, which the typed variants prevent.
    pub fn into_message(self) -> Result<Message, CodecError> {
        let opcode = self.opcode();
        let (params, handle) = match self {
            Self::Success { details, .. } => (reply_params(details), None),
            Self::SourceData { handle, details } | Self::SinkData { handle, details } => {
                (reply_params(details), Some(handle))
            }
            Self::InterimLock(grant) | Self::InterimRelock(grant) => (
                vec![
                    grant.location.into_bytes(),
                    grant.token.encode().into_bytes(),
                    grant.timeout.into_bytes(),
                ],
                None,
            ),
            Self::Failure { error, .. } => (
                trim_trailing(vec![
                    optional(error.location),
                    optional(error.reason),
                    optional(error.dav_reason),
                ]),
                None,
            ),
        };
        let message = Message::new(opcode, params)?;
        Ok(match handle {
            Some(handle) => message.with_handle(handle),
            None => message,
        })
    }
}

impl TryFrom<Message> for RapResponse {
    type Error = DecodeError;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        let (opcode, handle, params) = message.into_parts();
        match opcode {
            Opcode::InterimRespondLock | Opcode::InterimRespondRelock => {
                if handle.is_some() {
                    return Err(DecodeError::UnexpectedHandle { opcode });
                }
                let grant = decode_grant(opcode, params)?;
                Ok(if opcode == Opcode::InterimRespondLock {
                    Self::InterimLock(grant)
                } else {
                    Self::InterimRelock(grant)
                })
            }
            status => match status.http_status() {
                Some(code) if code < 400 => decode_success(status, handle, params),
                Some(_) => {
                    if handle.is_some() {
                        return Err(DecodeError::UnexpectedHandle { opcode });
                    }
                    let [location, reason, dav_reason] = optional_slots(status, params)?;
                    Ok(Self::Failure {
                        status,
                        error: ErrorDetails {
                            location,
                            reason,
                            dav_reason,
                        },
                    })
                }
                None => Err(DecodeError::UnexpectedOpcode { opcode }),
            },
        }
    }
}

fn decode_success(
    status: Opcode,
    handle: Option<TransferredHandle>,
    params: Vec<Vec<u8>>,
) -> Result<RapResponse, DecodeError> {
    let [date, mime, location] = optional_slots(status, params)?;
    let details = ReplyDetails {
        date,
        mime,
        location,
    };
    match handle {
        None => Ok(RapResponse::Success { status, details }),
        Some(_) if status != Opcode::RespondOk => {
            Err(DecodeError::UnexpectedHandle { opcode: status })
        }
        Some(handle) => {
            let mode = handle
                .access_mode()
                .map_err(|source| DecodeError::Handle { source })?;
            Ok(if mode == AccessMode::WriteOnly {
                RapResponse::SinkData { handle, details }
            } else {
                RapResponse::SourceData { handle, details }
            })
        }
    }
}

fn decode_grant(opcode: Opcode, params: Vec<Vec<u8>>) -> Result<LockGrant, DecodeError> {
    let actual = params.len();
    let [location, token, timeout] =
        <[Vec<u8>; 3]>::try_from(params).map_err(|_| DecodeError::ParamCount {
            opcode,
            expected: "3",
            actual,
        })?;
    Ok(LockGrant {
        location: utf8(opcode, 0, location)?,
        token: LockToken::decode(&utf8(opcode, 1, token)?)?,
        timeout: utf8(opcode, 2, timeout)?,
    })
}

fn optional_slots(
    opcode: Opcode,
    params: Vec<Vec<u8>>,
) -> Result<[Option<String>; 3], DecodeError> {
    if params.len() > 3 {
        return Err(DecodeError::ParamCount {
            opcode,
            expected: "at most 3",
            actual: params.len(),
        });
    }
    let mut slots: [Option<String>; 3] = Default::default();
    for (slot, (target, bytes)) in slots.iter_mut().zip(params).enumerate() {
        if !bytes.is_empty() {
            *target = Some(utf8(opcode, slot, bytes)?);
        }
    }
    Ok(slots)
}

fn reply_params(details: ReplyDetails) -> Vec<Vec<u8>> {
    trim_trailing(vec![
        optional(details.date),
        optional(details.mime),
        optional(details.location),
    ])
}

fn optional(value: Option<String>) -> Vec<u8> {
    value.map(String::into_bytes).unwrap_or_default()
}

fn trim_trailing(mut params: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    while params.last().is_some_and(Vec::is_empty) {
        params.pop();
    }
    params
}
