//! Message protocol spoken between `webdavd` and its restricted access
//! processors (RAPs).
//!
//! Every exchange travels over a `SOCK_SEQPACKET` socket pair, so one send is
//! always one receive. A datagram carries an [`Opcode`], at most
//! [`MAX_MESSAGE_PARAMS`] byte-string parameters, and optionally one open file
//! descriptor passed as `SCM_RIGHTS` ancillary data.
//!
//! The positional [`Message`] form is what crosses the socket. Callers work
//! with the typed [`RapRequest`] and [`RapResponse`] variants, which convert to
//! and from messages and validate parameter shapes on the way in.
//!
//! # Example
//!
//! ```rust,no_run
//! use webdavd_protocol::{Credentials, RapChannel, RapRequest, RapResponse};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (mut listener_side, rap_side) = RapChannel::pair()?;
//! # drop(rap_side);
//! let request = RapRequest::Authenticate(Credentials::new("alice", "wonderland"));
//! let reply = listener_side.send_recv(&request.into_message()?)?;
//! match RapResponse::try_from(reply)? {
//!     RapResponse::Success { .. } => println!("authenticated"),
//!     other => println!("refused with {}", other.status()),
//! }
//! # Ok(())
//! # }
//! ```

mod channel;
mod error;
mod frame;
mod handle;
mod lock_token;
mod message;
mod opcode;
mod request;
mod response;

pub use self::channel::RapChannel;
pub use self::error::{CodecError, DecodeError, LockTokenError};
pub use self::frame::{MAX_MESSAGE_BYTES, MAX_MESSAGE_PARAMS};
pub use self::handle::{AccessMode, HandleKind, TransferredHandle};
pub use self::lock_token::LockToken;
pub use self::message::Message;
pub use self::opcode::Opcode;
pub use self::request::{Credentials, FileRequest, RapRequest};
pub use self::response::{ErrorDetails, LockGrant, RapResponse, ReplyDetails};
