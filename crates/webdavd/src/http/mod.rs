//! Minimal HTTP/1.1 framing for the request dispatcher.
//!
//! Only what the dispatcher needs is implemented: reading a request head,
//! Basic credentials, `Content-Length` and chunked request bodies, and
//! writing a response followed by connection close.

mod auth;
mod body;
mod date;
mod errors;
mod request;
mod response;

pub(crate) use self::auth::basic_credentials;
pub(crate) use self::body::BodyReader;
pub(crate) use self::date::http_date;
pub(crate) use self::errors::HttpError;
pub(crate) use self::request::{RequestHead, read_head};
pub(crate) use self::response::{Body, Response, reason_phrase, write_continue};

/// Upper bound on the request line plus headers.
pub(crate) const MAX_HEAD_BYTES: usize = 16 * 1024;

/// Upper bound on the number of request headers.
pub(crate) const MAX_HEADERS: usize = 64;

/// Buffer used when copying request and response bodies.
pub(crate) const BODY_BUFFER_BYTES: usize = 64 * 1024;
