//! HTTP request dispatch through per-request RAPs.
//!
//! [`Dispatcher::start`] walks a request from `NEW` to either a finished
//! response or an upload in progress:
//!
//! 1. The request must be `HTTP/1.1` with a `Host` header and Basic
//!    credentials, and its method must map to a RAP operation. None of these
//!    checks spawn anything.
//! 2. A RAP is launched and authenticated, then asked for one operation on
//!    the user's home directory joined with the request path.
//! 3. The RAP is released before the reply is relayed. A readable handle is
//!    streamed back; a writable handle becomes an [`Upload`] that the
//!    connection handler feeds with body chunks.
//!
//! Every path through the machine yields exactly one response, except a
//! client that disconnects mid-body, which gets none.

mod errors;
mod handler;
mod home;
mod lifecycle;
mod method;
mod write_handle;

pub use self::errors::DispatchError;
pub(crate) use self::handler::HttpConnectionHandler;
pub use self::home::{HomeDirectories, SystemHomeDirectories};
pub(crate) use self::lifecycle::{Dispatcher, RequestState, Upload};
pub(crate) use self::method::{operation_for, resolve_path};
pub(crate) use self::write_handle::WriteHandle;

/// Tracing target for dispatch decisions.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Tracing target for access log lines.
pub(crate) const ACCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::access");
