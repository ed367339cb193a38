//! TCP listeners for the configured listen entries.
//!
//! Each listener accepts on a background thread and hands every connection
//! to its [`ConnectionHandler`] on a thread of its own.

mod errors;
mod handler;
mod limits;
mod listener;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream};
pub(crate) use self::limits::ConnectionLimits;
pub(crate) use self::listener::{HttpListener, ListenerHandle};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
