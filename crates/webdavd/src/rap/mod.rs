//! Restricted Access Processor supervision.
//!
//! Every authenticated request gets a fresh RAP: a subprocess started with
//! both stdin and stdout bound to one end of a [`RapChannel`] socket pair. The
//! listener authenticates the user over the channel, sends exactly one file
//! request, and drops the session. The reaper thread collects the exit
//! status of every child it spawned.
//!
//! [`RapChannel`]: webdavd_protocol::RapChannel

mod errors;
mod reaper;
mod supervisor;

pub use self::errors::RapError;
pub use self::reaper::{Reaper, ReaperError};
pub use self::supervisor::{RapLauncher, RapSession, SpawnedRap, SpawningLauncher};

/// Tracing target for RAP lifecycle events.
pub(crate) const RAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::rap");
