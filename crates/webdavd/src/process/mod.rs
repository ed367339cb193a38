//! Process lifecycle: startup, privilege drop, and shutdown.

mod errors;
pub(crate) mod launch;
mod privileges;
pub(crate) mod shutdown;

pub use self::errors::LaunchError;
pub use self::launch::run_daemon;
pub use self::shutdown::{ShutdownCause, ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
