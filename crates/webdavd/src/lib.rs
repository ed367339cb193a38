//! Privilege-separated WebDAV server.
//!
//! The listener process binds every configured socket, optionally switches to
//! a restricted account, and then serves one HTTP request per connection. It
//! never touches user files itself. For each request it spawns a RAP (a
//! per-request resource access process) over a socket pair, authenticates the
//! client's Basic credentials through it, and asks it for exactly one
//! operation. File contents travel as descriptors passed back over the socket
//! pair, so the listener only streams bytes between the client and a handle
//! the RAP opened with the user's privileges.
//!
//! Startup follows the same shape throughout: [`bootstrap_with`] loads the
//! configuration, telemetry, MIME table, and static pages while reporting
//! progress to a [`HealthReporter`]; [`run_daemon`] then binds, drops
//! privileges, and serves until a shutdown signal arrives.

mod bootstrap;
mod content;
mod context;
mod dispatch;
mod health;
mod http;
mod process;
mod rap;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use content::ContentError;
pub use dispatch::{DispatchError, HomeDirectories, SystemHomeDirectories};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, ShutdownCause, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon,
};
pub use rap::{
    RapError, RapLauncher, RapSession, Reaper, ReaperError, SpawnedRap, SpawningLauncher,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
