//! Shared doubles and fixtures for the daemon test suites.

mod client;
mod config_loader;
mod fixture;
mod rap;
mod reporter;

pub use client::{HttpReply, send_request};
pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use fixture::{ServerFixture, StaticHomes};
pub use rap::{RapLog, ScriptedLauncher};
pub use reporter::{HealthEvent, RecordingHealthReporter};
