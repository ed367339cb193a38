//! Test double for [`HealthReporter`] that records lifecycle events.

use std::net::SocketAddr;
use std::sync::Mutex;

use webdavd_config::{Config, ListenSpec};

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::process::ShutdownCause;
use crate::transport::ListenerError;

/// Lifecycle events observed during a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ListenerReady(SocketAddr),
    ListenerFailed(String),
    PrivilegesDropped(String),
    ShutdownComplete(ShutdownCause),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Addresses of every listener reported ready so far.
    pub fn ready_addresses(&self) -> Vec<SocketAddr> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::ListenerReady(address) => Some(address),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_ready(&self, _spec: &ListenSpec, address: SocketAddr) {
        self.record(HealthEvent::ListenerReady(address));
    }

    fn listener_failed(&self, spec: &ListenSpec, _error: &ListenerError) {
        self.record(HealthEvent::ListenerFailed(spec.to_string()));
    }

    fn privileges_dropped(&self, user: &str) {
        self.record(HealthEvent::PrivilegesDropped(user.to_owned()));
    }

    fn shutdown_complete(&self, cause: ShutdownCause) {
        self.record(HealthEvent::ShutdownComplete(cause));
    }
}
