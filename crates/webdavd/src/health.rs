//! Structured health reporting for daemon lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use webdavd_config::{Config, ListenSpec};

use crate::bootstrap::BootstrapError;
use crate::process::ShutdownCause;
use crate::transport::ListenerError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once a listener is accepting connections on `address`.
    fn listener_ready(&self, spec: &ListenSpec, address: SocketAddr);

    /// Invoked when a listener cannot be bound or started.
    fn listener_failed(&self, spec: &ListenSpec, error: &ListenerError);

    /// Invoked after the process switched to the restricted account.
    fn privileges_dropped(&self, user: &str);

    /// Invoked once every listener has stopped.
    fn shutdown_complete(&self, cause: ShutdownCause);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_ready(&self, spec: &ListenSpec, address: SocketAddr) {
        (**self).listener_ready(spec, address);
    }

    fn listener_failed(&self, spec: &ListenSpec, error: &ListenerError) {
        (**self).listener_failed(spec, error);
    }

    fn privileges_dropped(&self, user: &str) {
        (**self).privileges_dropped(user);
    }

    fn shutdown_complete(&self, cause: ShutdownCause) {
        (**self).shutdown_complete(cause);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        for (index, server) in config.servers().iter().enumerate() {
            tracing::info!(
                target: HEALTH_TARGET,
                event = "server_configured",
                server = index,
                listeners = server.listen().len(),
                session_timeout_secs = server.session_timeout().as_secs(),
                rap_timeout_secs = server.rap_timeout().as_secs(),
                max_ip_connections = server.max_ip_connections(),
                rap_binary = %server.rap_binary(),
                auth_service = server.auth_service(),
                "server configured"
            );
        }
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            servers = config.servers().len(),
            restricted = config.restricted_user().unwrap_or("-"),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn listener_ready(&self, spec: &ListenSpec, address: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_ready",
            endpoint = %spec,
            address = %address,
            "listener ready"
        );
    }

    fn listener_failed(&self, spec: &ListenSpec, error: &ListenerError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "listener_failed",
            endpoint = %spec,
            error = %error,
            "listener failed to start"
        );
    }

    fn privileges_dropped(&self, user: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "privileges_dropped",
            user,
            "switched to restricted account"
        );
    }

    fn shutdown_complete(&self, cause: ShutdownCause) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_complete",
            cause = %cause,
            "all listeners stopped"
        );
    }
}
