//! Supervises daemon launch sequencing and runtime orchestration.

use std::sync::Arc;

use tracing::{info, warn};
use webdavd_config::{Config, DaemonArgs, Encryption, ListenSpec};

use crate::bootstrap::{ConfigLoader, Daemon, SystemConfigLoader, bootstrap_with};
use crate::dispatch::{Dispatcher, HttpConnectionHandler, SystemHomeDirectories};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::rap::{Reaper, SpawningLauncher};
use crate::transport::{ConnectionLimits, HttpListener, ListenerHandle};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::privileges::drop_privileges;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

type ProductionDispatcher = Dispatcher<SpawningLauncher, SystemHomeDirectories>;

/// Process-level collaborators needed to control daemon lifecycle.
pub(crate) struct ProcessControl<S> {
    pub(crate) shutdown: S,
}

/// Service dependencies required to construct the daemon runtime.
pub(crate) struct ServiceDeps<L> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
}

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) process: ProcessControl<S>,
    pub(crate) services: ServiceDeps<L>,
}

/// Runs the daemon using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, binding, privilege separation, or
/// shutdown handling fails.
pub fn run_daemon(args: DaemonArgs) -> Result<(), LaunchError> {
    let plan = LaunchPlan {
        process: ProcessControl {
            shutdown: SystemShutdownSignal,
        },
        services: ServiceDeps {
            loader: SystemConfigLoader::new(args),
            reporter: Arc::new(StructuredHealthReporter::new()),
        },
    };
    run_daemon_with(plan)
}

/// Runs the daemon with injected collaborators.
///
/// Every socket is bound before privileges are dropped, so ports below 1024
/// work when started as root.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan { process, services } = plan;
    let ProcessControl { shutdown } = process;
    let ServiceDeps { loader, reporter } = services;

    let daemon = bootstrap_with(&loader, Arc::clone(&reporter))?;
    info!(
        target: PROCESS_TARGET,
        servers = daemon.server_count(),
        "starting daemon runtime"
    );
    reject_tls(daemon.config())?;
    let bound = bind_listeners(&daemon, reporter.as_ref())?;

    if let Some(user) = daemon.config().restricted_user() {
        if drop_privileges(user)? {
            reporter.privileges_dropped(user);
        } else {
            warn!(
                target: PROCESS_TARGET,
                user,
                "already running as the restricted user"
            );
        }
    }
    Reaper::global()?;

    let handles = start_listeners(&daemon, bound, reporter.as_ref())?;
    let waited = shutdown.wait();
    stop_listeners(handles)?;
    let cause = waited?;
    reporter.shutdown_complete(cause);
    info!(target: PROCESS_TARGET, cause = %cause, "shutdown sequence completed");
    Ok(())
}

struct BoundListener {
    server: usize,
    spec: ListenSpec,
    listener: HttpListener,
}

fn reject_tls(config: &Config) -> Result<(), LaunchError> {
    let tls = config
        .servers()
        .iter()
        .flat_map(|server| server.listen())
        .find(|spec| spec.encryption() == Encryption::Tls);
    match tls {
        Some(spec) => Err(LaunchError::TlsUnsupported {
            endpoint: spec.to_string(),
        }),
        None => Ok(()),
    }
}

fn bind_listeners(
    daemon: &Daemon,
    reporter: &dyn HealthReporter,
) -> Result<Vec<BoundListener>, LaunchError> {
    let mut bound = Vec::new();
    for (server, context) in daemon.contexts().iter().enumerate() {
        for spec in context.server().listen() {
            match HttpListener::bind(spec) {
                Ok(listener) => bound.push(BoundListener {
                    server,
                    spec: spec.clone(),
                    listener,
                }),
                Err(error) => {
                    reporter.listener_failed(spec, &error);
                    return Err(error.into());
                }
            }
        }
    }
    Ok(bound)
}

fn start_listeners(
    daemon: &Daemon,
    bound: Vec<BoundListener>,
    reporter: &dyn HealthReporter,
) -> Result<Vec<ListenerHandle>, LaunchError> {
    let services: Vec<(Arc<ProductionDispatcher>, Arc<ConnectionLimits>)> = daemon
        .contexts()
        .iter()
        .map(|context| {
            let server = context.server();
            let launcher =
                SpawningLauncher::new(server.rap_binary().to_path_buf(), server.rap_timeout());
            let dispatcher =
                Dispatcher::new(Arc::clone(context), launcher, SystemHomeDirectories);
            (
                Arc::new(dispatcher),
                ConnectionLimits::new(server.max_ip_connections()),
            )
        })
        .collect();

    let mut handles = Vec::with_capacity(bound.len());
    for BoundListener {
        server,
        spec,
        listener,
    } in bound
    {
        let Some((dispatcher, limits)) = services.get(server) else {
            continue;
        };
        let address = listener.local_addr();
        let handler = HttpConnectionHandler::new(
            Arc::clone(dispatcher),
            Arc::clone(limits),
            spec.forward_to().cloned(),
        );
        match listener.start(Arc::new(handler)) {
            Ok(handle) => {
                reporter.listener_ready(&spec, address);
                handles.push(handle);
            }
            Err(error) => {
                reporter.listener_failed(&spec, &error);
                // The failure being reported takes precedence over join errors.
                drop(stop_listeners(handles));
                return Err(error.into());
            }
        }
    }
    Ok(handles)
}

fn stop_listeners(handles: Vec<ListenerHandle>) -> Result<(), LaunchError> {
    for handle in &handles {
        handle.shutdown();
    }
    let mut outcome: Result<(), LaunchError> = Ok(());
    for handle in handles {
        if let Err(error) = handle.join() {
            outcome = outcome.and(Err(error.into()));
        }
    }
    outcome
}
