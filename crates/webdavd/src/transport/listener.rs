//! Accept loop for one listen entry.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};
use webdavd_config::ListenSpec;

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// A bound TCP listener that has not started accepting yet.
#[derive(Debug)]
pub(crate) struct HttpListener {
    endpoint: String,
    local_addr: SocketAddr,
    listener: TcpListener,
}

impl HttpListener {
    pub(crate) fn bind(spec: &ListenSpec) -> Result<Self, ListenerError> {
        Self::bind_host(spec.bind_host(), spec.port())
    }

    pub(crate) fn bind_host(host: &str, port: u16) -> Result<Self, ListenerError> {
        let endpoint = format!("{host}:{port}");
        let (listener, local_addr) = bind_tcp(&endpoint, host, port)?;
        Ok(Self {
            endpoint,
            local_addr,
            listener,
        })
    }

    /// Address actually bound, with any ephemeral port resolved.
    pub(crate) const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        let endpoint = self.endpoint.clone();
        self.listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking {
                endpoint: endpoint.clone(),
                source,
            })?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name(format!("webdavd-listen-{endpoint}"))
            .spawn(move || run_accept_loop(&self, &shutdown_flag, &handler))
            .map_err(|source| ListenerError::Thread {
                endpoint: endpoint.clone(),
                source,
            })?;
        Ok(ListenerHandle {
            endpoint,
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to the background accept thread.
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    endpoint: String,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::AcceptPanicked {
                endpoint: self.endpoint.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    listener: &HttpListener,
    shutdown: &AtomicBool,
    handler: &Arc<dyn ConnectionHandler>,
) {
    info!(
        target: LISTENER_TARGET,
        endpoint = %listener.endpoint,
        "listener active"
    );
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        match accept_connection(&listener.listener) {
            Ok(Some(stream)) => {
                last_error = None;
                let handler = Arc::clone(handler);
                thread::spawn(move || handler.handle(stream));
            }
            Ok(None) => thread::sleep(ACCEPT_BACKOFF),
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(
                        target: LISTENER_TARGET,
                        endpoint = %listener.endpoint,
                        error = %error,
                        "accept error"
                    );
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
    info!(
        target: LISTENER_TARGET,
        endpoint = %listener.endpoint,
        "listener stopped"
    );
}

fn accept_connection(listener: &TcpListener) -> io::Result<Option<ConnectionStream>> {
    match listener.accept() {
        Ok((stream, peer)) => {
            stream.set_nonblocking(false)?;
            Ok(Some(ConnectionStream::new(stream, peer)))
        }
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(error) => Err(error),
    }
}

fn bind_tcp(
    endpoint: &str,
    host: &str,
    port: u16,
) -> Result<(TcpListener, SocketAddr), ListenerError> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Unresolvable {
            endpoint: endpoint.to_owned(),
            source,
        })?
        .next()
        .ok_or_else(|| ListenerError::NoAddress {
            endpoint: endpoint.to_owned(),
        })?;
    let bind_failed = |source| ListenerError::Bind {
        endpoint: endpoint.to_owned(),
        addr,
        source,
    };
    let listener = TcpListener::bind(addr).map_err(bind_failed)?;
    let local_addr = listener.local_addr().map_err(bind_failed)?;
    Ok((listener, local_addr))
}
