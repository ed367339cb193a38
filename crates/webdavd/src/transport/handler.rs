//! Connection handling abstractions for the listener.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::{Duration, Instant};

/// How long a closing connection keeps reading unsent request bytes.
const LINGER_TIMEOUT: Duration = Duration::from_secs(2);

/// Upper bound on request bytes discarded while closing.
const LINGER_LIMIT: u64 = 1024 * 1024;

/// An accepted client connection.
#[derive(Debug)]
pub(crate) struct ConnectionStream {
    stream: TcpStream,
    peer: SocketAddr,
}

impl ConnectionStream {
    pub(crate) const fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }

    pub(crate) const fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub(crate) const fn tcp(&self) -> &TcpStream {
        &self.stream
    }

    /// Half-closes the connection and discards whatever the client is still
    /// sending, so the response is not lost to a reset.
    pub(crate) fn linger_close(self) {
        if self.stream.shutdown(Shutdown::Write).is_err() {
            return;
        }
        if self.stream.set_read_timeout(Some(LINGER_TIMEOUT)).is_err() {
            return;
        }
        let deadline = Instant::now() + LINGER_TIMEOUT;
        let mut remaining = (&self.stream).take(LINGER_LIMIT);
        let mut buffer = [0_u8; 4096];
        while Instant::now() < deadline {
            match remaining.read(&mut buffer) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// Handles accepted connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: ConnectionStream);
}
