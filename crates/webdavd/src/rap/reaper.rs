//! Collects the exit status of every spawned RAP.

use std::collections::BTreeSet;
use std::io;
use std::process::Command;
use std::sync::{Mutex, MutexGuard};
use std::thread;

use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use once_cell::sync::OnceCell;
use signal_hook::consts::SIGCHLD;
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{debug, warn};

use super::RAP_TARGET;

static REAPER: OnceCell<Reaper> = OnceCell::new();

/// Errors raised while starting the reaper thread.
#[derive(Debug, Error)]
pub enum ReaperError {
    /// The `SIGCHLD` handler could not be installed.
    #[error("failed to install SIGCHLD handler: {source}")]
    Signal {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The reaper thread could not be started.
    #[error("failed to start reaper thread: {source}")]
    Thread {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

/// Registry of live children plus the thread that waits on them.
///
/// Spawning and registration happen under the registry lock, and the reaper
/// takes the same lock before waiting, so a child that exits immediately is
/// still found.
#[derive(Debug)]
pub struct Reaper {
    children: Mutex<BTreeSet<i32>>,
}

impl Reaper {
    /// Returns the process-wide reaper, starting its thread on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ReaperError`] when the signal handler or thread cannot be
    /// set up.
    pub fn global() -> Result<&'static Self, ReaperError> {
        REAPER.get_or_try_init(|| {
            let mut signals =
                Signals::new([SIGCHLD]).map_err(|source| ReaperError::Signal { source })?;
            thread::Builder::new()
                .name("webdavd-reaper".to_owned())
                .spawn(move || {
                    for _ in signals.forever() {
                        if let Some(reaper) = REAPER.get() {
                            reaper.reap();
                        }
                    }
                })
                .map_err(|source| ReaperError::Thread { source })?;
            Ok(Self {
                children: Mutex::new(BTreeSet::new()),
            })
        })
    }

    /// Spawns `command` and registers the child. The command, and with it
    /// any descriptors it holds for the child, is dropped before returning.
    pub(crate) fn spawn(&self, mut command: Command) -> io::Result<u32> {
        let mut children = self.lock();
        let child = command.spawn()?;
        let pid = child.id();
        if let Ok(raw) = i32::try_from(pid) {
            children.insert(raw);
        }
        drop(children);
        debug!(target: RAP_TARGET, pid, "spawned RAP");
        Ok(pid)
    }

    /// Whether `pid` has been spawned but not yet reaped.
    #[must_use]
    pub fn is_tracking(&self, pid: u32) -> bool {
        i32::try_from(pid).is_ok_and(|raw| self.lock().contains(&raw))
    }

    /// Number of children spawned but not yet reaped.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Waits without blocking on every registered child.
    fn reap(&self) {
        let mut children = self.lock();
        children.retain(|&raw| match waitpid(Pid::from_raw(raw), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => true,
            Ok(status) => {
                debug!(target: RAP_TARGET, pid = raw, status = ?status, "reaped RAP");
                !matches!(status, WaitStatus::Exited(..) | WaitStatus::Signaled(..))
            }
            Err(Errno::ECHILD) => false,
            Err(Errno::EINTR) => true,
            Err(error) => {
                warn!(target: RAP_TARGET, pid = raw, error = %error, "waitpid failed");
                true
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<i32>> {
        self.children
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}
