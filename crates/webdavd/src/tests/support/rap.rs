//! In-process RAP double that serves requests from the local filesystem.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use webdavd_protocol::{
    Credentials, ErrorDetails, Opcode, RapChannel, RapRequest, RapResponse, ReplyDetails,
    TransferredHandle,
};

use crate::rap::{RapError, RapLauncher, RapSession};

/// Counters and request history shared by a launcher and its sessions.
#[derive(Debug, Default)]
pub struct RapLog {
    launches: AtomicUsize,
    releases: AtomicUsize,
    requests: Mutex<Vec<(Opcode, String, String)>>,
}

impl RapLog {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// `(operation, host, path)` of every file request received.
    pub fn requests(&self) -> Vec<(Opcode, String, String)> {
        self.requests.lock().expect("request log poisoned").clone()
    }
}

/// What the double answers to file requests.
#[derive(Debug, Clone)]
enum Script {
    Filesystem,
    ReadWriteUploads,
    Fail(Opcode),
    SinkAt(PathBuf),
    ReadOnlyAt(PathBuf),
}

/// Accepts `alice` / `wonderland` and denies everyone else.
#[derive(Debug, Clone)]
pub struct ScriptedLauncher {
    log: Arc<RapLog>,
    script: Script,
}

impl ScriptedLauncher {
    /// Serves `READ_FILE` and `PUT` against the real paths it is given.
    pub fn filesystem() -> Self {
        Self {
            log: Arc::default(),
            script: Script::Filesystem,
        }
    }

    /// Like [`Self::filesystem`], but uploads are granted a read-write
    /// handle that crosses a real channel, as a RAP's grant would.
    pub fn read_write_uploads() -> Self {
        Self {
            log: Arc::default(),
            script: Script::ReadWriteUploads,
        }
    }

    /// Answers every file request with a read-only handle on `path`.
    pub fn read_only_at(path: impl Into<PathBuf>) -> Self {
        Self {
            log: Arc::default(),
            script: Script::ReadOnlyAt(path.into()),
        }
    }

    /// Answers every file request with a bare `status` reply.
    pub fn failing_with(status: Opcode) -> Self {
        Self {
            log: Arc::default(),
            script: Script::Fail(status),
        }
    }

    /// Grants every file request a write handle on `path`.
    pub fn sink_at(path: impl Into<PathBuf>) -> Self {
        Self {
            log: Arc::default(),
            script: Script::SinkAt(path.into()),
        }
    }

    pub fn log(&self) -> Arc<RapLog> {
        Arc::clone(&self.log)
    }
}

impl RapLauncher for ScriptedLauncher {
    type Session = ScriptedSession;

    fn launch(&self, credentials: &Credentials) -> Result<ScriptedSession, RapError> {
        self.log.launches.fetch_add(1, Ordering::SeqCst);
        let session = ScriptedSession {
            log: Arc::clone(&self.log),
            script: self.script.clone(),
        };
        if credentials.user() == "alice" && credentials.secret() == "wonderland" {
            Ok(session)
        } else {
            drop(session);
            Err(RapError::Denied {
                user: credentials.user().to_owned(),
            })
        }
    }
}

/// One authenticated double session.
#[derive(Debug)]
pub struct ScriptedSession {
    log: Arc<RapLog>,
    script: Script,
}

impl RapSession for ScriptedSession {
    fn call(&mut self, request: RapRequest) -> Result<RapResponse, RapError> {
        let RapRequest::File(request) = request else {
            return Ok(failure(Opcode::RespondBadClientRequest));
        };
        self.log
            .requests
            .lock()
            .expect("request log poisoned")
            .push((
                request.operation(),
                request.host().to_owned(),
                request.path().to_owned(),
            ));
        Ok(match &self.script {
            Script::Fail(status) => failure(*status),
            Script::SinkAt(path) => sink(OpenOptions::new().write(true).open(path)),
            Script::ReadOnlyAt(path) => source(File::open(path)),
            Script::ReadWriteUploads if request.operation() == Opcode::Put => over_channel(sink(
                OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(request.path()),
            )),
            Script::ReadWriteUploads => source(File::open(request.path())),
            Script::Filesystem => match request.operation() {
                Opcode::ReadFile => source(File::open(request.path())),
                Opcode::Put => sink(
                    OpenOptions::new()
                        .write(true)
                        .create(true)
                        .truncate(true)
                        .open(request.path()),
                ),
                _ => failure(Opcode::RespondBadClientRequest),
            },
        })
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.log.releases.fetch_add(1, Ordering::SeqCst);
    }
}

fn source(opened: io::Result<File>) -> RapResponse {
    match opened {
        Ok(file) => RapResponse::SourceData {
            handle: TransferredHandle::from(file),
            details: ReplyDetails::default(),
        },
        Err(error) => open_failure(&error),
    }
}

fn sink(opened: io::Result<File>) -> RapResponse {
    match opened {
        Ok(file) => RapResponse::SinkData {
            handle: TransferredHandle::from(file),
            details: ReplyDetails::default(),
        },
        Err(error) => open_failure(&error),
    }
}

/// Sends `response` across a socket pair and decodes what arrives.
fn over_channel(response: RapResponse) -> RapResponse {
    let (mut rap_side, mut listener_side) = RapChannel::pair().expect("socket pair");
    rap_side
        .send(&response.into_message().expect("encodes"))
        .expect("sends");
    RapResponse::try_from(listener_side.receive().expect("receives")).expect("decodes")
}

fn open_failure(error: &io::Error) -> RapResponse {
    match error.kind() {
        ErrorKind::NotFound => failure(Opcode::RespondNotFound),
        ErrorKind::PermissionDenied => failure(Opcode::RespondAccessDenied),
        _ => failure(Opcode::RespondInternalError),
    }
}

fn failure(status: Opcode) -> RapResponse {
    RapResponse::Failure {
        status,
        error: ErrorDetails::default(),
    }
}
