//! Stand-in RAP used by the integration tests.
//!
//! Reads its channel from stdin. `alice` with secret `wonderland` is
//! accepted; `crash` exits without replying and `stall` never replies.
//! Authenticated sessions serve `READ_FILE` and `PUT` on the given path and
//! answer every other operation with `400`.

use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::os::fd::AsFd;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use webdavd_protocol::{
    CodecError, ErrorDetails, Opcode, RapChannel, RapRequest, RapResponse, ReplyDetails,
    TransferredHandle,
};

fn main() -> ExitCode {
    let socket = match io::stdin().as_fd().try_clone_to_owned() {
        Ok(socket) => socket,
        Err(error) => {
            eprintln!("webdavd-rap-fixture: no channel on stdin: {error}");
            return ExitCode::FAILURE;
        }
    };
    let mut channel = RapChannel::from_fd(socket);
    match serve(&mut channel) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("webdavd-rap-fixture: {error}");
            ExitCode::FAILURE
        }
    }
}

fn serve(channel: &mut RapChannel) -> Result<(), Box<dyn Error>> {
    let RapRequest::Authenticate(credentials) = RapRequest::try_from(channel.receive()?)? else {
        return reply(channel, failure(Opcode::RespondBadClientRequest));
    };
    match (credentials.user(), credentials.secret()) {
        ("crash", _) => return Ok(()),
        ("stall", _) => {
            thread::sleep(Duration::from_secs(5));
            return Ok(());
        }
        ("alice", "wonderland") => reply(
            channel,
            RapResponse::Success {
                status: Opcode::RespondOk,
                details: ReplyDetails::default(),
            },
        )?,
        _ => return reply(channel, failure(Opcode::RespondAuthFailed)),
    }

    loop {
        let message = match channel.receive() {
            Ok(message) => message,
            Err(CodecError::Closed) => return Ok(()),
            Err(error) => return Err(error.into()),
        };
        let response = match RapRequest::try_from(message) {
            Ok(RapRequest::File(request)) => match request.operation() {
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
            _ => failure(Opcode::RespondBadClientRequest),
        };
        reply(channel, response)?;
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

fn reply(channel: &mut RapChannel, response: RapResponse) -> Result<(), Box<dyn Error>> {
    channel.send(&response.into_message()?)?;
    Ok(())
}
