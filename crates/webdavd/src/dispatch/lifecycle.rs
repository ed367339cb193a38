//! The per-request state machine.

use std::sync::Arc;

use tracing::{debug, error};
use webdavd_protocol::{
    AccessMode, FileRequest, HandleKind, Opcode, RapRequest, RapResponse, ReplyDetails,
    TransferredHandle,
};

use super::{
    DISPATCH_TARGET, DispatchError, HomeDirectories, WriteHandle, operation_for, resolve_path,
};
use crate::content::{DirectoryListing, Page};
use crate::context::ServerContext;
use crate::http::{Body, RequestHead, Response, basic_credentials, http_date};
use crate::rap::{RapLauncher, RapSession};

/// Where a request stands once the RAP has answered.
#[derive(Debug)]
pub(crate) enum RequestState {
    /// The response is final.
    Complete(Response),
    /// The request body must be streamed into the granted handle.
    StreamingUpload(Upload),
}

/// An upload in progress.
#[derive(Debug)]
pub(crate) struct Upload {
    handle: WriteHandle,
    path: String,
}

impl Upload {
    pub(crate) const fn new(handle: WriteHandle, path: String) -> Self {
        Self { handle, path }
    }

    pub(crate) fn write_chunk(&mut self, chunk: &[u8]) {
        self.handle.write_chunk(chunk);
    }

    /// Whether a write already failed, fixing the outcome at `507`.
    pub(crate) const fn is_failed(&self) -> bool {
        self.handle.is_failed()
    }

    /// Closes the handle and picks the final response: `507` if any chunk
    /// failed, otherwise the upload-complete page.
    pub(crate) fn finish(self, context: &ServerContext) -> Response {
        let written = self.handle.written();
        if self.handle.finish() {
            debug!(target: DISPATCH_TARGET, path = %self.path, written, "upload complete");
            context.page(Page::UploadComplete)
        } else {
            context.page(Page::InsufficientStorage)
        }
    }
}

/// Drives requests for one server.
#[derive(Debug)]
pub(crate) struct Dispatcher<L, H> {
    context: Arc<ServerContext>,
    launcher: L,
    homes: H,
}

impl<L, H> Dispatcher<L, H>
where
    L: RapLauncher,
    H: HomeDirectories,
{
    pub(crate) const fn new(context: Arc<ServerContext>, launcher: L, homes: H) -> Self {
        Self {
            context,
            launcher,
            homes,
        }
    }

    pub(crate) fn context(&self) -> &ServerContext {
        &self.context
    }

    /// Runs a request up to its final response or its upload phase.
    pub(crate) fn start(&self, head: &RequestHead) -> RequestState {
        if !head.is_http11() {
            return self.complete_with(Page::VersionNotSupported);
        }
        let Some(host) = head.host() else {
            return RequestState::Complete(self.context.status_response(400));
        };
        let Some(credentials) = basic_credentials(head) else {
            return RequestState::Complete(self.context.unauthorized());
        };
        let Some(operation) = operation_for(head.method()) else {
            debug!(target: DISPATCH_TARGET, method = head.method(), "method not supported");
            return self.complete_with(Page::MethodNotSupported);
        };

        let mut session = match self.launcher.launch(&credentials) {
            Ok(session) => session,
            Err(error) => return self.fail(&error.into()),
        };
        let path = match self.homes.home_of(credentials.user()) {
            Ok(home) => resolve_path(&home, head.path()),
            Err(error) => return self.fail(&error),
        };
        let Some(path) = path else {
            return RequestState::Complete(self.context.status_response(400));
        };

        let reply = FileRequest::new(operation, host, path.as_str())
            .map_err(DispatchError::from)
            .and_then(|request| {
                session
                    .call(RapRequest::File(request))
                    .map_err(DispatchError::from)
            });
        drop(session);

        match reply.and_then(|reply| self.relay(operation, reply, path)) {
            Ok(state) => state,
            Err(error) => self.fail(&error),
        }
    }

    /// Turns the RAP's reply into a response. The direction of a granted
    /// handle follows the operation that was asked for, so a read-write
    /// handle serves an upload as well as a download.
    fn relay(
        &self,
        operation: Opcode,
        reply: RapResponse,
        path: String,
    ) -> Result<RequestState, DispatchError> {
        match reply {
            RapResponse::SourceData { handle, .. } | RapResponse::SinkData { handle, .. }
                if operation == Opcode::Put =>
            {
                let mode = handle
                    .access_mode()
                    .map_err(|source| DispatchError::Handle { source })?;
                if mode == AccessMode::ReadOnly {
                    return Err(DispatchError::ReadOnlyUpload);
                }
                Ok(RequestState::StreamingUpload(Upload::new(
                    WriteHandle::new(handle),
                    path,
                )))
            }
            RapResponse::SourceData { handle, details } => self
                .source_response(handle, &details, &path)
                .map(RequestState::Complete),
            RapResponse::Failure {
                status: Opcode::RespondAccessDenied,
                ..
            } => {
                debug!(target: DISPATCH_TARGET, path = %path, "access denied");
                Ok(self.complete_with(Page::Forbidden))
            }
            RapResponse::Failure {
                status: Opcode::RespondNotFound,
                ..
            } => {
                debug!(target: DISPATCH_TARGET, path = %path, "not found");
                Ok(self.complete_with(Page::NotFound))
            }
            RapResponse::Failure {
                status: Opcode::RespondBadClientRequest,
                ..
            } => Err(DispatchError::RejectedRequest),
            other => Err(DispatchError::UnexpectedReply {
                opcode: other.opcode(),
            }),
        }
    }

    fn source_response(
        &self,
        handle: TransferredHandle,
        details: &ReplyDetails,
        path: &str,
    ) -> Result<Response, DispatchError> {
        let kind = handle
            .kind()
            .map_err(|source| DispatchError::Handle { source })?;
        let mut response = Response::new(200);
        let body = match kind {
            HandleKind::File { len } => {
                let file = handle.into_file();
                let modified = file
                    .metadata()
                    .and_then(|metadata| metadata.modified())
                    .ok()
                    .and_then(http_date);
                if let Some(modified) = modified {
                    response = response.header("Last-Modified", modified);
                }
                Body::Sized {
                    reader: Box::new(file),
                    len,
                }
            }
            HandleKind::Directory => {
                let listing = DirectoryListing::open(handle.into_owned_fd())
                    .map_err(|source| DispatchError::Handle { source })?;
                Body::Chunked(Box::new(listing))
            }
            HandleKind::Stream => Body::Chunked(Box::new(handle.into_file())),
        };
        let content_type = self
            .context
            .mime()
            .lookup(path)
            .or(details.mime.as_deref());
        if let Some(content_type) = content_type {
            response = response.header("Content-Type", content_type);
        }
        Ok(response.body(body))
    }

    fn complete_with(&self, page: Page) -> RequestState {
        RequestState::Complete(self.context.page(page))
    }

    fn fail(&self, failure: &DispatchError) -> RequestState {
        let status = failure.status();
        if status == 401 {
            debug!(target: DISPATCH_TARGET, error = %failure, "authentication failed");
        } else {
            error!(target: DISPATCH_TARGET, error = %failure, "request failed");
        }
        RequestState::Complete(self.context.status_response(status))
    }
}
