//! Connection handler that serves one HTTP request per connection.

use std::io::BufReader;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

use tracing::{debug, info, warn};
use webdavd_config::ForwardTo;

use super::{ACCESS_TARGET, DISPATCH_TARGET, Dispatcher, HomeDirectories, RequestState, Upload};
use crate::http::{
    BODY_BUFFER_BYTES, BodyReader, HttpError, RequestHead, Response, read_head, write_continue,
};
use crate::rap::RapLauncher;
use crate::transport::{ConnectionHandler, ConnectionLimits, ConnectionStream};

/// Serves connections for one listen entry.
#[derive(Debug)]
pub(crate) struct HttpConnectionHandler<L, H> {
    dispatcher: Arc<Dispatcher<L, H>>,
    limits: Arc<ConnectionLimits>,
    forward_to: Option<ForwardTo>,
}

impl<L, H> HttpConnectionHandler<L, H>
where
    L: RapLauncher + 'static,
    H: HomeDirectories + 'static,
{
    pub(crate) const fn new(
        dispatcher: Arc<Dispatcher<L, H>>,
        limits: Arc<ConnectionLimits>,
        forward_to: Option<ForwardTo>,
    ) -> Self {
        Self {
            dispatcher,
            limits,
            forward_to,
        }
    }

    fn serve(&self, stream: &ConnectionStream) -> Option<Exchange> {
        let mut reader = BufReader::new(stream.tcp());
        let mut writer = stream.tcp();

        let head = match read_head(&mut reader) {
            Ok(Some(head)) => head,
            Ok(None) => return None,
            Err(error) => return self.reject(&error).map(Exchange::unparsed),
        };

        if let Some(forward) = &self.forward_to {
            let location = forward.location(head.host().unwrap_or_default(), head.path());
            let response = Response::new(301).header("Location", location);
            return Some(Exchange::new(head, response));
        }

        let body = match head.body_reader() {
            Ok(body) => body,
            Err(error) => {
                let response = self.reject(&error)?;
                return Some(Exchange::new(head, response));
            }
        };

        let response = match self.dispatcher.start(&head) {
            RequestState::Complete(response) => response,
            RequestState::StreamingUpload(upload) => {
                self.stream_upload(&head, body, upload, &mut reader, &mut writer)?
            }
        };
        Some(Exchange::new(head, response))
    }

    /// Feeds the request body into `upload`. Returns `None` when the client
    /// went away before the body ended.
    fn stream_upload(
        &self,
        head: &RequestHead,
        mut body: BodyReader,
        mut upload: Upload,
        reader: &mut BufReader<&TcpStream>,
        writer: &mut &TcpStream,
    ) -> Option<Response> {
        if head.expects_continue() && !body.is_empty() && write_continue(writer).is_err() {
            return None;
        }
        let mut buffer = vec![0_u8; BODY_BUFFER_BYTES];
        loop {
            match body.read_chunk(reader, &mut buffer) {
                Ok(0) => break,
                Ok(read) => upload.write_chunk(buffer.get(..read).unwrap_or_default()),
                Err(error) if upload.is_failed() && error.status().is_some() => {
                    debug!(
                        target: DISPATCH_TARGET,
                        error = %error,
                        "framing error after a failed write"
                    );
                    return Some(upload.finish(self.dispatcher.context()));
                }
                Err(error) => {
                    drop(upload);
                    return self.reject(&error);
                }
            }
        }
        Some(upload.finish(self.dispatcher.context()))
    }

    /// Response for a framing error, or `None` when the client is gone.
    fn reject(&self, error: &HttpError) -> Option<Response> {
        match error.status() {
            Some(status) => {
                debug!(target: DISPATCH_TARGET, error = %error, status, "rejecting request");
                Some(self.dispatcher.context().status_response(status))
            }
            None => {
                debug!(target: DISPATCH_TARGET, error = %error, "client disconnected");
                None
            }
        }
    }
}

impl<L, H> ConnectionHandler for HttpConnectionHandler<L, H>
where
    L: RapLauncher + 'static,
    H: HomeDirectories + 'static,
{
    fn handle(&self, stream: ConnectionStream) {
        let peer = stream.peer();
        let Some(_permit) = self.limits.try_acquire(peer.ip()) else {
            warn!(
                target: DISPATCH_TARGET,
                peer = %peer,
                "per-address connection limit reached"
            );
            let response = self.dispatcher.context().status_response(503);
            let mut writer = stream.tcp();
            if response.write_to(&mut writer).is_ok() {
                stream.linger_close();
            }
            return;
        };

        let Some(exchange) = self.serve(&stream) else {
            return;
        };
        let Exchange { head, response } = exchange;
        let status = response.status();
        let mut writer = stream.tcp();
        match response.write_to(&mut writer) {
            Ok(bytes) => {
                Exchange::log(head.as_ref(), peer, status, bytes);
                stream.linger_close();
            }
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    peer = %peer,
                    error = %error,
                    "failed to write response"
                );
            }
        }
    }
}

/// A request head, when one parsed, and the response chosen for it.
struct Exchange {
    head: Option<RequestHead>,
    response: Response,
}

impl Exchange {
    const fn new(head: RequestHead, response: Response) -> Self {
        Self {
            head: Some(head),
            response,
        }
    }

    const fn unparsed(response: Response) -> Self {
        Self {
            head: None,
            response,
        }
    }

    fn log(head: Option<&RequestHead>, peer: SocketAddr, status: u16, bytes: u64) {
        let (method, uri, version) = head.map_or_else(
            || ("-", "-", String::from("-")),
            |head| (head.method(), head.target(), head.version()),
        );
        info!(
            target: ACCESS_TARGET,
            peer = %peer.ip(),
            method,
            uri,
            version = %version,
            status,
            bytes,
            "request served"
        );
    }
}
