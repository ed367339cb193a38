//! Response serialisation.

use std::fmt;
use std::io::{self, Read, Write};
use std::time::SystemTime;

use super::{BODY_BUFFER_BYTES, http_date};

/// Body of a response.
pub(crate) enum Body {
    Empty,
    Bytes(Vec<u8>),
    /// A stream of known length, sent with `Content-Length`.
    Sized {
        reader: Box<dyn Read + Send>,
        len: u64,
    },
    /// A stream of unknown length, sent chunked.
    Chunked(Box<dyn Read + Send>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bytes(bytes) => write!(f, "Bytes({})", bytes.len()),
            Self::Sized { len, .. } => write!(f, "Sized({len})"),
            Self::Chunked(_) => f.write_str("Chunked"),
        }
    }
}

/// A status, headers, and body ready to be written to the client.
#[derive(Debug)]
pub(crate) struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Body,
}

impl Response {
    pub(crate) const fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    #[must_use]
    pub(crate) fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_owned(), value.into()));
        self
    }

    #[must_use]
    pub(crate) fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub(crate) const fn status(&self) -> u16 {
        self.status
    }

    pub(crate) fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Writes the response and returns the number of body bytes sent.
    ///
    /// Every response closes the connection.
    pub(crate) fn write_to<W: Write>(self, writer: &mut W) -> io::Result<u64> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status,
            reason_phrase(self.status)
        );
        if let Some(date) = http_date(SystemTime::now()) {
            push_header(&mut head, "Date", &date);
        }
        push_header(&mut head, "Connection", "close");
        for (name, value) in &self.headers {
            push_header(&mut head, name, value);
        }
        match &self.body {
            Body::Empty => push_header(&mut head, "Content-Length", "0"),
            Body::Bytes(bytes) => push_header(&mut head, "Content-Length", &bytes.len().to_string()),
            Body::Sized { len, .. } => push_header(&mut head, "Content-Length", &len.to_string()),
            Body::Chunked(_) => push_header(&mut head, "Transfer-Encoding", "chunked"),
        }
        head.push_str("\r\n");
        writer.write_all(head.as_bytes())?;

        let sent = match self.body {
            Body::Empty => 0,
            Body::Bytes(bytes) => {
                writer.write_all(&bytes)?;
                bytes.len() as u64
            }
            Body::Sized { reader, len } => {
                let sent = io::copy(&mut reader.take(len), writer)?;
                if sent < len {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "response body shorter than its length",
                    ));
                }
                sent
            }
            Body::Chunked(reader) => write_chunked(reader, writer)?,
        };
        writer.flush()?;
        Ok(sent)
    }
}

fn push_header(head: &mut String, name: &str, value: &str) {
    head.push_str(name);
    head.push_str(": ");
    head.push_str(value);
    head.push_str("\r\n");
}

fn write_chunked<W: Write>(mut reader: Box<dyn Read + Send>, writer: &mut W) -> io::Result<u64> {
    let mut buffer = vec![0_u8; BODY_BUFFER_BYTES];
    let mut sent = 0_u64;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        };
        let chunk = buffer.get(..read).unwrap_or_default();
        write!(writer, "{read:x}\r\n")?;
        writer.write_all(chunk)?;
        writer.write_all(b"\r\n")?;
        sent += read as u64;
    }
    writer.write_all(b"0\r\n\r\n")?;
    Ok(sent)
}

/// Interim `100 Continue`, sent before reading a request body the client is
/// holding back.
pub(crate) fn write_continue<W: Write>(writer: &mut W) -> io::Result<()> {
    writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n")?;
    writer.flush()
}

/// Standard reason phrase for `status`.
pub(crate) const fn reason_phrase(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        102 => "Processing",
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        207 => "Multi-Status",
        301 => "Moved Permanently",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        409 => "Conflict",
        412 => "Precondition Failed",
        415 => "Unsupported Media Type",
        423 => "Locked",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        503 => "Service Unavailable",
        505 => "HTTP Version Not Supported",
        507 => "Insufficient Storage",
        _ => "Unknown",
    }
}
