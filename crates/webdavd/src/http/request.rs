//! Request head parsing.

use std::io::{BufRead, Read};

use super::{BodyReader, HttpError, MAX_HEAD_BYTES, MAX_HEADERS};

/// Request line and headers of one HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestHead {
    method: String,
    target: String,
    minor_version: u8,
    headers: Vec<(String, String)>,
}

impl RequestHead {
    pub(crate) fn new(
        method: impl Into<String>,
        target: impl Into<String>,
        minor_version: u8,
        headers: Vec<(String, String)>,
    ) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            minor_version,
            headers,
        }
    }

    pub(crate) fn method(&self) -> &str {
        &self.method
    }

    pub(crate) fn target(&self) -> &str {
        &self.target
    }

    /// The request target with any query string or fragment removed.
    pub(crate) fn path(&self) -> &str {
        self.target
            .split(['?', '#'])
            .next()
            .unwrap_or(&self.target)
    }

    pub(crate) fn version(&self) -> String {
        format!("HTTP/1.{}", self.minor_version)
    }

    pub(crate) const fn is_http11(&self) -> bool {
        self.minor_version == 1
    }

    /// First value of the named header, compared case-insensitively.
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The `Host` header, when present and non-empty.
    pub(crate) fn host(&self) -> Option<&str> {
        self.header("Host")
            .map(str::trim)
            .filter(|host| !host.is_empty())
    }

    pub(crate) fn expects_continue(&self) -> bool {
        self.header("Expect")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("100-continue"))
    }

    /// Framing of the request body.
    pub(crate) fn body_reader(&self) -> Result<BodyReader, HttpError> {
        if let Some(encoding) = self.header("Transfer-Encoding") {
            let last = encoding.rsplit(',').next().unwrap_or_default().trim();
            if !last.eq_ignore_ascii_case("chunked") {
                return Err(HttpError::InvalidFraming {
                    reason: "transfer-encoding must end with chunked",
                });
            }
            return Ok(BodyReader::chunked());
        }
        match self.header("Content-Length") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(BodyReader::sized)
                .map_err(|_| HttpError::InvalidFraming {
                    reason: "content-length is not a number",
                }),
            None => Ok(BodyReader::sized(0)),
        }
    }
}

/// Reads one request head.
///
/// Returns `Ok(None)` when the client closes the connection before sending
/// anything.
pub(crate) fn read_head<R: BufRead>(reader: &mut R) -> Result<Option<RequestHead>, HttpError> {
    let mut buffer = Vec::with_capacity(1024);
    loop {
        let start = buffer.len();
        let allowance = (MAX_HEAD_BYTES + 1).saturating_sub(start);
        let read = reader
            .by_ref()
            .take(allowance as u64)
            .read_until(b'\n', &mut buffer)?;
        if read == 0 {
            return if buffer.is_empty() {
                Ok(None)
            } else {
                Err(HttpError::Disconnected)
            };
        }
        if buffer.len() > MAX_HEAD_BYTES {
            return Err(HttpError::HeadTooLarge {
                limit: MAX_HEAD_BYTES,
            });
        }

        let line = buffer.get(start..).unwrap_or_default();
        if matches!(line, b"\r\n" | b"\n") {
            if start == 0 {
                // Blank lines before the request line are ignored.
                buffer.clear();
                continue;
            }
            return parse_head(&buffer).map(Some);
        }
    }
}

fn parse_head(bytes: &[u8]) -> Result<RequestHead, HttpError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut request = httparse::Request::new(&mut headers);
    match request.parse(bytes) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(HttpError::MalformedHead {
                reason: "incomplete request head".to_owned(),
            });
        }
        Err(httparse::Error::TooManyHeaders) => {
            return Err(HttpError::HeadTooLarge {
                limit: MAX_HEAD_BYTES,
            });
        }
        Err(httparse::Error::Version) => return Err(HttpError::UnsupportedVersion),
        Err(error) => {
            return Err(HttpError::MalformedHead {
                reason: error.to_string(),
            });
        }
    }

    let (Some(method), Some(target), Some(minor_version)) =
        (request.method, request.path, request.version)
    else {
        return Err(HttpError::MalformedHead {
            reason: "missing request line".to_owned(),
        });
    };
    let headers = request
        .headers
        .iter()
        .map(|header| {
            (
                header.name.to_owned(),
                String::from_utf8_lossy(header.value).into_owned(),
            )
        })
        .collect();
    Ok(RequestHead::new(method, target, minor_version, headers))
}
