//! Request body framing.

use std::io::{BufRead, Read};

use super::HttpError;

const MAX_CHUNK_LINE: usize = 1024;

/// Progress through a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyReader {
    /// A `Content-Length` body with `remaining` bytes still to read.
    Sized { remaining: u64 },
    /// A chunked body.
    Chunked { state: ChunkState },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChunkState {
    Header,
    Data { remaining: u64 },
    Done,
}

impl BodyReader {
    pub(crate) const fn sized(length: u64) -> Self {
        Self::Sized { remaining: length }
    }

    pub(crate) const fn chunked() -> Self {
        Self::Chunked {
            state: ChunkState::Header,
        }
    }

    /// Whether the body carries no bytes at all.
    pub(crate) const fn is_empty(&self) -> bool {
        matches!(self, Self::Sized { remaining: 0 })
    }

    /// Reads the next run of body bytes into `buffer`.
    ///
    /// Returns `Ok(0)` once the body is complete.
    pub(crate) fn read_chunk<R: BufRead>(
        &mut self,
        reader: &mut R,
        buffer: &mut [u8],
    ) -> Result<usize, HttpError> {
        match self {
            Self::Sized { remaining } => {
                let read = read_bounded(reader, buffer, *remaining)?;
                *remaining -= read as u64;
                Ok(read)
            }
            Self::Chunked { state } => read_chunked(reader, buffer, state),
        }
    }
}

fn read_bounded<R: BufRead>(
    reader: &mut R,
    buffer: &mut [u8],
    remaining: u64,
) -> Result<usize, HttpError> {
    if remaining == 0 || buffer.is_empty() {
        return Ok(0);
    }
    let wanted = usize::try_from(remaining).map_or(buffer.len(), |left| left.min(buffer.len()));
    let target = buffer.get_mut(..wanted).unwrap_or_default();
    let read = reader.read(target)?;
    if read == 0 {
        return Err(HttpError::Disconnected);
    }
    Ok(read)
}

fn read_chunked<R: BufRead>(
    reader: &mut R,
    buffer: &mut [u8],
    state: &mut ChunkState,
) -> Result<usize, HttpError> {
    loop {
        match *state {
            ChunkState::Done => return Ok(0),
            ChunkState::Header => {
                let size = read_chunk_size(reader)?;
                if size == 0 {
                    skip_trailers(reader)?;
                    *state = ChunkState::Done;
                } else {
                    *state = ChunkState::Data { remaining: size };
                }
            }
            ChunkState::Data { remaining } => {
                let read = read_bounded(reader, buffer, remaining)?;
                let left = remaining - read as u64;
                if left == 0 {
                    expect_crlf(reader)?;
                    *state = ChunkState::Header;
                } else {
                    *state = ChunkState::Data { remaining: left };
                }
                return Ok(read);
            }
        }
    }
}

/// Reads one line, terminator included.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>, HttpError> {
    let mut line = Vec::new();
    let read = Read::take(&mut *reader, MAX_CHUNK_LINE as u64)
        .read_until(b'\n', &mut line)?;
    if read == 0 {
        return Err(HttpError::Disconnected);
    }
    if line.last() != Some(&b'\n') {
        return Err(HttpError::MalformedChunk {
            reason: "chunk line too long",
        });
    }
    Ok(line)
}

fn is_blank(line: &[u8]) -> bool {
    matches!(line, b"\r\n" | b"\n")
}

fn read_chunk_size<R: BufRead>(reader: &mut R) -> Result<u64, HttpError> {
    let line = read_line(reader)?;
    match httparse::parse_chunk_size(&line) {
        Ok(httparse::Status::Complete((_, size))) => Ok(size),
        Ok(httparse::Status::Partial) | Err(httparse::InvalidChunkSize) => {
            Err(HttpError::MalformedChunk {
                reason: "invalid chunk size line",
            })
        }
    }
}

fn expect_crlf<R: BufRead>(reader: &mut R) -> Result<(), HttpError> {
    if is_blank(&read_line(reader)?) {
        Ok(())
    } else {
        Err(HttpError::MalformedChunk {
            reason: "chunk data not followed by CRLF",
        })
    }
}

fn skip_trailers<R: BufRead>(reader: &mut R) -> Result<(), HttpError> {
    while !is_blank(&read_line(reader)?) {}
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    fn drain(mut body: BodyReader, raw: &[u8]) -> Result<Vec<u8>, HttpError> {
        let mut reader = Cursor::new(raw.to_vec());
        let mut buffer = [0_u8; 4];
        let mut out = Vec::new();
        loop {
            let read = body.read_chunk(&mut reader, &mut buffer)?;
            if read == 0 {
                return Ok(out);
            }
            out.extend_from_slice(buffer.get(..read).expect("within buffer"));
        }
    }

    #[rstest]
    fn sized_body_stops_at_length() {
        let body = drain(BodyReader::sized(5), b"hello, world").expect("drains");
        assert_eq!(body, b"hello");
    }

    #[rstest]
    fn sized_body_short_read_is_a_disconnect() {
        assert!(matches!(
            drain(BodyReader::sized(10), b"short"),
            Err(HttpError::Disconnected)
        ));
    }

    #[rstest]
    fn chunked_body_is_reassembled() {
        let raw = b"5;ext=1\r\nhello\r\n7\r\n, world\r\n0\r\nX-Trailer: y\r\n\r\n";
        let body = drain(BodyReader::chunked(), raw).expect("drains");
        assert_eq!(body, b"hello, world");
    }

    #[rstest]
    #[case::bad_size(b"zz\r\nhello\r\n0\r\n\r\n".as_slice())]
    #[case::missing_crlf(b"2\r\nhiXX0\r\n\r\n".as_slice())]
    #[case::size_overflow(b"fffffffffffffffff\r\nx\r\n0\r\n\r\n".as_slice())]
    fn malformed_chunks_are_rejected(#[case] raw: &[u8]) {
        assert!(matches!(
            drain(BodyReader::chunked(), raw),
            Err(HttpError::MalformedChunk { .. })
        ));
    }

    #[rstest]
    fn empty_body_reports_empty() {
        assert!(BodyReader::sized(0).is_empty());
        assert!(!BodyReader::chunked().is_empty());
    }
}
