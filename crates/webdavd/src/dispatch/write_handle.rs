//! Writable handle fed with upload chunks.

use std::fs::File;
use std::io::{self, Write};

use tracing::warn;
use webdavd_protocol::TransferredHandle;

use super::DISPATCH_TARGET;

/// Target of an upload.
///
/// Each chunk is written with a single `write`. A short or failed write
/// closes the handle and marks the upload failed; later chunks are
/// discarded.
#[derive(Debug)]
pub(crate) struct WriteHandle {
    file: Option<File>,
    failed: bool,
    written: u64,
}

impl WriteHandle {
    pub(crate) fn new(handle: TransferredHandle) -> Self {
        Self {
            file: Some(handle.into_file()),
            failed: false,
            written: 0,
        }
    }

    pub(crate) fn write_chunk(&mut self, chunk: &[u8]) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        match write_once(file, chunk) {
            Ok(count) if count == chunk.len() => self.written += count as u64,
            Ok(count) => self.fail(&io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write of {count} of {} bytes", chunk.len()),
            )),
            Err(error) => self.fail(&error),
        }
    }

    pub(crate) const fn is_failed(&self) -> bool {
        self.failed
    }

    pub(crate) const fn written(&self) -> u64 {
        self.written
    }

    /// Closes the handle. Returns `true` when every chunk was written.
    pub(crate) fn finish(mut self) -> bool {
        self.file = None;
        !self.failed
    }

    fn fail(&mut self, error: &io::Error) {
        warn!(
            target: DISPATCH_TARGET,
            error = %error,
            written = self.written,
            "upload write failed"
        );
        self.failed = true;
        self.file = None;
    }
}

fn write_once(file: &mut File, chunk: &[u8]) -> io::Result<usize> {
    loop {
        match file.write(chunk) {
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{self, OpenOptions};

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn writes_every_chunk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("upload.bin");
        let file = File::create(&path).expect("create");
        let mut handle = WriteHandle::new(TransferredHandle::from(file));
        handle.write_chunk(b"hello ");
        handle.write_chunk(b"world");
        assert_eq!(handle.written(), 11);
        assert!(handle.finish());
        assert_eq!(fs::read(&path).expect("read back"), b"hello world");
    }

    #[rstest]
    fn failure_is_sticky() {
        let full = OpenOptions::new()
            .write(true)
            .open("/dev/full")
            .expect("open /dev/full");
        let mut handle = WriteHandle::new(TransferredHandle::from(full));
        handle.write_chunk(b"doomed");
        assert!(handle.is_failed());
        handle.write_chunk(b"ignored");
        assert!(handle.is_failed());
        assert!(!handle.finish());
    }
}
