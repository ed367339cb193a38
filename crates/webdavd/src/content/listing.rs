//! Directory listings streamed from a transferred directory handle.

use std::ffi::CStr;
use std::io::{self, Read};
use std::os::fd::{IntoRawFd, OwnedFd};
use std::ptr::NonNull;

/// Newline-separated directory listing: `name/` for subdirectories, `name`
/// otherwise, with `.` and `..` omitted.
#[derive(Debug)]
pub(crate) struct DirectoryListing {
    dir: NonNull<libc::DIR>,
    pending: Vec<u8>,
    offset: usize,
    finished: bool,
}

// SAFETY: the `DIR` stream is owned exclusively by this value and only
// touched through `&mut self`.
unsafe impl Send for DirectoryListing {}

impl DirectoryListing {
    /// Takes ownership of a directory descriptor.
    pub(crate) fn open(fd: OwnedFd) -> io::Result<Self> {
        let raw = fd.into_raw_fd();
        // SAFETY: `raw` is an open descriptor we own; on success the stream
        // owns it and `closedir` releases it.
        let dir = unsafe { libc::fdopendir(raw) };
        let Some(dir) = NonNull::new(dir) else {
            let error = io::Error::last_os_error();
            // SAFETY: `fdopendir` failed so `raw` is still ours to close.
            unsafe { libc::close(raw) };
            return Err(error);
        };
        Ok(Self {
            dir,
            pending: Vec::new(),
            offset: 0,
            finished: false,
        })
    }

    fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            // SAFETY: errno is thread-local; `self.dir` is a live stream owned
            // by `self`. readdir reports errors only through errno.
            let entry = unsafe {
                *libc::__errno_location() = 0;
                libc::readdir(self.dir.as_ptr())
            };
            if entry.is_null() {
                let error = io::Error::last_os_error();
                return match error.raw_os_error() {
                    Some(0) | None => Ok(None),
                    Some(_) => Err(error),
                };
            }
            // SAFETY: a non-null entry stays valid until the next readdir
            // call on this stream.
            let (name, d_type) = unsafe {
                let entry = &*entry;
                (CStr::from_ptr(entry.d_name.as_ptr()), entry.d_type)
            };
            let bytes = name.to_bytes();
            if matches!(bytes, b"." | b"..") {
                continue;
            }
            let mut line = bytes.to_vec();
            if self.is_directory(name, d_type) {
                line.push(b'/');
            }
            line.push(b'\n');
            return Ok(Some(line));
        }
    }

    fn is_directory(&self, name: &CStr, d_type: u8) -> bool {
        if d_type != libc::DT_UNKNOWN {
            return d_type == libc::DT_DIR;
        }
        let mut stat = std::mem::MaybeUninit::<libc::stat>::uninit();
        // SAFETY: `dirfd` borrows the stream's descriptor; `stat` is written
        // by `fstatat` before it is read.
        unsafe {
            let fd = libc::dirfd(self.dir.as_ptr());
            if libc::fstatat(fd, name.as_ptr(), stat.as_mut_ptr(), libc::AT_SYMLINK_NOFOLLOW) != 0 {
                return false;
            }
            stat.assume_init().st_mode & libc::S_IFMT == libc::S_IFDIR
        }
    }
}

impl Read for DirectoryListing {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.offset >= self.pending.len() {
            if self.finished {
                return Ok(0);
            }
            match self.next_line()? {
                Some(line) => {
                    self.pending = line;
                    self.offset = 0;
                }
                None => self.finished = true,
            }
        }
        let available = self.pending.get(self.offset..).unwrap_or_default();
        let count = available.len().min(buf.len());
        if let (Some(target), Some(source)) = (buf.get_mut(..count), available.get(..count)) {
            target.copy_from_slice(source);
        }
        self.offset += count;
        Ok(count)
    }
}

impl Drop for DirectoryListing {
    fn drop(&mut self) {
        // SAFETY: the stream is owned by `self` and closed exactly once.
        unsafe { libc::closedir(self.dir.as_ptr()) };
    }
}
