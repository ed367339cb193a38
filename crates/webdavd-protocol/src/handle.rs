//! Owned file descriptors passed between processes.

use std::fs::File;
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};

/// How the peer opened a transferred descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// `O_RDONLY`.
    ReadOnly,
    /// `O_WRONLY`.
    WriteOnly,
    /// `O_RDWR`.
    ReadWrite,
}

/// What a transferred descriptor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    /// A regular file with a known length.
    File {
        /// Length in bytes at inspection time.
        len: u64,
    },
    /// A directory.
    Directory,
    /// A pipe, socket, or device.
    Stream,
}

/// An open file descriptor received from, or destined for, the peer.
///
/// The descriptor is closed when the handle is dropped, so every exit path
/// (including a failed decode) releases it.
#[derive(Debug)]
pub struct TransferredHandle(OwnedFd);

impl TransferredHandle {
    /// Wraps an owned descriptor.
    #[must_use]
    pub const fn new(fd: OwnedFd) -> Self {
        Self(fd)
    }

    /// Reads the access mode from the descriptor's status flags.
    ///
    /// # Errors
    ///
    /// Returns the OS error when `fcntl(F_GETFL)` fails.
    pub fn access_mode(&self) -> io::Result<AccessMode> {
        // SAFETY: the descriptor is owned by `self` and open for its lifetime.
        let flags = unsafe { libc::fcntl(self.0.as_raw_fd(), libc::F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(match flags & libc::O_ACCMODE {
            libc::O_WRONLY => AccessMode::WriteOnly,
            libc::O_RDWR => AccessMode::ReadWrite,
            _ => AccessMode::ReadOnly,
        })
    }

    /// Inspects what the descriptor refers to.
    ///
    /// # Errors
    ///
    /// Returns the OS error when the descriptor cannot be duplicated or
    /// `fstat` fails.
    pub fn kind(&self) -> io::Result<HandleKind> {
        let metadata = File::from(self.0.try_clone()?).metadata()?;
        let file_type = metadata.file_type();
        Ok(if file_type.is_dir() {
            HandleKind::Directory
        } else if file_type.is_file() {
            HandleKind::File {
                len: metadata.len(),
            }
        } else {
            HandleKind::Stream
        })
    }

    /// Converts into a [`File`] for reading or writing.
    #[must_use]
    pub fn into_file(self) -> File {
        File::from(self.0)
    }

    /// Releases the inner descriptor.
    #[must_use]
    pub fn into_owned_fd(self) -> OwnedFd {
        self.0
    }
}

impl AsFd for TransferredHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.0.as_fd()
    }
}

impl From<OwnedFd> for TransferredHandle {
    fn from(fd: OwnedFd) -> Self {
        Self(fd)
    }
}

impl From<File> for TransferredHandle {
    fn from(file: File) -> Self {
        Self(OwnedFd::from(file))
    }
}
