//! `SOCK_SEQPACKET` channel carrying framed messages and file descriptors.

use std::io;
use std::mem;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::ptr;
use std::time::Duration;

use nix::sys::socket::{AddressFamily, SockFlag, SockType, setsockopt, socketpair, sockopt};
use nix::sys::time::{TimeVal, TimeValLike};

use crate::frame::{decode_frame, encode_header};
use crate::{CodecError, MAX_MESSAGE_BYTES, Message, Opcode, TransferredHandle};

/// Descriptors accepted per datagram before the control data is truncated.
/// Anything beyond one is closed and reported as a protocol failure.
const MAX_RECEIVED_FDS: usize = 4;

#[expect(
    clippy::cast_possible_truncation,
    reason = "a descriptor is a C int"
)]
const FD_BYTES: u32 = size_of::<RawFd>() as u32;

/// One end of a connected RAP socket pair.
///
/// Sending and receiving take `&mut self`, so only one call is ever in flight
/// on a channel.
#[derive(Debug)]
pub struct RapChannel {
    socket: OwnedFd,
    buffer: Vec<u8>,
}

impl RapChannel {
    /// Creates a connected pair of channels, both close-on-exec.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Io`] when `socketpair` fails.
    pub fn pair() -> Result<(Self, Self), CodecError> {
        let (left, right) = socketpair(
            AddressFamily::Unix,
            SockType::SeqPacket,
            None,
            SockFlag::SOCK_CLOEXEC,
        )
        .map_err(|errno| CodecError::io("create socket pair", errno))?;
        Ok((Self::from_fd(left), Self::from_fd(right)))
    }

    /// Adopts an already connected socket, such as a RAP's standard input.
    #[must_use]
    pub fn from_fd(socket: OwnedFd) -> Self {
        Self {
            socket,
            buffer: vec![0; MAX_MESSAGE_BYTES],
        }
    }

    /// Releases the underlying socket.
    #[must_use]
    pub fn into_owned_fd(self) -> OwnedFd {
        self.socket
    }

    /// Bounds how long [`Self::receive`] blocks. `None` waits forever.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Io`] when the socket option cannot be set.
    pub fn set_receive_timeout(&self, timeout: Option<Duration>) -> Result<(), CodecError> {
        let value = timeout.map_or_else(TimeVal::zero, |duration| {
            let micros = i64::try_from(duration.as_micros()).unwrap_or(i64::MAX);
            // A zero timeval disables the timeout, so round tiny values up.
            TimeVal::microseconds(micros.max(1))
        });
        setsockopt(&self.socket, sockopt::ReceiveTimeout, &value)
            .map_err(|errno| CodecError::io("set receive timeout", errno))
    }

    /// Sends one message as a single datagram.
    ///
    /// Returns the number of bytes written. The size check happens before the
    /// socket is touched, and `SIGPIPE` is suppressed.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] for oversize messages or a failed `sendmsg`.
    pub fn send(&mut self, message: &Message) -> Result<usize, CodecError> {
        let header = encode_header(message.opcode(), message.params())?;
        let mut iov = Vec::with_capacity(1 + message.params().len());
        iov.push(io_slice(&header));
        iov.extend(message.params().iter().map(|param| io_slice(param)));

        let fd = message.handle().map(|handle| handle.as_fd().as_raw_fd());
        let mut control = ControlBuffer::for_fds(usize::from(fd.is_some()));

        // SAFETY: msghdr is zero-initialised and every pointer placed in it
        // refers to a buffer that outlives the sendmsg call.
        let mut msg: libc::msghdr = unsafe { mem::zeroed() };
        msg.msg_iov = iov.as_mut_ptr();
        msg.msg_iovlen = iov.len() as _;
        if let Some(fd) = fd {
            msg.msg_control = control.as_mut_ptr();
            msg.msg_controllen = control.len() as _;
            // SAFETY: the control buffer holds CMSG_SPACE for one descriptor.
            unsafe { write_rights(&msg, fd) };
        }

        loop {
            // SAFETY: the socket is open and msghdr is fully initialised.
            let sent = unsafe { libc::sendmsg(self.socket.as_raw_fd(), &msg, libc::MSG_NOSIGNAL) };
            if sent >= 0 {
                return usize::try_from(sent).map_err(|_| CodecError::Malformed {
                    reason: "negative send length",
                });
            }
            let error = io::Error::last_os_error();
            if error.kind() != io::ErrorKind::Interrupted {
                return Err(CodecError::io("send message", error));
            }
        }
    }

    /// Blocks for the next datagram.
    ///
    /// Any received descriptor is owned before the frame is validated, so it
    /// is closed on every failure path.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Closed`] when the peer has gone away,
    /// [`CodecError::Timeout`] when the receive timeout elapses, and protocol
    /// errors for truncated or malformed datagrams.
    pub fn receive(&mut self) -> Result<Message, CodecError> {
        let (length, flags, mut fds) = self.receive_datagram()?;

        if flags & (libc::MSG_TRUNC | libc::MSG_CTRUNC) != 0 {
            return Err(CodecError::Truncated);
        }
        if length == 0 {
            return Err(CodecError::Closed);
        }
        if fds.len() > 1 {
            return Err(CodecError::UnexpectedHandles { count: fds.len() });
        }

        let datagram = self.buffer.get(..length).ok_or(CodecError::Truncated)?;
        let (code, params) = decode_frame(datagram)?;
        let opcode = Opcode::from_code(code).ok_or(CodecError::UnknownOpcode { code })?;
        let handle = fds.pop().map(TransferredHandle::new);
        Ok(Message::from_parts(opcode, handle, params))
    }

    /// Sends `message` and blocks for the paired reply.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Self::send`] and [`Self::receive`].
    pub fn send_recv(&mut self, message: &Message) -> Result<Message, CodecError> {
        self.send(message)?;
        self.receive()
    }

    fn receive_datagram(&mut self) -> Result<(usize, libc::c_int, Vec<OwnedFd>), CodecError> {
        let mut iov = [libc::iovec {
            iov_base: self.buffer.as_mut_ptr().cast(),
            iov_len: self.buffer.len(),
        }];
        let mut control = ControlBuffer::for_fds(MAX_RECEIVED_FDS);

        loop {
            // SAFETY: zero-initialised msghdr pointing at buffers owned here.
            let mut msg: libc::msghdr = unsafe { mem::zeroed() };
            msg.msg_iov = iov.as_mut_ptr();
            msg.msg_iovlen = iov.len() as _;
            msg.msg_control = control.as_mut_ptr();
            msg.msg_controllen = control.len() as _;

            // SAFETY: the socket is open and msghdr is fully initialised.
            let received = unsafe {
                libc::recvmsg(self.socket.as_raw_fd(), &mut msg, libc::MSG_CMSG_CLOEXEC)
            };
            if received >= 0 {
                // SAFETY: the kernel filled the control buffer we own.
                let fds = unsafe { take_rights(&msg) };
                let length = usize::try_from(received).map_err(|_| CodecError::Truncated)?;
                return Ok((length, msg.msg_flags, fds));
            }

            let error = io::Error::last_os_error();
            match error.kind() {
                io::ErrorKind::Interrupted => {}
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                    return Err(CodecError::Timeout);
                }
                io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => {
                    return Err(CodecError::Closed);
                }
                _ => return Err(CodecError::io("receive message", error)),
            }
        }
    }
}

impl AsFd for RapChannel {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }
}

/// Control-message storage aligned for `cmsghdr`.
struct ControlBuffer {
    words: Vec<u64>,
    len: usize,
}

impl ControlBuffer {
    fn for_fds(count: usize) -> Self {
        if count == 0 {
            return Self {
                words: Vec::new(),
                len: 0,
            };
        }
        let payload = u32::try_from(count).map_or(u32::MAX, |count| count * FD_BYTES);
        // SAFETY: CMSG_SPACE is a pure size computation.
        let len = unsafe { libc::CMSG_SPACE(payload) } as usize;
        Self {
            words: vec![0; len.div_ceil(size_of::<u64>())],
            len,
        }
    }

    fn as_mut_ptr(&mut self) -> *mut libc::c_void {
        if self.len == 0 {
            ptr::null_mut()
        } else {
            self.words.as_mut_ptr().cast()
        }
    }

    const fn len(&self) -> usize {
        self.len
    }
}

fn io_slice(bytes: &[u8]) -> libc::iovec {
    libc::iovec {
        iov_base: bytes.as_ptr().cast_mut().cast(),
        iov_len: bytes.len(),
    }
}

/// Writes a single `SCM_RIGHTS` entry into the message's control buffer.
///
/// # Safety
///
/// `msg.msg_control` must point at a buffer of at least `CMSG_SPACE` bytes
/// for one descriptor.
unsafe fn write_rights(msg: &libc::msghdr, fd: RawFd) {
    // SAFETY: guaranteed by the caller.
    unsafe {
        let cmsg = libc::CMSG_FIRSTHDR(msg);
        if cmsg.is_null() {
            return;
        }
        (*cmsg).cmsg_level = libc::SOL_SOCKET;
        (*cmsg).cmsg_type = libc::SCM_RIGHTS;
        (*cmsg).cmsg_len = libc::CMSG_LEN(FD_BYTES) as _;
        ptr::write_unaligned(libc::CMSG_DATA(cmsg).cast::<RawFd>(), fd);
    }
}

/// Collects every descriptor carried in `SCM_RIGHTS` entries as owned handles.
///
/// # Safety
///
/// `msg` must describe a control buffer just filled by `recvmsg`.
unsafe fn take_rights(msg: &libc::msghdr) -> Vec<OwnedFd> {
    let mut fds = Vec::new();
    if msg.msg_control.is_null() {
        return fds;
    }
    // SAFETY: guaranteed by the caller; descriptors from SCM_RIGHTS are
    // owned by the receiver from here on.
    unsafe {
        let base_len = libc::CMSG_LEN(0) as usize;
        let mut cmsg = libc::CMSG_FIRSTHDR(msg);
        while !cmsg.is_null() {
            if (*cmsg).cmsg_level == libc::SOL_SOCKET && (*cmsg).cmsg_type == libc::SCM_RIGHTS {
                let payload = ((*cmsg).cmsg_len as usize).saturating_sub(base_len);
                let data = libc::CMSG_DATA(cmsg).cast::<RawFd>();
                for index in 0..payload / size_of::<RawFd>() {
                    let raw = ptr::read_unaligned(data.add(index));
                    if raw >= 0 {
                        fds.push(OwnedFd::from_raw_fd(raw));
                    }
                }
            }
            cmsg = libc::CMSG_NXTHDR(msg, cmsg);
        }
    }
    fds
}
