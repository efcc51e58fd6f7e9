use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::marker::PhantomData;
use std::net::SocketAddr;
use crate::addr::{Domain, peer_from_storage};
use crate::error::{SocketError, errno};

/// A listening stream socket.
///
/// The type parameter D tracks which address family (Ipv4, Ipv6) it was
/// bound with. Once registered, listeners are kept type-erased as `OwnedFd`.
pub struct Listener<D: Domain> {
    fd: OwnedFd,
    _marker: PhantomData<D>,
}

impl<D: Domain> Listener<D> {
    /// Internal use only — called by BoundSocket::listen()
    pub(crate) fn from_fd(fd: OwnedFd) -> Self {
        Self {
            fd,
            _marker: PhantomData,
        }
    }

    /// Sets or clears `O_NONBLOCK` on the listening socket.
    pub fn set_nonblocking(&self, nonblocking: bool) -> std::io::Result<()> {
        super::options::set_nonblocking(self, nonblocking)
    }

    /// Gives up the typestate, keeping only the descriptor.
    pub fn into_fd(self) -> OwnedFd {
        self.fd
    }
}

impl<D: Domain> From<Listener<D>> for OwnedFd {
    fn from(listener: Listener<D>) -> Self {
        listener.into_fd()
    }
}

impl<D: Domain> AsRawFd for Listener<D> {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl<D: Domain> AsFd for Listener<D> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

/// Result of a non-blocking accept attempt.
///
/// This is the outcome of one accept call, not a socket state.
/// The listener stays listening in all cases.
#[derive(Debug)]
pub enum AcceptResult {
    /// A connection was accepted. The peer address is `None` if the
    /// kernel reported a family we do not decode.
    Connection(OwnedFd, Option<SocketAddr>),

    /// No connection is pending. Wait for readiness and retry.
    WouldBlock,

    /// The syscall was interrupted by a signal. Safe to retry.
    Interrupted,
}

/// `accept4()` on a listening descriptor of either family.
///
/// The accepted socket is created non-blocking and close-on-exec.
pub fn accept_nonblocking(listener: BorrowedFd<'_>) -> std::io::Result<AcceptResult> {
    let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
    let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

    let fd = unsafe {
        libc::accept4(
            listener.as_raw_fd(),
            &mut storage as *mut _ as *mut libc::sockaddr,
            &mut len,
            libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
        )
    };

    if fd == -1 {
        let err = errno();
        return match err {
            libc::EAGAIN => Ok(AcceptResult::WouldBlock),
            libc::EINTR => Ok(AcceptResult::Interrupted),
            _ => Err(SocketError::Accept { errno: err }.into()),
        };
    }

    let fd = unsafe { OwnedFd::from_raw_fd(fd) };
    Ok(AcceptResult::Connection(fd, peer_from_storage(&storage, len)))
}
