use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::marker::PhantomData;
use crate::addr::{Domain, ToSockAddr};
use crate::error::{SocketError, errno};
use super::bound::BoundSocket;

/// A stream socket that has been created but not yet bound.
///
/// Use `.bind()` to move on to `BoundSocket`.
pub struct RawSocket<D: Domain> {
	fd: OwnedFd,
	_marker: PhantomData<D>,
}

impl<D: Domain> RawSocket<D> {
	/// Creates a new stream socket.
	///
	/// Calls the `socket()` syscall with the family of `D`.
	/// The socket is created with `SOCK_CLOEXEC` (close on exec).
	pub fn new() -> std::io::Result<Self> {
		let fd = unsafe {
			libc::socket(D::raw(), libc::SOCK_STREAM | libc::SOCK_CLOEXEC, 0)
		};
		if fd == -1 {
			return Err(SocketError::Create { errno: errno() }.into());
		}
		let fd = unsafe { OwnedFd::from_raw_fd(fd) };

		Ok(Self {
			fd,
			_marker: PhantomData,
		})
	}

	/// Binds the socket to an address.
	///
	/// Consumes self. On failure the descriptor is closed.
	pub fn bind(self, addr: D::Addr) -> std::io::Result<BoundSocket<D>>
	where
		D::Addr: ToSockAddr + std::fmt::Display,
	{
		let result = addr.with_raw(|ptr, len| unsafe {
			libc::bind(self.fd.as_raw_fd(), ptr, len)
		});

		match result {
			Some(-1) => Err(SocketError::Bind {
				errno: errno(),
				addr: addr.to_string(),
			}.into()),
			Some(_) => Ok(BoundSocket::from_fd(self.fd)),
			None => Err(SocketError::InvalidAddress {
				reason: "address cannot be represented",
			}.into()),
		}
	}
}

impl<D: Domain> AsRawFd for RawSocket<D> {
	fn as_raw_fd(&self) -> RawFd {
		self.fd.as_raw_fd()
	}
}

impl<D: Domain> AsFd for RawSocket<D> {
	fn as_fd(&self) -> BorrowedFd<'_> {
		self.fd.as_fd()
	}
}

/*
 socket() -> RawSocket   options may be set here (SO_REUSEADDR, SO_LINGER)
 bind()   -> BoundSocket
 listen() -> Listener    O_NONBLOCK is set last, before handing off
*/
