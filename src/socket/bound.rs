use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::marker::PhantomData;
use crate::addr::Domain;
use crate::error::{SocketError, errno};
use super::listener::Listener;

/// A socket that has been bound to an address but is not yet listening.
pub struct BoundSocket<D: Domain> {
	fd: OwnedFd,
	_marker: PhantomData<D>,
}

impl<D: Domain> BoundSocket<D> {
	/// Internal use only - called by RawSocket::bind()
	pub(crate) fn from_fd(fd: OwnedFd) -> Self {
		Self {
			fd,
			_marker: PhantomData,
		}
	}

	/// Transitions to a listening socket.
	///
	/// `backlog` is the pending-connection queue size handed to `listen()`.
	pub fn listen(self, backlog: i32) -> std::io::Result<Listener<D>> {
		let result = unsafe {
			libc::listen(self.fd.as_raw_fd(), backlog)
		};

		if result == -1 {
			return Err(SocketError::Listen { errno: errno(), backlog }.into());
		}

		Ok(Listener::from_fd(self.fd))
	}
}

impl<D: Domain> AsRawFd for BoundSocket<D> {
	fn as_raw_fd(&self) -> RawFd {
		self.fd.as_raw_fd()
	}
}

impl<D: Domain> AsFd for BoundSocket<D> {
	fn as_fd(&self) -> BorrowedFd<'_> {
		self.fd.as_fd()
	}
}
