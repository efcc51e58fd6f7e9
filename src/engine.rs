//! Minimal epoll readiness engine for listening sockets.

use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use crate::bind::Readiness;
use crate::error::{SocketError, errno};

/// Level-triggered epoll set watching listeners for `EPOLLIN`.
pub struct EpollEngine {
	epoll: OwnedFd,
	events: Vec<libc::epoll_event>,
}

impl EpollEngine {
	pub fn new() -> std::io::Result<Self> {
		let fd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
		if fd == -1 {
			return Err(SocketError::Epoll { errno: errno(), op: "epoll_create1()" }.into());
		}
		Ok(Self {
			epoll: unsafe { OwnedFd::from_raw_fd(fd) },
			events: vec![libc::epoll_event { events: 0, u64: 0 }; 64],
		})
	}

	/// Waits up to `timeout_ms` and returns the descriptors that are ready.
	/// A signal during the wait yields an empty batch.
	pub fn wait(&mut self, timeout_ms: i32) -> std::io::Result<Vec<RawFd>> {
		let n = unsafe {
			libc::epoll_wait(
				self.epoll.as_raw_fd(),
				self.events.as_mut_ptr(),
				self.events.len() as libc::c_int,
				timeout_ms,
			)
		};
		if n == -1 {
			let err = std::io::Error::last_os_error();
			if err.kind() == std::io::ErrorKind::Interrupted {
				return Ok(Vec::new());
			}
			return Err(err);
		}
		Ok(self.events[..n as usize].iter().map(|ev| ev.u64 as RawFd).collect())
	}
}

impl Readiness for EpollEngine {
	fn register_listener(&mut self, fd: BorrowedFd<'_>) -> std::io::Result<()> {
		let mut event = libc::epoll_event {
			events: libc::EPOLLIN as u32,
			u64: fd.as_raw_fd() as u64,
		};
		let rc = unsafe {
			libc::epoll_ctl(self.epoll.as_raw_fd(), libc::EPOLL_CTL_ADD, fd.as_raw_fd(), &mut event)
		};
		if rc == -1 {
			return Err(SocketError::Epoll { errno: errno(), op: "epoll_ctl(EPOLL_CTL_ADD)" }.into());
		}
		Ok(())
	}
}

impl AsFd for EpollEngine {
	fn as_fd(&self) -> BorrowedFd<'_> {
		self.epoll.as_fd()
	}
}
