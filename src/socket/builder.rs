use std::marker::PhantomData;
use crate::addr::{Domain, ToSockAddr};
use super::{RawSocket, Listener, set_reuse_addr, set_linger};

/// Builder for daemon listening sockets.
///
/// Defaults match what a long-running daemon wants: `SO_REUSEADDR` on,
/// a one second linger, backlog 128, non-blocking once listening.
///
/// # Example
/// ```ignore
/// use bindlane::{Ipv4, SocketAddrV4, ListenerBuilder};
///
/// let listener = ListenerBuilder::<Ipv4>::new()
///     .backlog(4096)
///     .build(SocketAddrV4::new([0, 0, 0, 0], 6667))?;
/// ```
pub struct ListenerBuilder<D: Domain> {
	reuse_addr: bool,
	linger: Option<u32>,
	backlog: i32,
	nonblocking: bool,
	_marker: PhantomData<D>,
}

impl<D: Domain> Default for ListenerBuilder<D> {
	fn default() -> Self {
		Self::new()
	}
}

impl<D: Domain> ListenerBuilder<D> {
	pub fn new() -> Self {
		Self {
			reuse_addr: true,
			linger: Some(1),
			backlog: 128,
			nonblocking: true,
			_marker: PhantomData,
		}
	}

	pub fn reuse_addr(mut self, enable: bool) -> Self {
		self.reuse_addr = enable;
		self
	}

	/// Linger timeout applied on close. `None` disables lingering.
	pub fn linger(mut self, seconds: Option<u32>) -> Self {
		self.linger = seconds;
		self
	}

	/// Set listen backlog. Default: 128.
	pub fn backlog(mut self, backlog: i32) -> Self {
		self.backlog = backlog;
		self
	}

	/// Switch the listener to non-blocking after listen(). Default: on.
	pub fn nonblocking(mut self, enable: bool) -> Self {
		self.nonblocking = enable;
		self
	}

	/// Creates the socket and applies the pre-bind options.
	pub fn open(&self) -> std::io::Result<RawSocket<D>> {
		let socket = RawSocket::<D>::new()?;

		if self.reuse_addr {
			set_reuse_addr(&socket, true)?;
		}
		set_linger(&socket, self.linger)?;

		Ok(socket)
	}

	/// Binds an opened socket, listens, then applies non-blocking mode.
	pub fn bind(&self, socket: RawSocket<D>, addr: D::Addr) -> std::io::Result<Listener<D>>
	where
		D::Addr: ToSockAddr + std::fmt::Display,
	{
		let listener = socket.bind(addr)?.listen(self.backlog)?;

		if self.nonblocking {
			listener.set_nonblocking(true)?;
		}
		Ok(listener)
	}

	/// `open` followed by `bind`.
	pub fn build(&self, addr: D::Addr) -> std::io::Result<Listener<D>>
	where
		D::Addr: ToSockAddr + std::fmt::Display,
	{
		let socket = self.open()?;
		self.bind(socket, addr)
	}
}
