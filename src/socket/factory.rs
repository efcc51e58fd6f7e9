use std::os::fd::OwnedFd;
use crate::addr::{BindAddr, Domain, Family, Ipv4, Ipv6, SocketAddrV4, SocketAddrV6, ToSockAddr};
use super::ListenerBuilder;

/// Socket settings shared by every listener the daemon opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerOptions {
	/// Family used for wildcard binds.
	pub family: Family,
	pub backlog: i32,
	/// SO_LINGER timeout; `None` turns lingering off.
	pub linger_secs: Option<u32>,
}

impl Default for ListenerOptions {
	fn default() -> Self {
		Self {
			family: Family::default(),
			backlog: 128,
			linger_secs: Some(1),
		}
	}
}

/// Produces bound, listening, non-blocking sockets.
///
/// The binder only talks to this trait, so tests can drive it
/// without touching the network.
pub trait SocketFactory {
	fn open_listening(&self, addr: BindAddr, port: u16) -> std::io::Result<OwnedFd>;
}

/// The real factory: `socket()`, options, `bind()`, `listen()`, `O_NONBLOCK`.
#[derive(Debug, Clone, Default)]
pub struct TcpSocketFactory {
	options: ListenerOptions,
}

impl TcpSocketFactory {
	pub fn new(options: ListenerOptions) -> Self {
		Self { options }
	}

	pub fn options(&self) -> &ListenerOptions {
		&self.options
	}

	fn builder<D: Domain>(&self) -> ListenerBuilder<D> {
		ListenerBuilder::new()
			.reuse_addr(true)
			.linger(self.options.linger_secs)
			.backlog(self.options.backlog)
			.nonblocking(true)
	}

	fn listen_on<D: Domain>(&self, addr: D::Addr) -> std::io::Result<OwnedFd>
	where
		D::Addr: ToSockAddr + std::fmt::Display,
	{
		let builder = self.builder::<D>();
		let socket = builder.open()?;
		Ok(builder.bind(socket, addr)?.into_fd())
	}
}

impl SocketFactory for TcpSocketFactory {
	fn open_listening(&self, addr: BindAddr, port: u16) -> std::io::Result<OwnedFd> {
		match (addr, addr.family(self.options.family)) {
			(BindAddr::V4(ip), _) => self.listen_on::<Ipv4>(SocketAddrV4::new(ip, port)),
			(BindAddr::V6(ip), _) => self.listen_on::<Ipv6>(SocketAddrV6::new(ip, port)),
			(BindAddr::Any, Family::Ipv4) => self.listen_on::<Ipv4>(SocketAddrV4::any(port)),
			(BindAddr::Any, Family::Ipv6) => self.listen_on::<Ipv6>(SocketAddrV6::any(port)),
		}
	}
}
