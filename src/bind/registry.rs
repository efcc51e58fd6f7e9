use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use super::spec::normalize_address;

/// A socket that is bound, listening and registered for accept readiness.
#[derive(Debug)]
pub struct BoundListener {
	fd: OwnedFd,
	port: u16,
	address: String,
}

impl BoundListener {
	pub fn new(fd: OwnedFd, port: u16, address: &str) -> Self {
		Self {
			fd,
			port,
			address: normalize_address(address),
		}
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	/// Empty for the wildcard address.
	pub fn address(&self) -> &str {
		&self.address
	}

	fn is(&self, port: u16, address: &str) -> bool {
		self.port == port && self.address.eq_ignore_ascii_case(address)
	}
}

impl AsFd for BoundListener {
	fn as_fd(&self) -> BorrowedFd<'_> {
		self.fd.as_fd()
	}
}

impl AsRawFd for BoundListener {
	fn as_raw_fd(&self) -> RawFd {
		self.fd.as_raw_fd()
	}
}

/// Every listener bound so far, in bind order.
///
/// Entries are only ever appended; dropping the registry closes the sockets.
#[derive(Debug, Default)]
pub struct PortRegistry {
	listeners: Vec<BoundListener>,
}

impl PortRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Linear scan; daemons have tens of listeners, not thousands.
	pub fn contains(&self, port: u16, address: &str) -> bool {
		let address = normalize_address(address);
		self.listeners.iter().any(|l| l.is(port, &address))
	}

	pub fn add(&mut self, listener: BoundListener) {
		self.listeners.push(listener);
	}

	pub fn len(&self) -> usize {
		self.listeners.len()
	}

	pub fn is_empty(&self) -> bool {
		self.listeners.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, BoundListener> {
		self.listeners.iter()
	}
}

impl<'a> IntoIterator for &'a PortRegistry {
	type Item = &'a BoundListener;
	type IntoIter = std::slice::Iter<'a, BoundListener>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
