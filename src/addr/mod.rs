//! Address families and related types.
//!
//! This module defines the two address families a listener can use:
//! - `Ipv4` — Internet Protocol version 4
//! - `Ipv6` — Internet Protocol version 6
//!
//! plus the textual bind address of a configured listener and the
//! CIDR prefix matcher used by ban/filter lists.

mod ipv4;
mod ipv6;
mod mask;
pub use self::ipv4::{Ipv4, SocketAddrV4};
pub use self::ipv6::{Ipv6, SocketAddrV6};
pub use self::mask::{AddressMask, Cidr, match_cidr_bits};

use crate::error::SpecError;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

/// Trait for address family markers.
///
/// Each type implementing this trait represents an address family
/// that can be passed to the `socket()` syscall.
pub trait Domain {
	/// Socket address type used by `bind()` for this family.
	type Addr;
	/// Returns the libc constant for this address family.
	fn raw() -> libc::c_int;
}

/// Trait for address types that can be converted to raw sockaddr for syscalls.
pub trait ToSockAddr {
	/// Calls the provided closure with a pointer to the raw sockaddr and its size.
	/// Returns None if the address cannot be represented.
	fn with_raw<F, R>(&self, f: F) -> Option<R>
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R;
}

/*
 sockaddr_in and sockaddr_in6 have different sizes, so the raw struct is built
 on the callee's stack and only lent to the closure. The pointer never escapes.
*/

/// Trait for address types that can be created from raw sockaddr.
pub trait FromSockAddr: Sized {
	/// Creates address from raw sockaddr storage.
	///
	/// # Safety
	/// The sockaddr must be of the correct family for this type.
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self>;
}

/// Decodes whatever family `accept()` filled into `storage`.
pub(crate) fn peer_from_storage(storage: &libc::sockaddr_storage, len: libc::socklen_t) -> Option<SocketAddr> {
	let ptr = storage as *const _ as *const libc::sockaddr;
	match storage.ss_family as libc::c_int {
		libc::AF_INET => {
			let addr = unsafe { SocketAddrV4::from_sockaddr(ptr, len)? };
			Some(SocketAddr::from((addr.ip(), addr.port())))
		}
		libc::AF_INET6 => {
			let addr = unsafe { SocketAddrV6::from_sockaddr(ptr, len)? };
			Some(SocketAddr::from((addr.ip(), addr.port())))
		}
		_ => None,
	}
}

/// Address family used when a listener binds the wildcard address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
	Ipv4,
	/// Dual-stack on Linux unless `net.ipv6.bindv6only` is set.
	#[default]
	Ipv6,
}

/// Resolved bind address of one configured listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindAddr {
	/// All interfaces of the default family.
	Any,
	V4([u8; 4]),
	V6([u8; 16]),
}

impl BindAddr {
	/// Resolves a configured address. Empty or `*` means every interface;
	/// anything else must be a literal IP, hostnames are not looked up.
	pub fn parse(text: &str) -> Result<Self, SpecError> {
		let text = text.trim();
		if text.is_empty() || text == "*" {
			return Ok(BindAddr::Any);
		}
		match text.parse::<IpAddr>() {
			Ok(IpAddr::V4(ip)) => Ok(BindAddr::V4(ip.octets())),
			Ok(IpAddr::V6(ip)) => Ok(BindAddr::V6(ip.octets())),
			Err(_) => Err(SpecError::InvalidAddress { address: text.to_string() }),
		}
	}

	/// Family the socket must be opened with.
	pub fn family(&self, default: Family) -> Family {
		match self {
			BindAddr::Any => default,
			BindAddr::V4(_) => Family::Ipv4,
			BindAddr::V6(_) => Family::Ipv6,
		}
	}

	pub fn is_wildcard(&self) -> bool {
		matches!(self, BindAddr::Any)
	}
}
