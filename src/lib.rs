//! Listener binding for a network daemon.
//!
//! Configured `bind` entries become non-blocking listening sockets; the
//! same pass can be re-run on reload to add new listeners while keeping
//! the ones already bound. Also home to the CIDR prefix matcher used by
//! ban and filter lists.

pub mod socket;
pub mod bind;
pub mod config;
pub mod engine;
mod addr;
mod error;

pub use self::error::{SocketError, SpecError, MaskError, BindError, errno};
pub use self::addr::{Domain, Ipv4, Ipv6, SocketAddrV4, SocketAddrV6, Family, BindAddr,
					 AddressMask, Cidr, match_cidr_bits};
pub use self::socket::{Listener, ListenerBuilder, RawSocket, BoundSocket, AcceptResult,
					   SocketFactory, TcpSocketFactory, ListenerOptions, accept_nonblocking,
					   set_reuse_addr, set_linger, get_linger, set_nonblocking, is_nonblocking};
pub use self::bind::{BindEntry, BindMode, BindOutcome, BoundListener, ListenerBinder,
					 ListenerSpec, PortRegistry, PortValue, Readiness};
pub use self::config::{Config, ConfigError, load_config};
pub use self::engine::EpollEngine;
