//! Typestate TCP listening sockets.
//!
//! `RawSocket<D>` --bind--> `BoundSocket<D>` --listen--> `Listener<D>`
//!
//! Each transition consumes the previous state, so a socket can only be
//! listened on after a successful bind. `D` is the address family.

mod listener;
mod raw;
mod options;
mod bound;
mod builder;
mod factory;

pub use self::listener::{Listener, AcceptResult, accept_nonblocking};
pub use self::raw::RawSocket;
pub use self::bound::BoundSocket;
pub use self::options::{set_reuse_addr, set_linger, get_linger, set_nonblocking, is_nonblocking};
pub use self::builder::ListenerBuilder;
pub use self::factory::{SocketFactory, TcpSocketFactory, ListenerOptions};
