//! Turning configured `bind` entries into live listening sockets.
//!
//! The binder runs on the daemon's control thread at startup and again on
//! every configuration reload. Reloads are additive: listeners already in
//! the [`PortRegistry`] are left untouched and nothing is ever unbound.

mod binder;
mod registry;
mod spec;

pub use self::binder::{BindMode, BindOutcome, ListenerBinder};
pub use self::registry::{BoundListener, PortRegistry};
pub use self::spec::{BindEntry, ListenerSpec, PortValue};

use std::os::fd::BorrowedFd;

/// The event loop that will wait for accept readiness on new listeners.
///
/// Called once per newly bound socket. The registry keeps ownership of
/// the descriptor; the engine only watches it.
pub trait Readiness {
	fn register_listener(&mut self, fd: BorrowedFd<'_>) -> std::io::Result<()>;
}
