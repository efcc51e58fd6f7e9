use std::os::fd::AsFd;
use tracing::{debug, error, info, trace, warn};
use crate::error::BindError;
use crate::socket::SocketFactory;
use super::{BindEntry, BoundListener, ListenerSpec, PortRegistry, Readiness};

/// Which lifecycle event triggered a bind pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
	/// Process startup. Binding nothing is fatal.
	Initial,
	/// Configuration reload. Existing listeners are skipped quietly and
	/// binding nothing just means nothing new was configured.
	Reload,
}

/// Per-pass counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindOutcome {
	/// Client entries that were not already bound.
	pub attempted: usize,
	pub bound: usize,
	/// Entries already present in the registry.
	pub skipped: usize,
	pub failed: usize,
	/// Registry size after the pass.
	pub total: usize,
}

/// Binds configured listeners through a [`SocketFactory`].
#[derive(Debug, Clone, Default)]
pub struct ListenerBinder<F: SocketFactory> {
	factory: F,
}

impl<F: SocketFactory> ListenerBinder<F> {
	pub fn new(factory: F) -> Self {
		Self { factory }
	}

	pub fn factory(&self) -> &F {
		&self.factory
	}

	/// Startup pass. Returns the number of bound listeners, or an error if
	/// none of the configured ports could be bound.
	pub fn initial_bind<R: Readiness + ?Sized>(
		&self,
		entries: &[BindEntry],
		registry: &mut PortRegistry,
		readiness: &mut R,
	) -> Result<usize, BindError> {
		let outcome = self.bind_all(BindMode::Initial, entries, registry, readiness);
		if outcome.bound == 0 {
			error!(attempted = outcome.attempted, "no ports bound, bailing");
			return Err(BindError::NoPortsBound { attempted: outcome.attempted });
		}
		info!(bound = outcome.bound, failed = outcome.failed, "listeners ready");
		Ok(outcome.total)
	}

	/// Reload pass. Returns the registry total, old listeners included.
	pub fn rebind_on_reload<R: Readiness + ?Sized>(
		&self,
		entries: &[BindEntry],
		registry: &mut PortRegistry,
		readiness: &mut R,
	) -> usize {
		let initial = registry.len();
		debug!(initial, "rebinding listeners");

		let outcome = self.bind_all(BindMode::Reload, entries, registry, readiness);
		if outcome.attempted == 0 {
			debug!("nothing new to bind");
		} else {
			info!(new = outcome.bound, failed = outcome.failed, total = outcome.total, "rebind finished");
		}
		outcome.total
	}

	/// Walks `entries` in order and binds every client entry that is not
	/// already in `registry`. A failing entry is logged and the pass moves on.
	pub fn bind_all<R: Readiness + ?Sized>(
		&self,
		mode: BindMode,
		entries: &[BindEntry],
		registry: &mut PortRegistry,
		readiness: &mut R,
	) -> BindOutcome {
		let mut outcome = BindOutcome::default();

		for entry in entries {
			if !entry.is_client_kind() {
				trace!(kind = %entry.kind, "bind entry handled elsewhere");
				continue;
			}

			let spec = match ListenerSpec::try_from(entry) {
				Ok(spec) => spec,
				Err(err) => {
					warn!(address = %entry.address, port = ?entry.port, error = %err, "invalid bind entry");
					outcome.attempted += 1;
					outcome.failed += 1;
					continue;
				}
			};
			let shown = if spec.address().is_empty() { "*" } else { spec.address() };

			if registry.contains(spec.port(), spec.address()) {
				match mode {
					BindMode::Initial => debug!(address = shown, port = spec.port(), "already bound, skipping"),
					BindMode::Reload => trace!(address = shown, port = spec.port(), "unchanged listener"),
				}
				outcome.skipped += 1;
				continue;
			}

			outcome.attempted += 1;
			debug!(address = shown, port = spec.port(), kind = spec.kind(), "binding from config");

			let fd = match self.factory.open_listening(spec.bind_addr(), spec.port()) {
				Ok(fd) => fd,
				Err(err) => {
					warn!(address = shown, port = spec.port(), error = %err, "failed to bind port");
					outcome.failed += 1;
					continue;
				}
			};

			// fd is closed on drop if the engine refuses it
			if let Err(err) = readiness.register_listener(fd.as_fd()) {
				warn!(address = shown, port = spec.port(), error = %err, "could not watch listener");
				outcome.failed += 1;
				continue;
			}

			registry.add(BoundListener::new(fd, spec.port(), spec.address()));
			outcome.bound += 1;
			debug!(address = shown, port = spec.port(), "bound port");
		}

		outcome.total = registry.len();
		outcome
	}
}
