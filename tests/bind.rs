use bindlane::{
	AcceptResult, BindEntry, BindError, EpollEngine, ListenerBinder, ListenerOptions, PortRegistry,
	Readiness, TcpSocketFactory, accept_nonblocking, get_linger, is_nonblocking,
};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};

#[derive(Default)]
struct Registrations(Vec<RawFd>);

impl Readiness for Registrations {
	fn register_listener(&mut self, fd: BorrowedFd<'_>) -> std::io::Result<()> {
		self.0.push(fd.as_raw_fd());
		Ok(())
	}
}

/// A loopback port nobody is listening on right now.
fn free_port() -> u16 {
	let spare = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	spare.local_addr().unwrap().port()
}

fn binder() -> ListenerBinder<TcpSocketFactory> {
	ListenerBinder::new(TcpSocketFactory::new(ListenerOptions::default()))
}

#[test]
fn initial_bind_opens_nonblocking_lingering_listener() {
	let port = free_port();
	let mut registry = PortRegistry::new();
	let mut engine = Registrations::default();

	let count = binder()
		.initial_bind(&[BindEntry::new(port, "127.0.0.1", "")], &mut registry, &mut engine)
		.unwrap();

	assert_eq!(count, 1);
	let listener = registry.iter().next().unwrap();
	assert_eq!(engine.0, vec![listener.as_fd().as_raw_fd()]);
	assert!(is_nonblocking(listener).unwrap());
	assert_eq!(get_linger(listener).unwrap(), Some(1));
	assert!(std::net::TcpStream::connect(("127.0.0.1", port)).is_ok());
}

#[test]
fn accepted_peer_is_reported() {
	let port = free_port();
	let mut registry = PortRegistry::new();
	binder()
		.initial_bind(&[BindEntry::new(port, "127.0.0.1", "clients")], &mut registry, &mut Registrations::default())
		.unwrap();
	let listener = registry.iter().next().unwrap();

	assert!(matches!(accept_nonblocking(listener.as_fd()).unwrap(), AcceptResult::WouldBlock));

	let client = std::net::TcpStream::connect(("127.0.0.1", port)).unwrap();
	let mut engine = EpollEngine::new().unwrap();
	engine.register_listener(listener.as_fd()).unwrap();
	assert_eq!(engine.wait(1000).unwrap().len(), 1);

	match accept_nonblocking(listener.as_fd()).unwrap() {
		AcceptResult::Connection(_, peer) => assert_eq!(peer, Some(client.local_addr().unwrap())),
		other => panic!("expected a connection, got {other:?}"),
	}
}

#[test]
fn held_port_does_not_stop_the_rest() {
	let held = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let busy = held.local_addr().unwrap().port();
	let free = free_port();
	let mut registry = PortRegistry::new();

	let count = binder()
		.initial_bind(
			&[BindEntry::new(busy, "127.0.0.1", ""), BindEntry::new(free, "127.0.0.1", "")],
			&mut registry,
			&mut Registrations::default(),
		)
		.unwrap();

	assert_eq!(count, 1);
	assert!(!registry.contains(busy, "127.0.0.1"));
	assert!(registry.contains(free, "127.0.0.1"));
}

#[test]
fn nothing_bindable_at_startup_is_fatal() {
	let held = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let busy = held.local_addr().unwrap().port();

	let err = binder()
		.initial_bind(&[BindEntry::new(busy, "127.0.0.1", "")], &mut PortRegistry::new(), &mut Registrations::default())
		.unwrap_err();
	assert_eq!(err, BindError::NoPortsBound { attempted: 1 });
}

#[test]
fn reload_is_idempotent_and_additive() {
	let first = free_port();
	let binder = binder();
	let mut registry = PortRegistry::new();
	let mut engine = Registrations::default();
	let config = vec![BindEntry::new(first, "127.0.0.1", "")];

	let startup = binder.initial_bind(&config, &mut registry, &mut engine).unwrap();
	assert_eq!(binder.rebind_on_reload(&config, &mut registry, &mut engine), startup);
	assert_eq!(binder.rebind_on_reload(&config, &mut registry, &mut engine), startup);
	assert_eq!(engine.0.len(), 1);

	let second = free_port();
	let grown = vec![BindEntry::new(first, "127.0.0.1", ""), BindEntry::new(second, "127.0.0.1", "")];
	assert_eq!(binder.rebind_on_reload(&grown, &mut registry, &mut engine), startup + 1);
	assert_eq!(engine.0.len(), 2);

	// entries that vanish from the config stay bound
	assert_eq!(binder.rebind_on_reload(&[], &mut registry, &mut engine), startup + 1);
	assert!(std::net::TcpStream::connect(("127.0.0.1", first)).is_ok());
}
