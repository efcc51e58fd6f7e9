use anyhow::{Context, Result};
use std::os::fd::{AsFd, AsRawFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use bindlane::{
    AcceptResult, Cidr, EpollEngine, ListenerBinder, PortRegistry, TcpSocketFactory,
    accept_nonblocking, load_config,
};

static RELOAD: AtomicBool = AtomicBool::new(false);
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(signal: libc::c_int) {
    if signal == libc::SIGHUP {
        RELOAD.store(true, Ordering::SeqCst);
    } else {
        SHUTDOWN.store(true, Ordering::SeqCst);
    }
}

fn install_signal_handlers() -> Result<()> {
    let handler = on_signal as extern "C" fn(libc::c_int);
    for signal in [libc::SIGHUP, libc::SIGINT, libc::SIGTERM] {
        let previous = unsafe { libc::signal(signal, handler as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            return Err(std::io::Error::last_os_error()).context("installing signal handler");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("bindlane=debug".parse()?),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "bindlane.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("loading {config_path}"))?;

    install_signal_handlers()?;

    let mut engine = EpollEngine::new().context("creating epoll instance")?;
    let mut registry = PortRegistry::new();
    let binder = ListenerBinder::new(TcpSocketFactory::new(config.listener_options()));

    let count = binder.initial_bind(&config.binds, &mut registry, &mut engine)?;
    info!(count, "listening");

    let mut deny = config.deny_list()?;

    while !SHUTDOWN.load(Ordering::SeqCst) {
        if RELOAD.swap(false, Ordering::SeqCst) {
            reload(&config_path, &mut registry, &mut engine, &mut deny);
        }
        for fd in engine.wait(1000).context("waiting for listeners")? {
            accept_pending(&registry, fd, &deny);
        }
    }

    info!("Shutdown signal received");
    Ok(())
}

/// Re-reads the config and binds whatever is new. A broken file keeps the
/// current listeners and deny list.
fn reload(path: &str, registry: &mut PortRegistry, engine: &mut EpollEngine, deny: &mut Vec<Cidr>) {
    let config = match load_config(path) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "reload failed, keeping current configuration");
            return;
        }
    };

    let before = registry.len();
    let binder = ListenerBinder::new(TcpSocketFactory::new(config.listener_options()));
    let total = binder.rebind_on_reload(&config.binds, registry, engine);
    info!(added = total - before, total, "configuration reloaded");

    match config.deny_list() {
        Ok(list) => *deny = list,
        Err(err) => warn!(error = %err, "keeping previous deny list"),
    }
}

/// Drains the accept queue of one ready listener.
fn accept_pending(registry: &PortRegistry, ready: RawFd, deny: &[Cidr]) {
    let Some(listener) = registry.iter().find(|l| l.as_fd().as_raw_fd() == ready) else {
        return;
    };

    loop {
        match accept_nonblocking(listener.as_fd()) {
            Ok(AcceptResult::Connection(_conn, Some(peer))) => {
                if deny.iter().any(|mask| mask.contains(peer.ip())) {
                    info!(%peer, port = listener.port(), "connection from denied address dropped");
                } else {
                    // no session layer here, the connection is closed on drop
                    debug!(%peer, port = listener.port(), "accepted connection");
                }
            }
            Ok(AcceptResult::Connection(_conn, None)) => {
                debug!(port = listener.port(), "accepted connection from unknown family");
            }
            Ok(AcceptResult::Interrupted) => continue,
            Ok(AcceptResult::WouldBlock) => break,
            Err(err) => {
                warn!(port = listener.port(), error = %err, "accept failed");
                break;
            }
        }
    }
}
