use std::os::fd::AsRawFd;
use crate::error::{SocketError, errno};

/// Sets SO_REUSEADDR on a socket.
///
/// Allows binding to an address that's in TIME_WAIT state.
/// Essential for server restarts.
pub fn set_reuse_addr<S: AsRawFd>(socket: &S, enable: bool) -> std::io::Result<()> {
	let val: libc::c_int = if enable { 1 } else { 0 };
	let result = unsafe {
		libc::setsockopt(
			socket.as_raw_fd(),
			libc::SOL_SOCKET,
			libc::SO_REUSEADDR,
			&val as *const _ as *const libc::c_void,
			std::mem::size_of::<libc::c_int>() as libc::socklen_t,
		)
	};
	if result == -1 {
		Err(SocketError::SetOption { errno: errno(), option: "SO_REUSEADDR" }.into())
	} else {
		Ok(())
	}
}

/// Sets SO_LINGER.
///
/// `Some(secs)` makes close() wait at most `secs` for unsent data,
/// `None` restores the default background close.
pub fn set_linger<S: AsRawFd>(socket: &S, linger: Option<u32>) -> std::io::Result<()> {
	let val = match linger {
		None => libc::linger { l_onoff: 0, l_linger: 0 },
		Some(seconds) => libc::linger {
			l_onoff: 1,
			l_linger: libc::c_int::try_from(seconds)
				.map_err(|_| SocketError::SetOption { errno: libc::EINVAL, option: "SO_LINGER" })?,
		},
	};
	let result = unsafe {
		libc::setsockopt(
			socket.as_raw_fd(),
			libc::SOL_SOCKET,
			libc::SO_LINGER,
			&val as *const _ as *const libc::c_void,
			std::mem::size_of::<libc::linger>() as libc::socklen_t,
		)
	};
	if result == -1 {
		Err(SocketError::SetOption { errno: errno(), option: "SO_LINGER" }.into())
	} else {
		Ok(())
	}
}

/// Reads SO_LINGER back. `None` when lingering is off.
pub fn get_linger<S: AsRawFd>(socket: &S) -> std::io::Result<Option<u32>> {
	let mut val = libc::linger { l_onoff: 0, l_linger: 0 };
	let mut len = std::mem::size_of::<libc::linger>() as libc::socklen_t;
	let result = unsafe {
		libc::getsockopt(
			socket.as_raw_fd(),
			libc::SOL_SOCKET,
			libc::SO_LINGER,
			&mut val as *mut _ as *mut libc::c_void,
			&mut len,
		)
	};
	if result == -1 {
		return Err(SocketError::GetOption { errno: errno(), option: "SO_LINGER" }.into());
	}
	Ok((val.l_onoff != 0).then_some(val.l_linger as u32))
}

/// Sets or clears `O_NONBLOCK`.
pub fn set_nonblocking<S: AsRawFd>(socket: &S, nonblocking: bool) -> std::io::Result<()> {
	let flags = unsafe { libc::fcntl(socket.as_raw_fd(), libc::F_GETFL) };
	if flags == -1 {
		return Err(SocketError::GetOption { errno: errno(), option: "F_GETFL" }.into());
	}

	let new_flags = if nonblocking {
		flags | libc::O_NONBLOCK
	} else {
		flags & !libc::O_NONBLOCK
	};

	let result = unsafe { libc::fcntl(socket.as_raw_fd(), libc::F_SETFL, new_flags) };
	if result == -1 {
		return Err(SocketError::SetOption { errno: errno(), option: "O_NONBLOCK" }.into());
	}
	Ok(())
}

pub fn is_nonblocking<S: AsRawFd>(socket: &S) -> std::io::Result<bool> {
	let flags = unsafe { libc::fcntl(socket.as_raw_fd(), libc::F_GETFL) };
	if flags == -1 {
		return Err(SocketError::GetOption { errno: errno(), option: "F_GETFL" }.into());
	}
	Ok(flags & libc::O_NONBLOCK != 0)
}
