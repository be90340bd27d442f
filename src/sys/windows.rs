use std::{
	ffi::{c_int, CString},
	io,
};
use windows_sys::Win32::{
	NetworkManagement::IpHelper::if_nametoindex,
	Networking::WinSock,
};

pub const AF_UNSPEC: c_int = WinSock::AF_UNSPEC as c_int;
pub const AF_INET: c_int = WinSock::AF_INET as c_int;
pub const AF_INET6: c_int = WinSock::AF_INET6 as c_int;

pub fn scope_id_from_name(name: &str) -> io::Result<u32> {
	let name = CString::new(name)
		.map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;

	// SAFETY: `name` is a valid, NUL-terminated string that outlives the call.
	let index: u32 = unsafe { if_nametoindex(name.as_ptr().cast()) };

	if index == 0 {
		Err(io::Error::new(io::ErrorKind::NotFound, "no network interface with that name"))
	}
	else {
		Ok(index)
	}
}
