use std::{
	ffi::c_int,
	io,
};

pub const AF_UNSPEC: c_int = libc::AF_UNSPEC;
pub const AF_INET: c_int = libc::AF_INET;
pub const AF_INET6: c_int = libc::AF_INET6;

pub fn scope_id_from_name(name: &str) -> io::Result<u32> {
	let index: libc::c_uint = nix::net::if_::if_nametoindex(name)?;
	Ok(index)
}
