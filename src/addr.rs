use crate::{
	errors::{
		FamilyNotSetError,
		InvalidAddressError,
		InvalidFamilyError,
		ParseNumberError,
		UnsupportedFamilyError,
	},
	parse_to,
	sys,
};
use socket2::SockAddr;
use std::{
	ffi::c_int,
	fmt::{self, Display, Formatter},
	io,
	net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddrV4, SocketAddrV6},
	str::FromStr,
};

#[cfg(test)]
use {
	assert_matches::assert_matches,
	test_log::test,
};

/// Longest possible IPv4 address text, `255.255.255.255`. This is `INET_ADDRSTRLEN` without the terminating NUL.
const MAX_IPV4_TEXT_LEN: usize = 15;

/// Longest possible IPv6 address text, not counting any `%scope`. This is `INET6_ADDRSTRLEN` without the terminating NUL.
const MAX_IPV6_TEXT_LEN: usize = 45;

/// The family of an [`Address`].
#[derive(Clone, Copy, Debug, Default, derive_more::Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AddressFamily {
	/// No address. Corresponds to `AF_UNSPEC`.
	#[default]
	#[display(fmt = "unspecified")]
	Unspecified,

	/// IPv4. Corresponds to `AF_INET`.
	#[display(fmt = "IPv4")]
	Ipv4,

	/// IPv6. Corresponds to `AF_INET6`.
	#[display(fmt = "IPv6")]
	Ipv6,
}

impl AddressFamily {
	/// Converts an operating-system address family number, like `AF_INET`, to an `AddressFamily`.
	///
	///
	/// # Errors
	///
	/// [`UnsupportedFamilyError`] if `family` is not `AF_UNSPEC`, `AF_INET`, or `AF_INET6`.
	pub fn from_raw(family: c_int) -> Result<Self, UnsupportedFamilyError> {
		match family {
			sys::AF_UNSPEC => Ok(Self::Unspecified),
			sys::AF_INET => Ok(Self::Ipv4),
			sys::AF_INET6 => Ok(Self::Ipv6),
			_ => Err(UnsupportedFamilyError { family }),
		}
	}

	/// Converts this `AddressFamily` to the operating system's address family number.
	pub fn to_raw(self) -> c_int {
		match self {
			Self::Unspecified => sys::AF_UNSPEC,
			Self::Ipv4 => sys::AF_INET,
			Self::Ipv6 => sys::AF_INET6,
		}
	}

	/// The [`socket2::Domain`] for sockets of this family, or `None` if the family is unspecified.
	pub fn domain(self) -> Option<socket2::Domain> {
		match self {
			Self::Unspecified => None,
			Self::Ipv4 => Some(socket2::Domain::IPV4),
			Self::Ipv6 => Some(socket2::Domain::IPV6),
		}
	}
}

impl TryFrom<c_int> for AddressFamily {
	type Error = UnsupportedFamilyError;

	fn try_from(family: c_int) -> Result<Self, Self::Error> {
		Self::from_raw(family)
	}
}

/// A socket endpoint: an IPv4 or IPv6 address and port, or no address at all.
///
/// This is a plain value type. It only *describes* an endpoint; it doesn't open, bind, or resolve anything. Its OS-level form, for passing to socket calls, is available from [`to_sock_addr`][Self::to_sock_addr], and [`size`][Self::size] is the length of that form.
///
/// The family is fixed when the `Address` is created. An IPv6 `Address` also carries a scope ID (interface index) and flow info.
///
///
/// # Parsing
///
/// An `Address` can be parsed from text using [`Address::parse`] (with a default port) or [`FromStr`] (with default port zero). The accepted forms are:
///
/// * `1.2.3.4`, an IPv4 address without port number
/// * `1.2.3.4:5`, an IPv4 address with port number
/// * `1::2`, a non-bracketed IPv6 address without port number
/// * `[1::2]`, a bracketed IPv6 address without port number
/// * `[1::2]:3`, a bracketed IPv6 address with port number
///
/// An IPv6 address can carry a scope: `fe80::1%2`, `[fe80::1%eth0]:3`, or `[fe80::1]%2:3` (the form produced by [`Display`]). A numeric scope is used as is; anything else is looked up as a network interface name.
///
/// A port number is parsed with [`StrictParse`][crate::StrictParse], so `0x50` is port 80, and must be no larger than 65535.
///
///
/// # Display
///
/// IPv4 addresses are displayed as `1.2.3.4:5`, and IPv6 addresses as `[1::2]%6:5`. The port is left out if it is zero, and the scope is left out if it is zero. An unspecified address is displayed as `<>`, which can't be parsed back.
///
/// IPv4-mapped IPv6 addresses are displayed in mixed notation, like `[::ffff:10.0.0.1]:53`.
#[cfg_attr(feature = "serde", doc = r#"

# Serialization

With the `serde` feature, an `Address` is serialized and deserialized as a string, using the same syntax as [`Display`] and [`FromStr`].
"#)]
///
///
/// # Example
///
/// ```
/// use inet_endpoint::{Address, AddressFamily};
///
/// let addr = Address::parse("10.0.0.1", 53).unwrap();
/// assert_eq!(addr.family(), AddressFamily::Ipv4);
/// assert_eq!(addr.port(), 53);
///
/// let mapped = addr.map_4to6().unwrap();
/// assert_eq!(mapped.to_string(), "[::ffff:10.0.0.1]:53");
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde_with::DeserializeFromStr, serde_with::SerializeDisplay))]
pub struct Address {
	endpoint: Endpoint,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
enum Endpoint {
	#[default]
	Unspecified,
	V4(SocketAddrV4),
	V6(SocketAddrV6),
}

impl Address {
	/// Creates an `Address` of the given family, with an all-zero address and port.
	///
	/// For IPv4 and IPv6, that is the [wildcard][Self::is_wildcard] address with port zero.
	pub fn new(family: AddressFamily) -> Self {
		let endpoint = match family {
			AddressFamily::Unspecified => Endpoint::Unspecified,
			AddressFamily::Ipv4 => Endpoint::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
			AddressFamily::Ipv6 => Endpoint::V6(SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, 0, 0, 0)),
		};

		Self { endpoint }
	}

	/// Like [`Address::new`], but with an operating-system address family number, like `AF_INET`.
	///
	///
	/// # Errors
	///
	/// [`UnsupportedFamilyError`] if `family` is not `AF_UNSPEC`, `AF_INET`, or `AF_INET6`.
	pub fn with_raw_family(family: c_int) -> Result<Self, UnsupportedFamilyError> {
		AddressFamily::from_raw(family).map(Self::new)
	}

	/// Copies an OS-level socket address. `None` produces an unspecified `Address`.
	///
	/// To wrap a raw `sockaddr` received from the operating system, first build a [`SockAddr`] from it, using [`SockAddr::new`] or [`SockAddr::try_init`].
	///
	///
	/// # Errors
	///
	/// [`UnsupportedFamilyError`] if `addr` is of any family other than unspecified, IPv4, or IPv6, such as a Unix-domain socket address.
	pub fn from_sock_addr(addr: Option<&SockAddr>) -> Result<Self, UnsupportedFamilyError> {
		let Some(addr) = addr else {
			return Ok(Self::default());
		};

		let raw_family = addr.family() as c_int;
		let unsupported = || UnsupportedFamilyError { family: raw_family };

		match AddressFamily::from_raw(raw_family)? {
			AddressFamily::Unspecified => Ok(Self::default()),
			AddressFamily::Ipv4 => addr.as_socket_ipv4().map(Self::from).ok_or_else(unsupported),
			AddressFamily::Ipv6 => addr.as_socket_ipv6().map(Self::from).ok_or_else(unsupported),
		}
	}

	/// Returns the OS-level form of this address, for passing to socket calls, or `None` if this address is unspecified.
	pub fn to_sock_addr(&self) -> Option<SockAddr> {
		match self.endpoint {
			Endpoint::Unspecified => None,
			Endpoint::V4(addr) => Some(addr.into()),
			Endpoint::V6(addr) => Some(addr.into()),
		}
	}

	/// Parses an address from text. If the text has no port number, `default_port` is used. See [the type documentation][Address] for the syntax.
	///
	///
	/// # Errors
	///
	/// [`InvalidAddressError`] if the text is not a valid address.
	pub fn parse(text: &str, default_port: u16) -> Result<Self, InvalidAddressError> {
		let (family, literal, port_text) = split_address(text)?;
		let (host, inner_scope) = split_scope(family, literal);

		let max_len = match family {
			AddressFamily::Ipv6 => MAX_IPV6_TEXT_LEN,
			_ => MAX_IPV4_TEXT_LEN,
		};

		if host.len() > max_len {
			return Err(InvalidAddressError::TooLong {
				family,
				input: text.to_owned(),
			});
		}

		let (outer_scope, port_text): (Option<&str>, Option<&str>) = match port_text {
			PortText::None => (None, None),
			PortText::Port(port) => (None, Some(port)),
			PortText::ScopeAndPort { scope, port } => (Some(scope), port),
		};

		let scope: Option<&str> = match (inner_scope, outer_scope) {
			(Some(_), Some(_)) => return Err(InvalidAddressError::UnexpectedText {
				input: text.to_owned(),
			}),

			(scope @ Some(_), None) | (None, scope) => scope,
		};

		let not_an_ip = || InvalidAddressError::NotAnIpAddress {
			input: text.to_owned(),
		};

		let ip: IpAddr = match family {
			AddressFamily::Ipv6 => Ipv6Addr::from_str(host).map_err(|_| not_an_ip())?.into(),
			_ => Ipv4Addr::from_str(host).map_err(|_| not_an_ip())?.into(),
		};

		let port: u16 = match port_text {
			Some(port_text) => parse_port(text, port_text)?,
			None => default_port,
		};

		let endpoint = match ip {
			IpAddr::V4(ip) => Endpoint::V4(SocketAddrV4::new(ip, port)),

			IpAddr::V6(ip) => {
				let scope_id: u32 = match scope {
					Some(scope) => parse_scope(text, scope)?,
					None => 0,
				};

				Endpoint::V6(SocketAddrV6::new(ip, port, 0, scope_id))
			},
		};

		Ok(Self { endpoint })
	}

	/// Parses an address from text and stores it in `self`. If parsing fails, `self` is not changed.
	///
	/// This is the in-place form of [`Address::parse`].
	pub fn set_address(&mut self, text: &str, default_port: u16) -> Result<(), InvalidAddressError> {
		*self = Self::parse(text, default_port)?;
		Ok(())
	}

	/// Returns a [clap](https://docs.rs/clap) value parser for `Address`es, using `default_port` when the text has no port number.
	///
	/// ```
	/// # use inet_endpoint::Address;
	/// let command = clap::Command::new("server").arg(
	/// 	clap::Arg::new("listen")
	/// 	.long("listen")
	/// 	.value_parser(Address::value_parser(8080))
	/// );
	///
	/// let matches = command.get_matches_from(["server", "--listen", "127.0.0.1"]);
	/// let listen: &Address = matches.get_one("listen").unwrap();
	/// assert_eq!(listen.to_string(), "127.0.0.1:8080");
	/// ```
	///
	///
	/// # Availability
	///
	/// Requires the `clap` feature.
	#[cfg(feature = "clap")]
	pub fn value_parser(default_port: u16) -> impl clap::builder::TypedValueParser<Value = Self> {
		move |text: &str| Self::parse(text, default_port)
	}

	/// The family of this address.
	pub fn family(&self) -> AddressFamily {
		match self.endpoint {
			Endpoint::Unspecified => AddressFamily::Unspecified,
			Endpoint::V4(_) => AddressFamily::Ipv4,
			Endpoint::V6(_) => AddressFamily::Ipv6,
		}
	}

	/// The length, in bytes, of the OS-level form of this address (`sockaddr_in` or `sockaddr_in6`). For an unspecified address, this is the length of the larger of the two.
	pub fn size(&self) -> usize {
		let sock_addr: SockAddr = match self.endpoint {
			Endpoint::V4(addr) => addr.into(),
			Endpoint::V6(addr) => addr.into(),
			Endpoint::Unspecified => SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, 0, 0, 0).into(),
		};

		sock_addr.len() as usize
	}

	/// The IP address, or `None` if this address is unspecified.
	pub fn ip(&self) -> Option<IpAddr> {
		match self.endpoint {
			Endpoint::Unspecified => None,
			Endpoint::V4(addr) => Some((*addr.ip()).into()),
			Endpoint::V6(addr) => Some((*addr.ip()).into()),
		}
	}

	/// The port number. Zero if this address is unspecified.
	pub fn port(&self) -> u16 {
		match self.endpoint {
			Endpoint::Unspecified => 0,
			Endpoint::V4(addr) => addr.port(),
			Endpoint::V6(addr) => addr.port(),
		}
	}

	/// Changes the port number.
	///
	///
	/// # Errors
	///
	/// [`FamilyNotSetError`] if this address is unspecified.
	pub fn set_port(&mut self, port: u16) -> Result<(), FamilyNotSetError> {
		match &mut self.endpoint {
			Endpoint::Unspecified => return Err(FamilyNotSetError),
			Endpoint::V4(addr) => addr.set_port(port),
			Endpoint::V6(addr) => addr.set_port(port),
		}

		Ok(())
	}

	/// The IPv6 scope ID (usually a network interface index). Zero for IPv4 and unspecified addresses.
	pub fn scope_id(&self) -> u32 {
		match self.endpoint {
			Endpoint::V6(addr) => addr.scope_id(),
			_ => 0,
		}
	}

	/// Returns true if this is the wildcard (“any”) address of its family: `0.0.0.0` or `::`.
	pub fn is_wildcard(&self) -> bool {
		match self.endpoint {
			Endpoint::Unspecified => false,
			Endpoint::V4(addr) => addr.ip().is_unspecified(),
			Endpoint::V6(addr) => addr.ip().is_unspecified(),
		}
	}

	/// Returns true if this is the loopback address of its family: exactly `127.0.0.1` or `::1`.
	///
	/// Note that other addresses in `127.0.0.0/8` are not considered loopback addresses by this method.
	pub fn is_loopback(&self) -> bool {
		match self.endpoint {
			Endpoint::Unspecified => false,
			Endpoint::V4(addr) => *addr.ip() == Ipv4Addr::LOCALHOST,
			Endpoint::V6(addr) => addr.ip().is_loopback(),
		}
	}

	/// Returns true if this is a multicast address: in `224.0.0.0/4` or `ff00::/8`.
	pub fn is_multicast(&self) -> bool {
		match self.endpoint {
			Endpoint::Unspecified => false,
			Endpoint::V4(addr) => addr.ip().is_multicast(),
			Endpoint::V6(addr) => addr.ip().is_multicast(),
		}
	}

	/// Converts an IPv4 address to its IPv4-mapped IPv6 form, `::ffff:a.b.c.d`, keeping the port. IPv6 addresses are returned unchanged.
	///
	///
	/// # Errors
	///
	/// [`InvalidFamilyError`] if this address is unspecified.
	pub fn map_4to6(&self) -> Result<Self, InvalidFamilyError> {
		match self.endpoint {
			Endpoint::Unspecified => Err(InvalidFamilyError {
				family: AddressFamily::Unspecified,
			}),

			Endpoint::V4(addr) => Ok(SocketAddrV6::new(addr.ip().to_ipv6_mapped(), addr.port(), 0, 0).into()),

			Endpoint::V6(_) => Ok(*self),
		}
	}

	/// The wildcard (“any”) address of the given family, `0.0.0.0` or `::`, with the given port.
	///
	///
	/// # Errors
	///
	/// [`UnsupportedFamilyError`] if `family` is unspecified.
	pub fn wildcard(family: AddressFamily, port: u16) -> Result<Self, UnsupportedFamilyError> {
		match family {
			AddressFamily::Unspecified => Err(UnsupportedFamilyError { family: family.to_raw() }),
			AddressFamily::Ipv4 => Ok(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port).into()),
			AddressFamily::Ipv6 => Ok(SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, port, 0, 0).into()),
		}
	}

	/// The loopback address of the given family, `127.0.0.1` or `::1`, with the given port.
	///
	///
	/// # Errors
	///
	/// [`UnsupportedFamilyError`] if `family` is unspecified.
	pub fn loopback(family: AddressFamily, port: u16) -> Result<Self, UnsupportedFamilyError> {
		match family {
			AddressFamily::Unspecified => Err(UnsupportedFamilyError { family: family.to_raw() }),
			AddressFamily::Ipv4 => Ok(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port).into()),
			AddressFamily::Ipv6 => Ok(SocketAddrV6::new(Ipv6Addr::LOCALHOST, port, 0, 0).into()),
		}
	}

	/// Formats this address as text. Same as [`ToString::to_string`].
	pub fn to_text(&self) -> String {
		self.to_string()
	}
}

/// What follows the IP address in the text.
enum PortText<'a> {
	None,
	Port(&'a str),

	/// Only after a closing bracket: `%scope`, optionally followed by `:port`.
	ScopeAndPort {
		scope: &'a str,
		port: Option<&'a str>,
	},
}

/// Works out the family from the text's colons and brackets, and splits off the IP address literal (possibly with a `%scope`) from whatever follows it.
fn split_address(text: &str) -> Result<(AddressFamily, &str, PortText<'_>), InvalidAddressError> {
	let first_colon = text.find(':');
	let last_colon = text.rfind(':');
	let open_bracket = text.find('[');
	let close_bracket = text.rfind(']');

	match (open_bracket, close_bracket) {
		(None, None) => Ok(match (first_colon, last_colon) {
			// No brackets or port. Plain IPv4.
			(None, _) => (AddressFamily::Ipv4, text, PortText::None),

			// No brackets, and only one colon. IPv4 with port.
			(Some(first), Some(last)) if first == last => (
				AddressFamily::Ipv4,
				&text[..first],
				PortText::Port(&text[first + 1..]),
			),

			// No brackets, and more than one colon. Bare IPv6, which can't have a port.
			_ => (AddressFamily::Ipv6, text, PortText::None),
		}),

		(Some(open), Some(close)) if open < close => {
			if open != 0 {
				return Err(InvalidAddressError::UnexpectedText {
					input: text.to_owned(),
				});
			}

			let literal = &text[open + 1..close];
			let after = &text[close + 1..];

			let (before_colon, port): (&str, Option<&str>) = match after.split_once(':') {
				Some((before_colon, port)) => (before_colon, Some(port)),
				None => (after, None),
			};

			let port_text = match (before_colon.strip_prefix('%'), port) {
				(Some(scope), port) => PortText::ScopeAndPort { scope, port },
				(None, _) if !before_colon.is_empty() => return Err(InvalidAddressError::UnexpectedText {
					input: text.to_owned(),
				}),
				(None, Some(port)) => PortText::Port(port),
				(None, None) => PortText::None,
			};

			Ok((AddressFamily::Ipv6, literal, port_text))
		},

		_ => Err(InvalidAddressError::MismatchedBrackets {
			input: text.to_owned(),
		}),
	}
}

/// Splits an IPv6 literal at its `%`, if any. IPv4 literals never have a scope; a `%` in one is left in place, and makes the literal invalid.
fn split_scope(family: AddressFamily, literal: &str) -> (&str, Option<&str>) {
	match family {
		AddressFamily::Ipv6 => match literal.split_once('%') {
			Some((host, scope)) => (host, Some(scope)),
			None => (literal, None),
		},

		_ => (literal, None),
	}
}

fn parse_port(text: &str, port_text: &str) -> Result<u16, InvalidAddressError> {
	let invalid_port = |error: ParseNumberError| InvalidAddressError::InvalidPort {
		input: text.to_owned(),
		error,
	};

	let port: u64 = parse_to(port_text).map_err(invalid_port)?;

	u16::try_from(port).map_err(|_| invalid_port(ParseNumberError::OutOfRange {
		input: port_text.to_owned(),
	}))
}

fn parse_scope(text: &str, scope: &str) -> Result<u32, InvalidAddressError> {
	let invalid_scope = |error: io::Error| InvalidAddressError::InvalidScope {
		scope: scope.to_owned(),
		input: text.to_owned(),
		error,
	};

	if !scope.is_empty() && scope.bytes().all(|byte| byte.is_ascii_digit()) {
		let scope_id: u64 = parse_to(scope).map_err(|error| invalid_scope(error.into()))?;

		return u32::try_from(scope_id).map_err(|_| invalid_scope(ParseNumberError::OutOfRange {
			input: scope.to_owned(),
		}.into()));
	}

	let scope_id = sys::scope_id_from_name(scope).map_err(invalid_scope)?;
	tracing::debug!(interface = scope, scope_id, "resolved IPv6 scope from interface name");
	Ok(scope_id)
}

impl FromStr for Address {
	type Err = InvalidAddressError;

	/// Parses an address, using port zero if the text has no port number.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s, 0)
	}
}

impl Display for Address {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		match self.endpoint {
			Endpoint::Unspecified => f.write_str("<>"),

			Endpoint::V4(addr) => {
				write!(f, "{}", addr.ip())?;

				if addr.port() != 0 {
					write!(f, ":{}", addr.port())?;
				}

				Ok(())
			},

			Endpoint::V6(addr) => {
				write!(f, "[{}]", addr.ip())?;

				if addr.scope_id() != 0 {
					write!(f, "%{}", addr.scope_id())?;
				}

				if addr.port() != 0 {
					write!(f, ":{}", addr.port())?;
				}

				Ok(())
			},
		}
	}
}

impl From<SocketAddrV4> for Address {
	fn from(addr: SocketAddrV4) -> Self {
		Self { endpoint: Endpoint::V4(addr) }
	}
}

impl From<SocketAddrV6> for Address {
	fn from(addr: SocketAddrV6) -> Self {
		Self { endpoint: Endpoint::V6(addr) }
	}
}

impl From<std::net::SocketAddr> for Address {
	fn from(addr: std::net::SocketAddr) -> Self {
		match addr {
			std::net::SocketAddr::V4(addr) => addr.into(),
			std::net::SocketAddr::V6(addr) => addr.into(),
		}
	}
}

/// Produces an address with port zero.
impl From<IpAddr> for Address {
	fn from(addr: IpAddr) -> Self {
		std::net::SocketAddr::new(addr, 0).into()
	}
}

impl TryFrom<Address> for std::net::SocketAddr {
	type Error = InvalidFamilyError;

	fn try_from(addr: Address) -> Result<Self, Self::Error> {
		match addr.endpoint {
			Endpoint::Unspecified => Err(InvalidFamilyError {
				family: AddressFamily::Unspecified,
			}),

			Endpoint::V4(addr) => Ok(addr.into()),
			Endpoint::V6(addr) => Ok(addr.into()),
		}
	}
}

impl TryFrom<&SockAddr> for Address {
	type Error = UnsupportedFamilyError;

	fn try_from(addr: &SockAddr) -> Result<Self, Self::Error> {
		Self::from_sock_addr(Some(addr))
	}
}

#[test]
fn test_parse_display() {
	for (text, default_port, expected_family, expected_port, expected_display) in [
		("1.2.3.4", 0, AddressFamily::Ipv4, 0, "1.2.3.4"),
		("1.2.3.4", 99, AddressFamily::Ipv4, 99, "1.2.3.4:99"),
		("1.2.3.4:5", 99, AddressFamily::Ipv4, 5, "1.2.3.4:5"),
		("1.2.3.4:0", 99, AddressFamily::Ipv4, 0, "1.2.3.4"),
		("1.2.3.4:0x50", 0, AddressFamily::Ipv4, 80, "1.2.3.4:80"),
		("1.2.3.4:65535", 0, AddressFamily::Ipv4, 65535, "1.2.3.4:65535"),
		("1::2", 0, AddressFamily::Ipv6, 0, "[1::2]"),
		("1::2", 7, AddressFamily::Ipv6, 7, "[1::2]:7"),
		("[1::2]", 7, AddressFamily::Ipv6, 7, "[1::2]:7"),
		("[1::2]:3", 7, AddressFamily::Ipv6, 3, "[1::2]:3"),
		("[0:0:0:0:0:0:0:1]:3", 0, AddressFamily::Ipv6, 3, "[::1]:3"),
		("fe80::1%4", 0, AddressFamily::Ipv6, 0, "[fe80::1]%4"),
		("[fe80::1%4]:3", 0, AddressFamily::Ipv6, 3, "[fe80::1]%4:3"),
		("[fe80::1]%4:3", 0, AddressFamily::Ipv6, 3, "[fe80::1]%4:3"),
		("[fe80::1]%4", 0, AddressFamily::Ipv6, 0, "[fe80::1]%4"),
		("[::ffff:10.0.0.1]:53", 0, AddressFamily::Ipv6, 53, "[::ffff:10.0.0.1]:53"),
	] {
		let addr = Address::parse(text, default_port).unwrap();

		assert_eq!(addr.family(), expected_family, "parsing {text:?}");
		assert_eq!(addr.port(), expected_port, "parsing {text:?}");
		assert_eq!(addr.to_string(), expected_display, "parsing {text:?}");

		// Display output is parseable, and means the same thing.
		assert_eq!(Address::from_str(expected_display).unwrap(), addr, "reparsing {expected_display:?}");
	}
}

#[test]
fn test_parse_errors() {
	for text in ["[::1", "::1]", "]::1[", "1.2.3.4]"] {
		assert_matches!(
			Address::from_str(text),
			Err(InvalidAddressError::MismatchedBrackets { input }) if input == text
		);
	}

	for text in ["x[::1]", "[::1]x", "[::1]x:80", "[fe80::1%1]%2"] {
		assert_matches!(Address::from_str(text), Err(InvalidAddressError::UnexpectedText { .. }), "parsing {text:?}");
	}

	for text in ["", "1.2.3", "1.2.3.256", "01.2.3.4", "localhost", ":80", "1::2::3", "[]", "[1.2.3.4]:80", "1.2.3.4%1"] {
		assert_matches!(Address::from_str(text), Err(InvalidAddressError::NotAnIpAddress { .. }), "parsing {text:?}");
	}

	assert_matches!(
		Address::from_str("1111.2222.3333.4444:80"),
		Err(InvalidAddressError::TooLong { family: AddressFamily::Ipv4, .. })
	);

	assert_matches!(
		Address::from_str(&format!("[{}]:80", "1:".repeat(30))),
		Err(InvalidAddressError::TooLong { family: AddressFamily::Ipv6, .. })
	);

	assert_matches!(
		Address::from_str("1.2.3.4:bogus"),
		Err(InvalidAddressError::InvalidPort { error: ParseNumberError::InvalidInput { .. }, .. })
	);

	assert_matches!(
		Address::from_str("1.2.3.4:"),
		Err(InvalidAddressError::InvalidPort { error: ParseNumberError::InvalidInput { .. }, .. })
	);

	assert_matches!(
		Address::from_str("[::1]:80x"),
		Err(InvalidAddressError::InvalidPort { error: ParseNumberError::TrailingGarbage { .. }, .. })
	);

	for text in ["1.2.3.4:65536", "1.2.3.4:99999999999", "1.2.3.4:-1", "[::1]:99999999999999999999999"] {
		assert_matches!(
			Address::from_str(text),
			Err(InvalidAddressError::InvalidPort { error: ParseNumberError::OutOfRange { .. }, .. }),
			"parsing {text:?}"
		);
	}

	assert_matches!(
		Address::from_str("[fe80::1%4294967296]"),
		Err(InvalidAddressError::InvalidScope { .. })
	);

	assert_matches!(
		Address::from_str("[fe80::1%no-such-interface-here]:80"),
		Err(InvalidAddressError::InvalidScope { scope, .. }) if scope == "no-such-interface-here"
	);
}

#[test]
fn test_failed_parse_leaves_value_alone() {
	let mut addr = Address::parse("10.1.2.3:4", 0).unwrap();

	assert!(addr.set_address("10.1.2.3:bogus", 0).is_err());
	assert_eq!(addr.to_string(), "10.1.2.3:4");

	addr.set_address("[::1]", 5).unwrap();
	assert_eq!(addr.to_string(), "[::1]:5");
}

#[test]
fn test_error_message_is_escaped() {
	let error = Address::from_str("[::1\n").unwrap_err();
	assert_eq!(error.to_string(), r#"IPv6 address with mismatched brackets: "[::1\n""#);
}

#[test]
fn test_queries() {
	let unspecified = Address::default();
	assert_eq!(unspecified.family(), AddressFamily::Unspecified);
	assert_eq!(unspecified.port(), 0);
	assert_eq!(unspecified.ip(), None);
	assert!(!unspecified.is_wildcard());
	assert!(!unspecified.is_loopback());
	assert!(!unspecified.is_multicast());
	assert_eq!(unspecified.to_string(), "<>");

	assert!(Address::wildcard(AddressFamily::Ipv4, 0).unwrap().is_wildcard());
	assert!(Address::wildcard(AddressFamily::Ipv6, 0).unwrap().is_wildcard());
	assert!(Address::loopback(AddressFamily::Ipv4, 0).unwrap().is_loopback());
	assert!(Address::loopback(AddressFamily::Ipv6, 0).unwrap().is_loopback());
	assert!(!Address::from_str("127.0.0.2").unwrap().is_loopback());
	assert!(!Address::loopback(AddressFamily::Ipv4, 0).unwrap().is_wildcard());

	assert!(Address::from_str("239.1.1.1").unwrap().is_multicast());
	assert!(Address::from_str("224.0.0.1").unwrap().is_multicast());
	assert!(!Address::from_str("240.0.0.1").unwrap().is_multicast());
	assert!(Address::from_str("ff02::1").unwrap().is_multicast());
	assert!(!Address::from_str("fe80::1").unwrap().is_multicast());

	assert_eq!(Address::loopback(AddressFamily::Ipv6, 8080).unwrap().to_string(), "[::1]:8080");
	assert_eq!(Address::wildcard(AddressFamily::Ipv4, 8080).unwrap().to_string(), "0.0.0.0:8080");

	assert_matches!(
		Address::wildcard(AddressFamily::Unspecified, 0),
		Err(UnsupportedFamilyError { family }) if family == sys::AF_UNSPEC
	);
	assert_matches!(Address::loopback(AddressFamily::Unspecified, 0), Err(UnsupportedFamilyError { .. }));
}

#[test]
fn test_set_port() {
	let mut addr = Address::new(AddressFamily::Ipv4);
	addr.set_port(1234).unwrap();
	assert_eq!(addr.to_string(), "0.0.0.0:1234");

	let mut addr = Address::new(AddressFamily::Ipv6);
	addr.set_port(1234).unwrap();
	assert_eq!(addr.port(), 1234);

	let mut addr = Address::new(AddressFamily::Unspecified);
	assert_matches!(addr.set_port(1234), Err(FamilyNotSetError));
	assert_eq!(addr, Address::default());
}

#[test]
fn test_map_4to6() {
	let mapped = Address::parse("10.0.0.1", 53).unwrap().map_4to6().unwrap();
	assert_eq!(mapped.family(), AddressFamily::Ipv6);
	assert_eq!(mapped.port(), 53);
	assert_eq!(mapped.to_string(), "[::ffff:10.0.0.1]:53");

	let Some(IpAddr::V6(ip)) = mapped.ip() else {
		panic!("mapped address is not IPv6");
	};
	assert_eq!(ip.octets(), [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 10, 0, 0, 1]);

	let v6 = Address::from_str("[2001:db8::1]:443").unwrap();
	assert_eq!(v6.map_4to6().unwrap(), v6);

	assert_matches!(
		Address::default().map_4to6(),
		Err(InvalidFamilyError { family: AddressFamily::Unspecified })
	);
}

#[test]
fn test_raw_family() {
	assert_eq!(Address::with_raw_family(sys::AF_INET).unwrap().family(), AddressFamily::Ipv4);
	assert_eq!(Address::with_raw_family(sys::AF_INET6).unwrap().family(), AddressFamily::Ipv6);
	assert_eq!(Address::with_raw_family(sys::AF_UNSPEC).unwrap(), Address::default());

	let bogus: c_int = 12345;
	assert_matches!(
		Address::with_raw_family(bogus),
		Err(UnsupportedFamilyError { family }) if family == bogus
	);

	for family in [AddressFamily::Unspecified, AddressFamily::Ipv4, AddressFamily::Ipv6] {
		assert_eq!(AddressFamily::try_from(family.to_raw()).unwrap(), family);
	}
}

#[test]
fn test_sock_addr() {
	assert_eq!(Address::from_sock_addr(None).unwrap(), Address::default());
	assert!(Address::default().to_sock_addr().is_none());

	for text in ["192.0.2.7:9", "[2001:db8::7]%3:9"] {
		let addr = Address::from_str(text).unwrap();
		let sock_addr = addr.to_sock_addr().unwrap();

		assert_eq!(sock_addr.len() as usize, addr.size());
		assert_eq!(sock_addr.domain(), addr.family().domain().unwrap());
		assert_eq!(Address::try_from(&sock_addr).unwrap(), addr);
	}

	let v4_size = Address::new(AddressFamily::Ipv4).size();
	let v6_size = Address::new(AddressFamily::Ipv6).size();
	assert!(v4_size < v6_size);
	assert_eq!(Address::default().size(), v6_size);

	// SAFETY: the storage is left as `try_init` provides it, all zeroes, which is an `AF_UNSPEC` address.
	let ((), unspecified) = unsafe { SockAddr::try_init(|_, _| Ok(())) }.unwrap();
	assert_eq!(unspecified.family() as c_int, sys::AF_UNSPEC);
	assert_eq!(Address::from_sock_addr(Some(&unspecified)).unwrap(), Address::default());
	assert_eq!(Address::try_from(&unspecified).unwrap().family(), AddressFamily::Unspecified);

	#[cfg(unix)] {
		let unix = SockAddr::unix("/tmp/inet_endpoint.socket").unwrap();
		assert_matches!(Address::try_from(&unix), Err(UnsupportedFamilyError { .. }));
	}
}

#[test]
fn test_std_conversions() {
	let std_addr: std::net::SocketAddr = "[2001:db8::1]:80".parse().unwrap();
	let addr = Address::from(std_addr);
	assert_eq!(addr.to_string(), "[2001:db8::1]:80");
	assert_eq!(std::net::SocketAddr::try_from(addr).unwrap(), std_addr);

	let addr = Address::from(IpAddr::from(Ipv4Addr::new(192, 0, 2, 1)));
	assert_eq!(addr.to_string(), "192.0.2.1");

	assert_matches!(std::net::SocketAddr::try_from(Address::default()), Err(InvalidFamilyError { .. }));
}

#[test]
fn test_serde() {
	for (addr, expected_serialization) in [
		(Address::loopback(AddressFamily::Ipv4, 27910).unwrap(), "127.0.0.1:27910"),
		(Address::loopback(AddressFamily::Ipv4, 0).unwrap(), "127.0.0.1"),
		(
			SocketAddrV6::new(Ipv6Addr::from(0x2607_f8b0_400a_0804_0000_0000_0000_200e_u128), 27910, 0, 0).into(),
			"[2607:f8b0:400a:804::200e]:27910",
		),
	] {
		assert_eq!(addr.to_string(), expected_serialization);
		assert_eq!(Address::from_str(expected_serialization).unwrap(), addr);

		#[cfg(feature = "serde")] {
			let serialized = serde_json::to_value(addr).unwrap();
			assert_matches!(
				&serialized,
				serde_json::Value::String(string)
				if string == expected_serialization
			);

			assert_eq!(serde_json::from_value::<Address>(serialized).unwrap(), addr);
		}
	}

	#[cfg(feature = "serde")]
	assert!(serde_json::from_str::<Address>("\"[::1\"").is_err());
}
