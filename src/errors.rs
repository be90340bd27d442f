//! Various errors that can be raised by this library.

use crate::{
	util::escape,
	AddressFamily,
};
use std::{
	ffi::c_int,
	io,
};

#[cfg(doc)]
use {
	crate::{
		parse_to,
		Address,
		StrictParse,
	},
	std::str::FromStr,
};

/// An error in converting text to a number with [`StrictParse`] or [`parse_to`].
///
/// Every variant keeps the complete text that was being parsed. When displayed, that text is [escaped][escape], so control characters are visible and the message stays on one line.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ParseNumberError {
	/// The text does not start with a number (after optional leading whitespace).
	#[error("invalid input: \"{}\"", escape(.input))]
	#[non_exhaustive]
	InvalidInput {
		/// The text that was being parsed.
		input: String,
	},

	/// The text starts with a number, but it is too large (or, for floating-point numbers, too close to zero) to be represented by the target type.
	#[error("out of range: \"{}\"", escape(.input))]
	#[non_exhaustive]
	OutOfRange {
		/// The text that was being parsed.
		input: String,
	},

	/// The text starts with a number, but something other than whitespace follows it.
	#[error("extraneous characters after number: \"{}\"", escape(.input))]
	#[non_exhaustive]
	TrailingGarbage {
		/// The text that was being parsed.
		input: String,
	},
}

impl ParseNumberError {
	/// The text that was being parsed when this error occurred.
	pub fn input(&self) -> &str {
		match self {
			| Self::InvalidInput { input }
			| Self::OutOfRange { input }
			| Self::TrailingGarbage { input }
			=> input,
		}
	}
}

impl From<ParseNumberError> for io::Error {
	fn from(error: ParseNumberError) -> Self {
		io::Error::new(io::ErrorKind::InvalidInput, error)
	}
}

/// An error parsing an [`Address`] from text, using [`Address::parse`], [`Address::set_address`], or [`FromStr`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum InvalidAddressError {
	/// The text contains a `[` without a matching `]`, or vice versa, or the brackets are in the wrong order.
	#[error("IPv6 address with mismatched brackets: \"{}\"", escape(.input))]
	#[non_exhaustive]
	MismatchedBrackets {
		/// The complete text that was being parsed.
		input: String,
	},

	/// The IP address part of the text is longer than any valid address of its family can be.
	#[error("{family} address too long: \"{}\"", escape(.input))]
	#[non_exhaustive]
	TooLong {
		/// The address family that the text appeared to be.
		family: AddressFamily,

		/// The complete text that was being parsed.
		input: String,
	},

	/// The IP address part of the text is not a valid IPv4 or IPv6 address.
	#[error("not a valid IP address: \"{}\"", escape(.input))]
	#[non_exhaustive]
	NotAnIpAddress {
		/// The complete text that was being parsed.
		input: String,
	},

	/// There is text before the opening bracket, or text after the closing bracket that is neither a `%scope` nor a `:port`.
	#[error("unexpected text around bracketed IPv6 address: \"{}\"", escape(.input))]
	#[non_exhaustive]
	UnexpectedText {
		/// The complete text that was being parsed.
		input: String,
	},

	/// The IPv6 scope (the part after `%`) is neither a 32-bit number nor the name of a network interface on this system.
	#[error("invalid IPv6 scope \"{}\" in \"{}\": {error}", escape(.scope), escape(.input))]
	#[non_exhaustive]
	InvalidScope {
		/// The scope text.
		scope: String,

		/// The complete text that was being parsed.
		input: String,

		/// Why the scope is invalid: a numeric scope that doesn't fit in 32 bits, or the error from looking it up as an interface name.
		#[source]
		error: io::Error,
	},

	/// The port number (the part after the last `:`) is not a valid number from 0 to 65535.
	#[error("invalid port number in \"{}\": {error}", escape(.input))]
	#[non_exhaustive]
	InvalidPort {
		/// The complete text that was being parsed.
		input: String,

		/// The error that this one arose from. A number that is valid but larger than 65535 is reported as [`ParseNumberError::OutOfRange`].
		#[source]
		error: ParseNumberError,
	},
}

impl InvalidAddressError {
	/// The complete text that was being parsed when this error occurred.
	pub fn input(&self) -> &str {
		match self {
			| Self::MismatchedBrackets { input }
			| Self::TooLong { input, .. }
			| Self::NotAnIpAddress { input }
			| Self::UnexpectedText { input }
			| Self::InvalidScope { input, .. }
			| Self::InvalidPort { input, .. }
			=> input,
		}
	}
}

impl From<InvalidAddressError> for io::Error {
	fn from(error: InvalidAddressError) -> Self {
		io::Error::new(io::ErrorKind::InvalidInput, error)
	}
}

/// An address family other than IPv4, IPv6, or unspecified was requested, or a family that the operation does not accept.
///
/// This is raised by [`Address::with_raw_family`], [`Address::from_sock_addr`], [`Address::wildcard`], and [`Address::loopback`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unsupported address family {family}")]
#[non_exhaustive]
pub struct UnsupportedFamilyError {
	/// The raw address family number, like `AF_INET`.
	pub family: c_int,
}

impl From<UnsupportedFamilyError> for io::Error {
	fn from(error: UnsupportedFamilyError) -> Self {
		io::Error::new(io::ErrorKind::Unsupported, error)
	}
}

/// [`Address::set_port`] was called on an address whose family is unspecified. Set the family before the port.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("address family must be set before the port")]
#[non_exhaustive]
pub struct FamilyNotSetError;

impl From<FamilyNotSetError> for io::Error {
	fn from(error: FamilyNotSetError) -> Self {
		io::Error::new(io::ErrorKind::InvalidInput, error)
	}
}

/// An operation was used on an address whose family it is not defined for, such as [`Address::map_4to6`] on an unspecified address.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("operation is not defined for {family} addresses")]
#[non_exhaustive]
pub struct InvalidFamilyError {
	/// The family of the address that the operation was attempted on.
	pub family: AddressFamily,
}

impl From<InvalidFamilyError> for io::Error {
	fn from(error: InvalidFamilyError) -> Self {
		io::Error::new(io::ErrorKind::InvalidInput, error)
	}
}
