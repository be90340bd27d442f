//! Small building blocks for network programs: an IPv4/IPv6 socket endpoint value type, strict number parsing, a run-once gate for fallible initialization, and indentation and detail-level annotations for output streams.
//!
//!
//! # Usage
//!
//! * [`Address`] is an IPv4 or IPv6 endpoint (or no address at all), parsed from text like `127.0.0.1:12345` or `[::1]:12345`, and convertible to and from [`socket2::SockAddr`] and the [standard library][std]'s socket address types.
//! * [`StrictParse`] and [`parse_to`] convert text to numbers, rejecting anything but whitespace after the number, and telling overflow apart from garbage.
//! * [`OnceGuard`] runs a fallible initialization closure at most once, across all threads.
//! * The [`annotate`] module tracks an indentation depth and a detail level on a writer, with guards that restore the previous value when dropped.
//! * [`escape`] makes untrusted text safe to put in an error message.
//!
//!
//! # Feature flags and platform support
//!
//! This library is based on [`socket2`], and should work on any platform that `socket2` works on, which as of this writing is Unix-like platforms and Windows.
//!
//! Some items in this crate are only available if a particular feature flag is enabled. Such items are noted with an “Availability” section in their documentation.
#![cfg_attr(all(
	feature = "clap",
	feature = "serde",
), doc = r#"

## Available feature flags

This library has the following feature flags:

* `clap`: Support parsing addresses from the command line using [`clap`]. Specifically, this adds [`Address::value_parser`].
* `serde`: Support reading addresses from configuration files using [`serde`]. Specifically, this adds implementations of [`serde::Serialize`] and [`serde::Deserialize`] to [`Address`].
"#)]
//!
//!
//! # Logging
//!
//! This library emits diagnostics through [`tracing`]. Nothing is logged unless the application installs a subscriber.

#![allow(clippy::tabs_in_doc_comments)] // This project uses tabs for indentation throughout, including in documentation examples.

mod addr;
pub mod annotate;
pub mod errors;
mod once;
mod parse;
mod util;

pub use self::{
	addr::*,
	once::*,
	parse::*,
	util::*,
};

cfg_if::cfg_if! {
	if #[cfg(windows)] {
		#[path = "sys/windows.rs"] mod sys;
	}
	else {
		#[path = "sys/other.rs"] mod sys;
	}
}
