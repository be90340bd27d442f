use std::fmt::{self, Display, Formatter, Write};

/// Returns the name and version of this library, like `inet_endpoint 0.1.0`.
pub fn version() -> &'static str {
	concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}

/// Wraps `text` so that, when [`Display`]ed, control characters and other unprintable bytes are escaped.
///
/// This is used to embed untrusted text in error messages. The output is always a single line of printable ASCII, so a NUL byte or newline in user input can't hide or forge part of a log message.
///
/// The escapes are:
///
/// * `\a`, `\b`, `\f`, `\n`, `\r`, `\t`, and `\v` for the corresponding control characters
/// * `\\`, `\'`, and `\"` for backslash and quotes
/// * <code>&Backslash;x<var>NN</var></code> (two lowercase hex digits) for every other byte outside the printable ASCII range, including each byte of a multi-byte UTF-8 character
///
///
/// # Example
///
/// ```
/// assert_eq!(
/// 	inet_endpoint::escape("a\tb\0\"c\"").to_string(),
/// 	r#"a\tb\x00\"c\""#,
/// );
/// ```
pub fn escape(text: &str) -> Escaped<'_> {
	Escaped(text)
}

/// The result of [`escape`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Escaped<'a>(&'a str);

impl Display for Escaped<'_> {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		for byte in self.0.bytes() {
			let letter: char = match byte {
				0x07 => 'a',
				0x08 => 'b',
				0x0c => 'f',
				b'\n' => 'n',
				b'\r' => 'r',
				b'\t' => 't',
				0x0b => 'v',
				b'\\' => '\\',
				b'\'' => '\'',
				b'"' => '"',

				b' '..=b'~' => {
					f.write_char(byte as char)?;
					continue;
				},

				_ => {
					write!(f, "\\x{byte:02x}")?;
					continue;
				},
			};

			f.write_char('\\')?;
			f.write_char(letter)?;
		}

		Ok(())
	}
}

#[test]
fn test_escape() {
	for (input, expected) in [
		("", ""),
		("plain text", "plain text"),
		("\x07\x08\x0c\n\r\t\x0b", r"\a\b\f\n\r\t\v"),
		(r#"back\slash 'single' "double""#, r#"back\\slash \'single\' \"double\""#),
		("nul\0byte", r"nul\x00byte"),
		("\x1b[0m", r"\x1b[0m"),
		("\x7f", r"\x7f"),
		("é", r"\xc3\xa9"),
	] {
		assert_eq!(escape(input).to_string(), expected);
	}
}

#[test]
fn test_version() {
	assert!(version().starts_with("inet_endpoint "));
	assert!(version().ends_with(env!("CARGO_PKG_VERSION")));
}
