use crate::errors::ParseNumberError;

#[cfg(test)]
use {
	assert_matches::assert_matches,
	test_log::test,
};

/// Strict conversion of text to a number.
///
/// Unlike [`str::parse`], this follows the lexical rules of the C library's `strtod`, `strtoll`, and `strtoull` functions (in the "C" locale), and then insists that nothing but whitespace follows the number:
///
/// * Leading whitespace is skipped.
/// * Integers may start with `+` or `-`, and are read in base 16 if prefixed with `0x` or `0X`, base 8 if they start with `0`, and base 10 otherwise.
/// * Floating-point numbers may be decimal (`1.5`, `.5`, `1e-3`), hexadecimal (`0x1.8p1`), infinity (`inf`, `infinity`), or not-a-number (`nan`, `nan(…)`), case insensitively.
/// * Trailing whitespace is skipped. Anything else after the number is an error.
///
/// Parsing is purely functional: it allocates nothing unless it fails, and is safe to call from any number of threads.
///
///
/// # Errors
///
/// * [`ParseNumberError::InvalidInput`] if the text does not start with a number.
/// * [`ParseNumberError::OutOfRange`] if the number does not fit in `Self`. For floating-point numbers, that includes nonzero numbers so close to zero that they can only be approximated by zero or a subnormal number.
/// * [`ParseNumberError::TrailingGarbage`] if the number is followed by something other than whitespace.
///
///
/// # Example
///
/// ```
/// use inet_endpoint::StrictParse;
///
/// assert_eq!(u64::parse_strict("  42  ").unwrap(), 42);
/// assert_eq!(u64::parse_strict("0x2a").unwrap(), 42);
/// assert_eq!(i64::parse_strict("-052").unwrap(), -42);
/// assert!(u64::parse_strict("42x").is_err());
/// ```
pub trait StrictParse: Sized {
	/// Parses `text` as a `Self`. See the [trait documentation][StrictParse] for the rules.
	fn parse_strict(text: &str) -> Result<Self, ParseNumberError>;
}

/// Parses `text` as a `T`, using [`StrictParse`].
///
/// This is convenient when the target type is known from context:
///
/// ```
/// # use inet_endpoint::parse_to;
/// let timeout: f64 = parse_to("2.5").unwrap();
/// # assert_eq!(timeout, 2.5);
/// ```
pub fn parse_to<T: StrictParse>(text: &str) -> Result<T, ParseNumberError> {
	T::parse_strict(text)
}

impl StrictParse for u64 {
	fn parse_strict(text: &str) -> Result<Self, ParseNumberError> {
		let prefix = scan_integer(text)?;

		let magnitude: u64 =
			prefix.magnitude
			.ok_or_else(|| out_of_range(text))?;

		// Like `strtoull`, a minus sign negates the value in unsigned arithmetic.
		let value = match prefix.negative {
			true => magnitude.wrapping_neg(),
			false => magnitude,
		};

		expect_only_whitespace(text, prefix.end)?;
		Ok(value)
	}
}

impl StrictParse for i64 {
	fn parse_strict(text: &str) -> Result<Self, ParseNumberError> {
		let prefix = scan_integer(text)?;

		let magnitude: u64 =
			prefix.magnitude
			.ok_or_else(|| out_of_range(text))?;

		let value: i64 = match prefix.negative {
			true if magnitude <= i64::MIN.unsigned_abs() => (magnitude as i64).wrapping_neg(),
			false if magnitude <= i64::MAX as u64 => magnitude as i64,
			_ => return Err(out_of_range(text)),
		};

		expect_only_whitespace(text, prefix.end)?;
		Ok(value)
	}
}

impl StrictParse for f64 {
	fn parse_strict(text: &str) -> Result<Self, ParseNumberError> {
		let prefix = scan_float(text)?;

		if !prefix.special && (prefix.value.is_infinite() || prefix.underflow) {
			return Err(out_of_range(text));
		}

		expect_only_whitespace(text, prefix.end)?;
		Ok(prefix.value)
	}
}

/// Whitespace as recognized by C's `isspace` in the "C" locale. Unlike [`u8::is_ascii_whitespace`], this includes vertical tab.
fn is_c_space(byte: u8) -> bool {
	matches!(byte, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

fn invalid_input(text: &str) -> ParseNumberError {
	ParseNumberError::InvalidInput { input: text.to_owned() }
}

fn out_of_range(text: &str) -> ParseNumberError {
	ParseNumberError::OutOfRange { input: text.to_owned() }
}

fn expect_only_whitespace(text: &str, end: usize) -> Result<(), ParseNumberError> {
	if text.as_bytes()[end..].iter().all(|byte| is_c_space(*byte)) {
		Ok(())
	}
	else {
		Err(ParseNumberError::TrailingGarbage { input: text.to_owned() })
	}
}

fn skip_whitespace(bytes: &[u8], pos: usize) -> usize {
	bytes[pos..].iter()
	.position(|byte| !is_c_space(*byte))
	.map_or(bytes.len(), |offset| pos + offset)
}

/// Returns true and advances `pos` past the sign if there is a minus sign. Advances past, but ignores, a plus sign.
fn take_sign(bytes: &[u8], pos: &mut usize) -> bool {
	match bytes.get(*pos) {
		Some(b'-') => {
			*pos += 1;
			true
		},

		Some(b'+') => {
			*pos += 1;
			false
		},

		_ => false,
	}
}

fn count_digits(bytes: &[u8], from: usize, radix: u32) -> usize {
	bytes.get(from..).unwrap_or_default().iter()
	.take_while(|byte| (**byte as char).is_digit(radix))
	.count()
}

fn starts_with_ignore_case(bytes: &[u8], pos: usize, word: &str) -> bool {
	bytes.get(pos..pos + word.len())
	.is_some_and(|candidate| candidate.eq_ignore_ascii_case(word.as_bytes()))
}

fn has_hex_prefix(bytes: &[u8], pos: usize) -> bool {
	bytes.get(pos) == Some(&b'0') &&
	matches!(bytes.get(pos + 1), Some(b'x' | b'X'))
}

struct IntegerPrefix {
	negative: bool,

	/// `None` if the digits overflowed `u64`.
	magnitude: Option<u64>,

	end: usize,
}

fn scan_integer(text: &str) -> Result<IntegerPrefix, ParseNumberError> {
	let bytes = text.as_bytes();
	let mut pos = skip_whitespace(bytes, 0);
	let negative = take_sign(bytes, &mut pos);

	// `0x` is only a prefix if a hex digit follows it. Otherwise, the number is just `0`, and the `x` is left over.
	let radix: u32 =
		if has_hex_prefix(bytes, pos) && count_digits(bytes, pos + 2, 16) != 0 {
			pos += 2;
			16
		}
		else if bytes.get(pos) == Some(&b'0') {
			8
		}
		else {
			10
		};

	let digit_count = count_digits(bytes, pos, radix);

	if digit_count == 0 {
		return Err(invalid_input(text));
	}

	let magnitude: Option<u64> =
		bytes[pos..pos + digit_count].iter()
		.try_fold(0u64, |acc, byte| {
			let digit = (*byte as char).to_digit(radix)?;
			acc.checked_mul(u64::from(radix))?.checked_add(u64::from(digit))
		});

	Ok(IntegerPrefix {
		negative,
		magnitude,
		end: pos + digit_count,
	})
}

struct FloatPrefix {
	value: f64,

	/// Infinity or NaN, spelled out. These are exempt from range checking.
	special: bool,

	/// The number is nonzero, but too close to zero to be represented exactly: it was rounded to zero or to an inexact subnormal.
	underflow: bool,

	end: usize,
}

fn scan_float(text: &str) -> Result<FloatPrefix, ParseNumberError> {
	let bytes = text.as_bytes();
	let number_start = skip_whitespace(bytes, 0);
	let mut pos = number_start;
	let negative = take_sign(bytes, &mut pos);

	let sign = |value: f64| if negative { -value } else { value };

	for (word, value) in [
		("infinity", f64::INFINITY),
		("inf", f64::INFINITY),
		("nan", f64::NAN),
	] {
		if starts_with_ignore_case(bytes, pos, word) {
			pos += word.len();

			// `nan` may be followed by a parenthesized sequence of letters, digits, and underscores.
			if value.is_nan() && bytes.get(pos) == Some(&b'(') {
				let inner_len =
					bytes[pos + 1..].iter()
					.take_while(|byte| byte.is_ascii_alphanumeric() || **byte == b'_')
					.count();

				if bytes.get(pos + 1 + inner_len) == Some(&b')') {
					pos += inner_len + 2;
				}
			}

			return Ok(FloatPrefix {
				value: sign(value),
				special: true,
				underflow: false,
				end: pos,
			});
		}
	}

	if has_hex_prefix(bytes, pos) {
		let int_digits = count_digits(bytes, pos + 2, 16);
		let frac_digits = match bytes.get(pos + 2 + int_digits) {
			Some(b'.') => count_digits(bytes, pos + 3 + int_digits, 16),
			_ => 0,
		};

		if int_digits + frac_digits != 0 {
			let (value, underflow, end) = scan_hex_float(bytes, pos + 2);

			return Ok(FloatPrefix {
				value: sign(value),
				special: false,
				underflow,
				end,
			});
		}
	}

	let mantissa_start = pos;
	let int_digits = count_digits(bytes, pos, 10);
	pos += int_digits;

	if bytes.get(pos) == Some(&b'.') {
		let frac_digits = count_digits(bytes, pos + 1, 10);

		if int_digits + frac_digits != 0 {
			pos += 1 + frac_digits;
		}
	}

	if pos == mantissa_start {
		return Err(invalid_input(text));
	}

	let nonzero_mantissa =
		bytes[mantissa_start..pos].iter()
		.any(|byte| matches!(byte, b'1'..=b'9'));

	pos = scan_exponent(bytes, pos, b'e').0;

	// The scanned prefix is already known to follow the decimal grammar that `str::parse` accepts.
	let value: f64 =
		text[number_start..pos].parse()
		.map_err(|_| invalid_input(text))?;

	// A decimal number that lands in the subnormal range is, in practice, never exact.
	Ok(FloatPrefix {
		value,
		special: false,
		underflow: nonzero_mantissa && !value.is_normal(),
		end: pos,
	})
}

/// Scans an optional exponent (`e` or `p`, case insensitive, then an optionally signed decimal number). Returns the position after it and its value, which saturates instead of overflowing. If there is no well-formed exponent, returns `pos` unchanged and zero.
fn scan_exponent(bytes: &[u8], pos: usize, marker: u8) -> (usize, i64) {
	if !bytes.get(pos).is_some_and(|byte| byte.eq_ignore_ascii_case(&marker)) {
		return (pos, 0);
	}

	let mut digits_start = pos + 1;
	let negative = take_sign(bytes, &mut digits_start);
	let digit_count = count_digits(bytes, digits_start, 10);

	if digit_count == 0 {
		return (pos, 0);
	}

	let magnitude: i64 =
		bytes[digits_start..digits_start + digit_count].iter()
		.fold(0i64, |acc, byte| acc.saturating_mul(10).saturating_add(i64::from(byte - b'0')));

	(digits_start + digit_count, if negative { -magnitude } else { magnitude })
}

/// Scans a hexadecimal floating-point number, starting just after its `0x` prefix. The caller has already checked that at least one hex digit is present. Returns the unsigned value, whether it underflowed, and the end position.
fn scan_hex_float(bytes: &[u8], mut pos: usize) -> (f64, bool, usize) {
	// Only the first 15 significant hex digits (60 bits) are kept. Any nonzero digit after those only matters for rounding, so it is remembered in `sticky`.
	const MAX_KEPT_DIGITS: u32 = 15;

	let mut mantissa: u64 = 0;
	let mut kept_digits: u32 = 0;
	let mut exponent: i64 = 0;
	let mut sticky = false;
	let mut seen_point = false;

	loop {
		match bytes.get(pos) {
			Some(b'.') if !seen_point => seen_point = true,

			Some(byte) if byte.is_ascii_hexdigit() => {
				let digit = u64::from((*byte as char).to_digit(16).unwrap_or_default());

				if kept_digits < MAX_KEPT_DIGITS {
					if mantissa != 0 || digit != 0 {
						kept_digits += 1;
					}

					mantissa = mantissa * 16 + digit;

					if seen_point {
						exponent -= 4;
					}
				}
				else {
					sticky |= digit != 0;

					if !seen_point {
						exponent += 4;
					}
				}
			},

			_ => break,
		}

		pos += 1;
	}

	let (pos, binary_exponent) = scan_exponent(bytes, pos, b'p');
	let exponent = exponent.saturating_add(binary_exponent);

	let (value, exact) = round_to_f64(mantissa, sticky, exponent);
	let underflow = !exact && value < f64::MIN_POSITIVE;

	(value, underflow, pos)
}

/// Rounds `(mantissa + ε) × 2^exponent` to the nearest `f64`, ties to even, where ε is some nonzero fraction less than one if `sticky` is set and zero otherwise. Returns the result and whether it is exact.
///
/// `sticky` can only be set if `mantissa` has more significant bits than an `f64` can hold.
fn round_to_f64(mantissa: u64, sticky: bool, exponent: i64) -> (f64, bool) {
	if mantissa == 0 {
		return (0.0, true);
	}

	let bits = i64::from(u64::BITS - mantissa.leading_zeros());

	// Number of low bits to drop: enough to fit the 53-bit significand, and enough that the lowest kept bit is no smaller than the smallest subnormal, 2^-1074.
	let shift: i64 = (bits - 53).max((-1074i64).saturating_sub(exponent));

	let (kept, exact): (u64, bool) =
		if shift <= 0 {
			(mantissa, !sticky)
		}
		else if shift > bits {
			// Less than half of the smallest subnormal.
			(0, false)
		}
		else {
			let wide = u128::from(mantissa);
			let kept = wide >> shift;
			let remainder = wide & ((1u128 << shift) - 1);
			let half = 1u128 << (shift - 1);

			let round_up =
				remainder > half ||
				(remainder == half && (sticky || kept & 1 == 1));

			// `kept` has at most 53 bits here, so adding one can't overflow.
			((kept as u64) + u64::from(round_up), remainder == 0 && !sticky)
		};

	if kept == 0 {
		return (0.0, false);
	}

	let kept_exponent = exponent.saturating_add(shift.max(0));
	(scale_exact(kept, kept_exponent), exact)
}

/// Computes `significand × 2^exponent`, where `significand` has at most 54 bits and the result is either representable exactly or too large to represent. `exponent` is at least -1074.
fn scale_exact(significand: u64, exponent: i64) -> f64 {
	let value = significand as f64;

	if exponent > 1023 {
		f64::INFINITY
	}
	else if exponent >= -1022 {
		value * power_of_two(exponent)
	}
	else {
		// Scale in two steps, so that the intermediate product is an integer and the final one lands exactly on a subnormal.
		value * power_of_two(exponent + 1074) * power_of_two(-1074)
	}
}

/// Returns 2^`exponent`, for `exponent` from -1074 to 1023.
fn power_of_two(exponent: i64) -> f64 {
	if exponent >= -1022 {
		f64::from_bits(((exponent + 1023) as u64) << 52)
	}
	else {
		f64::from_bits(1u64 << (exponent + 1074))
	}
}

#[test]
fn test_parse_u64() {
	for (text, expected) in [
		("42", 42),
		("  42  ", 42),
		("\t\n42\x0b\x0c\r", 42),
		("+42", 42),
		("0", 0),
		("0x2a", 42),
		("0X2A", 42),
		("052", 42),
		("18446744073709551615", u64::MAX),
		("0xffffffffffffffff", u64::MAX),
		("-1", u64::MAX),
	] {
		assert_eq!(parse_to::<u64>(text).unwrap(), expected, "parsing {text:?}");
	}

	for text in ["", "   ", "x", "-", "+", "0x", "- 1", "\u{a0}1"] {
		if text == "0x" {
			// `0x` parses as `0` followed by `x`.
			assert_matches!(parse_to::<u64>(text), Err(ParseNumberError::TrailingGarbage { .. }));
		}
		else {
			assert_matches!(parse_to::<u64>(text), Err(ParseNumberError::InvalidInput { input }) if input == text);
		}
	}

	for text in ["18446744073709551616", "99999999999999999999999", "0x10000000000000000"] {
		assert_matches!(parse_to::<u64>(text), Err(ParseNumberError::OutOfRange { .. }));
	}

	for text in ["42x", "4 2", "08", "0x1g", "42.0", "1e3"] {
		assert_matches!(parse_to::<u64>(text), Err(ParseNumberError::TrailingGarbage { .. }), "parsing {text:?}");
	}
}

#[test]
fn test_parse_i64() {
	for (text, expected) in [
		("42", 42),
		("-42", -42),
		(" -0x2a ", -42),
		("-052", -42),
		("9223372036854775807", i64::MAX),
		("-9223372036854775808", i64::MIN),
	] {
		assert_eq!(parse_to::<i64>(text).unwrap(), expected, "parsing {text:?}");
	}

	for text in ["9223372036854775808", "-9223372036854775809", "0x8000000000000000"] {
		assert_matches!(parse_to::<i64>(text), Err(ParseNumberError::OutOfRange { .. }), "parsing {text:?}");
	}

	assert_matches!(parse_to::<i64>("abc"), Err(ParseNumberError::InvalidInput { .. }));
	assert_matches!(parse_to::<i64>("-1-"), Err(ParseNumberError::TrailingGarbage { .. }));
}

#[test]
fn test_parse_f64() {
	for (text, expected) in [
		("1.5", 1.5),
		(" 1.5 ", 1.5),
		("-1.5", -1.5),
		(".5", 0.5),
		("5.", 5.0),
		("1e3", 1000.0),
		("1E+3", 1000.0),
		("2.5e-1", 0.25),
		("0", 0.0),
		("0.000", 0.0),
		("0x10", 16.0),
		("0x1.8p1", 3.0),
		("0x.8", 0.5),
		("-0x1P-2", -0.25),
		("1.7976931348623157e308", f64::MAX),
		("0x1.0000000000000800000000000001p0", 1.0000000000000002),
		("0x1.000000000000080000001p0", 1.0000000000000002),
		("0x1.0000000000000800000000000000p0", 1.0),
		("0x1.0000000000001800000000000000p0", 1.0000000000000004),
		("0x1.fffffffffffffp1023", f64::MAX),
		("0x1p-1074", 5e-324),
		("0x0.8p-1022", 1.1125369292536007e-308),
		("0x1p-1022", f64::MIN_POSITIVE),
		("0x0.000000000000000000001p-900", 2f64.powi(-984)),
		("inf", f64::INFINITY),
		("-Infinity", f64::NEG_INFINITY),
	] {
		assert_eq!(parse_to::<f64>(text).unwrap(), expected, "parsing {text:?}");
	}

	assert!(parse_to::<f64>("nan").unwrap().is_nan());
	assert!(parse_to::<f64>("NaN(123abc) ").unwrap().is_nan());

	for text in ["", ".", "e5", "-", "x1", "in"] {
		assert_matches!(parse_to::<f64>(text), Err(ParseNumberError::InvalidInput { .. }), "parsing {text:?}");
	}

	for text in ["1e400", "-1e400", "1e-400", "4e-320", "0x1p2000", "0x1p1024", "0x1p-1075", "0x1.8p-1074"] {
		assert_matches!(parse_to::<f64>(text), Err(ParseNumberError::OutOfRange { .. }), "parsing {text:?}");
	}

	for text in ["1.5x", "1e", "1e+", "0x1p", "1.5 2", "infinite", "nan("] {
		assert_matches!(parse_to::<f64>(text), Err(ParseNumberError::TrailingGarbage { .. }), "parsing {text:?}");
	}
}

#[test]
fn test_error_message_escapes_input() {
	let error = parse_to::<u64>("1\n2").unwrap_err();
	assert_eq!(error.to_string(), r#"extraneous characters after number: "1\n2""#);
	assert_eq!(error.input(), "1\n2");
}
