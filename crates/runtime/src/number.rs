//! Numeric conversion for argument coercion.
//!
//! Argument coercion does not honour a user-settable NUMERIC DIGITS; it
//! converts at the fixed [`ARGUMENT_DIGITS`] ceiling so the conversion stays
//! fast and bounded no matter what the surrounding program configured.

/// Digit-precision ceiling used when coercing call arguments to whole
/// numbers.
pub const ARGUMENT_DIGITS: u32 = 9;

/// Parse a Rexx whole number, rejecting anything that needs more than
/// `digits` significant digits.
///
/// Accepted surface syntax is a blank-padded optional sign followed by
/// digits, with an optional fractional part that must be entirely zero.
/// Exponential notation is not a whole number.
pub fn parse_whole_number(source: &str, digits: u32) -> Option<i64> {
    let value = parse_signed(source)?;
    within_digits(value, digits).then_some(value)
}

/// Parse a string as a 64-bit integer, failing on overflow.
pub fn parse_int64(source: &str) -> Option<i64> {
    parse_signed(source)
}

/// Whether `value` is representable in `digits` significant digits.
pub fn within_digits(value: i64, digits: u32) -> bool {
    value.unsigned_abs() < 10u64.pow(digits)
}

fn parse_signed(source: &str) -> Option<i64> {
    let mut rest = source.trim_matches(' ');
    let mut negative = false;
    if let Some(tail) = rest.strip_prefix('-') {
        negative = true;
        rest = tail.trim_start_matches(' ');
    } else if let Some(tail) = rest.strip_prefix('+') {
        rest = tail.trim_start_matches(' ');
    }

    let (whole, fraction) = match rest.split_once('.') {
        Some((w, f)) => (w, f),
        None => (rest, ""),
    };
    if whole.is_empty() || !fraction.bytes().all(|b| b == b'0') {
        return None;
    }

    // Accumulate in the negative domain so i64::MIN parses without overflow.
    let mut value: i64 = 0;
    for b in whole.bytes() {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value
            .checked_mul(10)?
            .checked_sub(i64::from(b - b'0'))?;
    }
    if negative {
        Some(value)
    } else {
        value.checked_neg()
    }
}

/// Render a float the way the language shows numbers: integral values print
/// without a fractional part.
pub fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e18 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
