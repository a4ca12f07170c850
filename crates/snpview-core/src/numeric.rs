//! Engineering-notation numeric input
//!
//! Parses user-entered values such as `1e9`, `1G`, `2.4GHz` or `-3 dB` into
//! plain SI floating-point numbers, plus the `frequency, value` pairs used to
//! enter point-based limit lines.

use thiserror::Error;

use crate::error::ErrorKind;

/// Numeric input errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("invalid number '{input}': {reason}")]
    InvalidNumber { input: String, reason: &'static str },

    #[error("invalid point on line {line} '{input}': {reason}")]
    InvalidPair {
        input: String,
        line: usize,
        reason: String,
    },
}

impl NumericError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidNumber
    }
}

/// Multiplier for a single-letter SI suffix
fn suffix_multiplier(c: char) -> Option<f64> {
    match c {
        'k' | 'K' => Some(1e3),
        'M' => Some(1e6),
        'G' => Some(1e9),
        'T' => Some(1e12),
        _ => None,
    }
}

/// Unit labels that may trail a value and are ignored
fn is_unit_label(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    let stem = lower.strip_suffix('s').unwrap_or(&lower);
    matches!(stem, "hz" | "db")
}

/// Length of the leading run of ASCII digits in `bytes[start..]`
fn digit_run(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count()
}

/// Parse an engineering-notation scalar
///
/// Accepts an optional sign, a decimal mantissa with optional fraction and
/// exponent, an optional SI suffix (`k`/`K`, `M`, `G`, `T`) and an optional
/// `Hz`/`dB` unit label. Whitespace around the value and between the number
/// and its suffix is ignored.
///
/// # Example
/// ```
/// use snpview_core::numeric::parse_numeric_input;
/// assert_eq!(parse_numeric_input("2.4GHz").unwrap(), 2.4e9);
/// assert_eq!(parse_numeric_input("-3 dB").unwrap(), -3.0);
/// ```
pub fn parse_numeric_input(text: &str) -> Result<f64, NumericError> {
    let input = text.trim();
    let fail = |reason| NumericError::InvalidNumber {
        input: input.to_string(),
        reason,
    };

    if input.is_empty() {
        return Err(fail("empty input"));
    }

    let bytes = input.as_bytes();
    let mut pos = 0;
    if matches!(bytes[0], b'+' | b'-') {
        pos += 1;
    }

    let int_digits = digit_run(bytes, pos);
    pos += int_digits;
    let mut frac_digits = 0;
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        frac_digits = digit_run(bytes, pos);
        pos += frac_digits;
        if pos < bytes.len() && bytes[pos] == b'.' {
            return Err(fail("multiple decimal points"));
        }
    }
    if int_digits + frac_digits == 0 {
        return Err(fail("no digits"));
    }

    if pos < bytes.len() && matches!(bytes[pos], b'e' | b'E') {
        let mut p = pos + 1;
        if p < bytes.len() && matches!(bytes[p], b'+' | b'-') {
            p += 1;
        }
        let exp_digits = digit_run(bytes, p);
        if exp_digits == 0 {
            return Err(fail("exponent has no digits"));
        }
        pos = p + exp_digits;
    }

    let mantissa: f64 = input[..pos]
        .parse()
        .map_err(|_| fail("not a decimal number"))?;

    let mut rest = input[pos..].trim_start();
    let mut multiplier = 1.0;
    if let Some(c) = rest.chars().next() {
        if let Some(m) = suffix_multiplier(c) {
            multiplier = m;
            rest = rest[c.len_utf8()..].trim_start();
        }
    }

    if !rest.is_empty() && !is_unit_label(rest) {
        return Err(fail("unrecognized suffix or unit"));
    }

    let value = mantissa * multiplier;
    if !value.is_finite() {
        return Err(fail("value out of range"));
    }
    Ok(value)
}

const PAIR_SEPARATORS: [char; 3] = [',', ';', '\t'];

/// Parse a `frequency, value` pair
///
/// The pair is split on the first `,`, `;` or tab; if none is present, on the
/// first run of spaces. Exactly two parseable values must result.
pub fn parse_point_pair(text: &str) -> Result<(f64, f64), NumericError> {
    parse_pair_on_line(text, 1)
}

fn parse_pair_on_line(text: &str, line: usize) -> Result<(f64, f64), NumericError> {
    let input = text.trim();
    let fail = |reason: String| NumericError::InvalidPair {
        input: input.to_string(),
        line,
        reason,
    };

    let (left, right) = match input.find(&PAIR_SEPARATORS[..]) {
        Some(idx) => (&input[..idx], &input[idx + 1..]),
        None => match input.find(' ') {
            Some(idx) => (&input[..idx], &input[idx + 1..]),
            None => return Err(fail("expected two values".to_string())),
        },
    };

    if right.contains(&PAIR_SEPARATORS[..]) {
        return Err(fail("more than two values".to_string()));
    }

    let x = parse_numeric_input(left).map_err(|e| fail(e.to_string()))?;
    let y = parse_numeric_input(right).map_err(|e| fail(e.to_string()))?;
    Ok((x, y))
}

/// Parse one `frequency, value` pair per non-blank line
///
/// Errors name the 1-based line of the first pair that fails.
pub fn parse_point_list(text: &str) -> Result<Vec<(f64, f64)>, NumericError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_pair_on_line(line, idx + 1))
        .collect()
}
