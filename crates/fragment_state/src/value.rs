//! Typed values at the read/write boundary of the string-only state map.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Target type for [`crate::StateReader::get`].
pub enum CastTo {
    /// Decoded raw string.
    #[default]
    String,
    /// Base-10 integer; unparseable input reads as `0`.
    Integer,
    /// Floating point; unparseable input reads as NaN.
    Float,
    /// Truthy/falsy words, otherwise non-empty means `true`.
    Boolean,
}

impl CastTo {
    /// Resolves a cast name (`"int"`, `"bool"`, ...). Unknown names read as strings.
    pub fn from_name(name: &str) -> Self {
        match name {
            "number" | "integer" | "int" => Self::Integer,
            "float" => Self::Float,
            "boolean" | "bool" => Self::Boolean,
            _ => Self::String,
        }
    }
}

impl From<&str> for CastTo {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Value written to or read from the fragment state.
pub enum StateValue {
    /// Plain string value.
    String(String),
    /// Integer value.
    Integer(i64),
    /// Floating-point value (may be NaN after a failed float cast).
    Float(f64),
    /// Boolean value, stored as `"true"`/`"false"`.
    Boolean(bool),
}

impl StateValue {
    /// Returns the string stored in the fragment for this value.
    pub fn to_wire_string(&self) -> String {
        match self {
            Self::String(value) => value.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => format_float(*value),
            Self::Boolean(value) => value.to_string(),
        }
    }

    /// Returns the string payload of a [`StateValue::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the payload of a [`StateValue::Integer`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the payload of a [`StateValue::Float`], widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Returns the payload of a [`StateValue::Boolean`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }
}

/// Formats `value` like JavaScript's `Number.prototype.toString()`.
///
/// Magnitudes at or above `1e21` or below `1e-6` use exponent notation with an explicit sign
/// (`1e+21`, `1.5e-7`); negative zero prints as `0`.
fn format_float(value: f64) -> String {
    if value.is_infinite() {
        return if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) || value.is_nan() {
        return value.to_string();
    }

    let scientific = format!("{value:e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => scientific,
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire_string())
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for StateValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for StateValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for StateValue {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Parses the leading base-10 integer of `raw` the way `parseInt(raw, 10)` does.
///
/// Leading whitespace and one sign are accepted and trailing garbage is ignored. Out-of-range
/// values saturate.
pub(crate) fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }

    let mut value: i64 = 0;
    for digit in digits[..len].bytes() {
        let digit = i64::from(digit - b'0');
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(digit)
        } else {
            value.saturating_add(digit)
        };
    }
    Some(value)
}

/// Parses the leading decimal literal of `raw` the way `parseFloat(raw)` does.
///
/// Returns NaN when no literal prefix exists.
pub(crate) fn parse_float_prefix(raw: &str) -> f64 {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            end = 1;
            true
        }
        Some(b'+') => {
            end = 1;
            false
        }
        _ => false,
    };

    if trimmed[end..].starts_with("Infinity") {
        return if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let count_digits = |from: usize| {
        bytes[from.min(bytes.len())..]
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count()
    };

    let int_digits = count_digits(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_end = end + 1;
        if matches!(bytes.get(exponent_end), Some(b'+' | b'-')) {
            exponent_end += 1;
        }
        let exponent_digits = count_digits(exponent_end);
        if exponent_digits > 0 {
            end = exponent_end + exponent_digits;
        }
    }

    trimmed[..end].parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_names_resolve_with_string_fallback() {
        assert_eq!(CastTo::from_name("number"), CastTo::Integer);
        assert_eq!(CastTo::from_name("int"), CastTo::Integer);
        assert_eq!(CastTo::from_name("float"), CastTo::Float);
        assert_eq!(CastTo::from("bool"), CastTo::Boolean);
        assert_eq!(CastTo::from_name("date"), CastTo::String);
    }

    #[test]
    fn wire_strings_match_fragment_conventions() {
        assert_eq!(StateValue::from(true).to_wire_string(), "true");
        assert_eq!(StateValue::from(false).to_wire_string(), "false");
        assert_eq!(StateValue::from(42).to_wire_string(), "42");
        assert_eq!(StateValue::from(1.0).to_wire_string(), "1");
        assert_eq!(StateValue::from(2.5).to_wire_string(), "2.5");
        assert_eq!(StateValue::from(f64::INFINITY).to_wire_string(), "Infinity");
        assert_eq!(StateValue::from(f64::NAN).to_wire_string(), "NaN");
    }

    #[test]
    fn float_wire_strings_switch_to_exponents_like_js() {
        assert_eq!(StateValue::from(1e21).to_wire_string(), "1e+21");
        assert_eq!(StateValue::from(-2.5e30).to_wire_string(), "-2.5e+30");
        assert_eq!(StateValue::from(1e20).to_wire_string(), "100000000000000000000");
        assert_eq!(StateValue::from(1e-7).to_wire_string(), "1e-7");
        assert_eq!(StateValue::from(1.5e-9).to_wire_string(), "1.5e-9");
        assert_eq!(StateValue::from(0.000001).to_wire_string(), "0.000001");
        assert_eq!(StateValue::from(-0.0).to_wire_string(), "0");
        assert_eq!(parse_float_prefix("1e+21"), 1e21);
    }

    #[test]
    fn int_prefix_follows_parse_int() {
        assert_eq!(parse_int_prefix("42"), Some(42));
        assert_eq!(parse_int_prefix("  -7px"), Some(-7));
        assert_eq!(parse_int_prefix("+3.9"), Some(3));
        assert_eq!(parse_int_prefix("0x1f"), Some(0));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix("99999999999999999999"), Some(i64::MAX));
    }

    #[test]
    fn float_prefix_follows_parse_float() {
        assert_eq!(parse_float_prefix("2.5"), 2.5);
        assert_eq!(parse_float_prefix(" .5em"), 0.5);
        assert_eq!(parse_float_prefix("-1e3x"), -1000.0);
        assert_eq!(parse_float_prefix("7e"), 7.0);
        assert_eq!(parse_float_prefix("1.e5"), 100000.0);
        assert_eq!(parse_float_prefix("5.E2x"), 500.0);
        assert_eq!(parse_float_prefix("3."), 3.0);
        assert_eq!(parse_float_prefix("Infinity"), f64::INFINITY);
        assert_eq!(parse_float_prefix("-Infinityx"), f64::NEG_INFINITY);
        assert!(parse_float_prefix("abc").is_nan());
        assert!(parse_float_prefix(".").is_nan());
        assert!(parse_float_prefix("").is_nan());
    }
}
