//! Arbitrary-precision decimal numbers and numeric result modes.

use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;
use crate::value::Value;

/// Digits of `i64::MAX`.
const I64_MAX_DIGITS: &str = "9223372036854775807";
/// Digits of the magnitude of `i64::MIN`.
const I64_MIN_DIGITS: &str = "9223372036854775808";

/// An exact decimal number kept in its textual form.
///
/// DECIMAL, NUMERIC and MONEY values arrive from the server as text; keeping
/// the text avoids any loss of precision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number(String);

impl Number {
    /// Parse decimal text (optional sign, digits, optional fraction and exponent).
    pub fn parse(text: &str) -> Result<Self, TypeError> {
        let trimmed = text.trim();
        if is_decimal_text(trimmed) {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(TypeError::InvalidNumber(text.to_owned()))
        }
    }

    /// The number as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to the nearest `f64`.
    #[must_use]
    pub fn to_f64(&self) -> Option<f64> {
        self.0.parse().ok()
    }

    /// Convert to a `rust_decimal::Decimal`.
    #[cfg(feature = "decimal")]
    pub fn to_decimal(&self) -> Result<rust_decimal::Decimal, TypeError> {
        let parsed = if self.0.contains(['e', 'E']) {
            rust_decimal::Decimal::from_scientific(&self.0)
        } else {
            rust_decimal::Decimal::from_str(&self.0)
        };
        parsed.map_err(|e| TypeError::InvalidDecimal(e.to_string()))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Number {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "decimal")]
impl From<rust_decimal::Decimal> for Number {
    fn from(d: rust_decimal::Decimal) -> Self {
        Self(d.normalize().to_string())
    }
}

fn is_decimal_text(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    let digits_ok = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    if !digits_ok(int_part) || !digits_ok(frac_part) {
        return false;
    }
    match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['+', '-']).unwrap_or(e);
            !e.is_empty() && digits_ok(e)
        }
    }
}

/// How exact numeric columns are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NumericMode {
    /// Integers when the value fits in 64 bits, otherwise [`Number`].
    #[default]
    Optimal,
    /// Always the server's text.
    String,
    /// Always [`Number`].
    Numeric,
}

impl NumericMode {
    /// The option name selecting this mode.
    #[must_use]
    pub const fn option_name(self) -> &'static str {
        match self {
            Self::Optimal => "optimal-numbers",
            Self::String => "string-numbers",
            Self::Numeric => "numeric-numbers",
        }
    }
}

/// Strip trailing fractional zeros and then a trailing decimal point.
///
/// Text without a decimal point is returned unchanged.
#[must_use]
pub fn trim_fraction(text: &str) -> &str {
    if !text.contains('.') {
        return text;
    }
    let trimmed = text.trim_end_matches('0');
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    match trimmed {
        "" | "-" | "+" => "0",
        other => other,
    }
}

fn fits_i64(text: &str) -> bool {
    let (digits, bound) = match text.strip_prefix('-') {
        Some(rest) => (rest, I64_MIN_DIGITS),
        None => (text, I64_MAX_DIGITS),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match digits.len().cmp(&bound.len()) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Equal => digits <= bound,
        std::cmp::Ordering::Greater => false,
    }
}

/// Convert exact numeric text received from the server according to `mode`.
///
/// In [`NumericMode::Optimal`] mode, values whose canonical form is an
/// integer that fits in 64 bits become [`Value::Int`]; everything else
/// becomes [`Value::Number`].
#[must_use]
pub fn numeric_value(text: &str, mode: NumericMode) -> Value {
    if mode == NumericMode::String {
        return Value::Text(text.to_owned());
    }
    let canonical = trim_fraction(text.trim());
    if mode == NumericMode::Optimal && !canonical.contains('.') && fits_i64(canonical) {
        if let Ok(i) = canonical.parse::<i64>() {
            return Value::Int(i);
        }
    }
    Value::Number(Number(canonical.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_fraction() {
        assert_eq!(trim_fraction("100.00"), "100");
        assert_eq!(trim_fraction("100.50"), "100.5");
        assert_eq!(trim_fraction("100"), "100");
        assert_eq!(trim_fraction("1000"), "1000");
        assert_eq!(trim_fraction("0.000"), "0");
        assert_eq!(trim_fraction(".000"), "0");
    }

    #[test]
    fn test_optimal_downcast() {
        assert_eq!(numeric_value("100.00", NumericMode::Optimal), Value::Int(100));
        assert_eq!(
            numeric_value("100.50", NumericMode::Optimal),
            Value::Number(Number::parse("100.5").unwrap())
        );
        assert_eq!(
            numeric_value("-42", NumericMode::Optimal),
            Value::Int(-42)
        );
    }

    #[test]
    fn test_i64_boundaries() {
        assert_eq!(
            numeric_value("9223372036854775807", NumericMode::Optimal),
            Value::Int(i64::MAX)
        );
        assert_eq!(
            numeric_value("-9223372036854775808", NumericMode::Optimal),
            Value::Int(i64::MIN)
        );
        assert!(matches!(
            numeric_value("9223372036854775808", NumericMode::Optimal),
            Value::Number(_)
        ));
        assert!(matches!(
            numeric_value("-9223372036854775809", NumericMode::Optimal),
            Value::Number(_)
        ));
        assert!(matches!(
            numeric_value("12345678901234567890", NumericMode::Optimal),
            Value::Number(_)
        ));
        assert_eq!(
            numeric_value("-1000000000000000000", NumericMode::Optimal),
            Value::Int(-1_000_000_000_000_000_000)
        );
    }

    #[test]
    fn test_other_modes() {
        assert_eq!(
            numeric_value("100.00", NumericMode::String),
            Value::Text("100.00".into())
        );
        assert_eq!(
            numeric_value("100.00", NumericMode::Numeric),
            Value::Number(Number::parse("100").unwrap())
        );
    }

    #[test]
    fn test_parse() {
        assert!(Number::parse("1.5").is_ok());
        assert!(Number::parse("-.5").is_ok());
        assert!(Number::parse("1e10").is_ok());
        assert!(Number::parse("abc").is_err());
        assert!(Number::parse("").is_err());
        assert!(Number::parse("1e").is_err());
        assert!(Number::parse("1;drop table x").is_err());
    }

    #[cfg(feature = "decimal")]
    #[test]
    fn test_decimal_conversion() {
        let n = Number::parse("123.4500").unwrap();
        let d = n.to_decimal().unwrap();
        assert_eq!(Number::from(d).as_str(), "123.45");
    }
}
