//! Trait for converting from values to Rust types.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset};

use crate::error::TypeError;
use crate::hash::Hash;
use crate::number::Number;
use crate::value::Value;

/// Trait for types that can be extracted from a [`Value`].
pub trait FromValue: Sized {
    /// Convert from a value to this type.
    fn from_value(value: &Value) -> Result<Self, TypeError>;
}

fn mismatch(expected: &'static str, value: &Value) -> TypeError {
    match value {
        Value::Null => TypeError::UnexpectedNull,
        other => TypeError::TypeMismatch {
            expected,
            actual: other.type_name().to_owned(),
        },
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::Bool(v) => Ok(*v),
            Value::Int(v) => Ok(*v != 0),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::Int(v) => Ok(*v),
            Value::Bool(v) => Ok(i64::from(*v)),
            other => Err(mismatch("i64", other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        let v = i64::from_value(value)?;
        i32::try_from(v).map_err(|_| TypeError::OutOfRange { target_type: "i32" })
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            Value::Number(n) => n
                .to_f64()
                .ok_or_else(|| TypeError::InvalidNumber(n.to_string())),
            other => Err(mismatch("f64", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::Text(v) => Ok(v.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(mismatch("string", other)),
        }
    }
}

impl FromValue for Number {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::Number(n) => Ok(n.clone()),
            Value::Int(v) => Number::parse(&v.to_string()),
            Value::Text(s) => Number::parse(s),
            other => Err(mismatch("number", other)),
        }
    }
}

#[cfg(feature = "decimal")]
impl FromValue for rust_decimal::Decimal {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::Int(v) => Ok(rust_decimal::Decimal::from(*v)),
            other => Number::from_value(other)?.to_decimal(),
        }
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::Timestamp(v) => Ok(*v),
            other => Err(mismatch("date", other)),
        }
    }
}

impl FromValue for Bytes {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::Bytes(v) => Ok(v.clone()),
            other => Err(mismatch("binary", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        Bytes::from_value(value).map(|b| b.to_vec())
    }
}

impl FromValue for Hash {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::Hash(v) => Ok(v.clone()),
            other => Err(mismatch("hash", other)),
        }
    }
}

impl FromValue for Vec<Value> {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::List(v) => Ok(v.clone()),
            other => Err(mismatch("list", other)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, TypeError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handling() {
        assert_eq!(Option::<i64>::from_value(&Value::Null).unwrap(), None);
        assert!(matches!(
            i64::from_value(&Value::Null),
            Err(TypeError::UnexpectedNull)
        ));
    }

    #[test]
    fn test_integer_range() {
        assert_eq!(i32::from_value(&Value::Int(7)).unwrap(), 7);
        assert!(i32::from_value(&Value::Int(i64::MAX)).is_err());
    }

    #[test]
    fn test_mismatch() {
        let err = String::from_value(&Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected string, got integer");
    }
}
