//! Encoding of values for parameter binding and inline SQL literals.

use encoding_rs::Encoding;

use crate::datetime::ServerZone;
use crate::error::TypeError;
use crate::number::Number;
use crate::value::Value;

/// Encode text in the connection encoding.
///
/// Fails if the text contains characters the encoding cannot represent.
pub fn encode_text(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>, TypeError> {
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(TypeError::InvalidEncoding(format!(
            "string cannot be represented in {}",
            encoding.name()
        )));
    }
    Ok(bytes.into_owned())
}

/// Encode a timestamp as native-endian `CS_DATETIME` bytes.
pub fn encode_datetime(value: &Value, tz: impl Into<ServerZone>) -> Result<[u8; 8], TypeError> {
    match value {
        Value::Timestamp(ts) => Ok(crate::datetime::to_datetime(ts, tz)?.to_bytes()),
        Value::Duration(_) => Err(TypeError::RelativeDate),
        other => Err(TypeError::TypeMismatch {
            expected: "date",
            actual: other.type_name().to_owned(),
        }),
    }
}

/// Render a value as an unquoted numeric SQL literal.
///
/// NULL renders as `null`. Text must parse as a number.
pub fn numeric_literal(value: &Value) -> Result<String, TypeError> {
    match value {
        Value::Null => Ok("null".to_owned()),
        Value::Bool(b) => Ok(if *b { "1" } else { "0" }.to_owned()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) if f.is_finite() => Ok(format_float(*f)),
        Value::Float(f) => Err(TypeError::InvalidNumber(f.to_string())),
        Value::Number(n) => Ok(n.as_str().to_owned()),
        Value::Text(s) => Number::parse(s).map(|n| n.as_str().to_owned()),
        other => Err(TypeError::UnsupportedConversion {
            from: other.type_name().to_owned(),
            to: "number",
        }),
    }
}

/// Render a value as a single-quoted SQL string literal.
///
/// Embedded single quotes are doubled. NULL renders as `null`.
pub fn string_literal(value: &Value) -> Result<String, TypeError> {
    let text = match value {
        Value::Null => return Ok("null".to_owned()),
        Value::Text(s) => s.clone(),
        Value::Bool(b) => String::from(if *b { "1" } else { "0" }),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Number(n) => n.as_str().to_owned(),
        Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        other => {
            return Err(TypeError::UnsupportedConversion {
                from: other.type_name().to_owned(),
                to: "string",
            });
        }
    };
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    Ok(out)
}

fn format_float(f: f64) -> String {
    // Debug keeps a fraction or exponent, so the server never sees an int literal
    format!("{f:?}")
}
