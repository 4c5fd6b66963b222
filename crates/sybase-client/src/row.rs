//! Row materialization.
//!
//! Converts the bound output buffers of one fetched row into values. Every
//! value is an owned copy; the buffers are overwritten by the next fetch.

use ctlib_protocol::{ColumnBuffer, Flavor, WireType, user_type};
use encoding_rs::Encoding;
use sybase_types::decode::{self, decode_text};
use sybase_types::{Hash, NumericMode, ServerZone, Value, numeric_value};

use crate::columns::ColumnDescriptor;
use crate::error::Error;

/// Connection settings that affect value conversion.
#[derive(Debug, Clone, Copy)]
pub struct RowContext {
    /// Connection character encoding.
    pub encoding: &'static Encoding,
    /// Time zone of server dates.
    pub tz: ServerZone,
    /// Exact numeric representation.
    pub numeric: NumericMode,
    /// Loaded client library.
    pub flavor: Flavor,
}

/// Convert one column buffer into a value.
pub fn column_value(
    desc: &ColumnDescriptor,
    buffer: &ColumnBuffer,
    ctx: &RowContext,
) -> Result<Value, Error> {
    if buffer.is_null() {
        return Ok(Value::Null);
    }
    let src = buffer.value();

    let value = match desc.datatype() {
        WireType::LongChar | WireType::VarChar | WireType::Text => {
            // only the Sybase library pads null-terminated data
            let trim = ctx.flavor == Flavor::Sybase && desc.needs_trim(ctx.flavor);
            text_value(desc, src, trim, ctx)?
        }
        WireType::Char => text_value(desc, src, desc.needs_trim(ctx.flavor), ctx)?,
        WireType::Binary | WireType::VarBinary | WireType::LongBinary | WireType::Image => {
            Value::Bytes(decode::decode_binary(src))
        }
        t @ (WireType::TinyInt
        | WireType::SmallInt
        | WireType::UShort
        | WireType::USmallInt
        | WireType::Int
        | WireType::UInt
        | WireType::BigInt
        | WireType::Long
        | WireType::UBigInt) => Value::Int(decode::decode_integer(t, src)?),
        t @ (WireType::Real | WireType::Float | WireType::Money | WireType::Money4) => {
            Value::Float(decode::decode_float(t, src)?)
        }
        WireType::Bit => Value::Bool(decode::decode_bit(src)?),
        WireType::DateTime => {
            let time_only = desc.format().usertype == user_type::TIME_OF_DAY;
            Value::Timestamp(decode::decode_datetime(src, ctx.tz, time_only)?)
        }
        WireType::DateTime4 => Value::Timestamp(decode::decode_datetime4(src, ctx.tz)?),
        WireType::Date => Value::Timestamp(decode::decode_date(src, ctx.tz)?),
        WireType::Time => Value::Timestamp(decode::decode_time(src, ctx.tz)?),
        WireType::BigDateTime => Value::Timestamp(decode::decode_bigdatetime(src, ctx.tz)?),
        WireType::BigTime => Value::Timestamp(decode::decode_bigtime(src, ctx.tz)?),
        other => {
            return Err(Error::Exec(format!("Unknown data type {}", other.code())));
        }
    };
    Ok(value)
}

fn text_value(
    desc: &ColumnDescriptor,
    src: &[u8],
    trim: bool,
    ctx: &RowContext,
) -> Result<Value, Error> {
    let text = decode_text(src, ctx.encoding, trim)?;
    if desc.is_numeric() && ctx.numeric != NumericMode::String {
        return Ok(numeric_value(&text, ctx.numeric));
    }
    Ok(Value::Text(text))
}

/// Key for column `index`: the lowercased server name, else the output
/// placeholder at that position, else the index itself.
#[must_use]
pub fn column_name(desc: &ColumnDescriptor, index: usize, placeholders: &[String]) -> String {
    if !desc.name().is_empty() {
        return desc.name().to_lowercase();
    }
    match placeholders.get(index) {
        Some(name) if !name.is_empty() => name.clone(),
        _ => index.to_string(),
    }
}

/// Unique keys for all columns, in column order.
///
/// Colliding names get `_1`, `_2`, ... suffixes.
#[must_use]
pub fn column_keys(descriptors: &[ColumnDescriptor], placeholders: &[String]) -> Vec<String> {
    let mut seen = Hash::with_capacity(descriptors.len());
    descriptors
        .iter()
        .enumerate()
        .map(|(i, d)| seen.insert_unique(&column_name(d, i, placeholders), Value::Null))
        .collect()
}

/// Materialize the current row as a hash keyed by column name.
pub fn row_to_hash(
    descriptors: &[ColumnDescriptor],
    buffers: &[ColumnBuffer],
    placeholders: &[String],
    ctx: &RowContext,
) -> Result<Hash, Error> {
    let mut row = Hash::with_capacity(descriptors.len());
    for (i, (desc, buffer)) in descriptors.iter().zip(buffers).enumerate() {
        let value = column_value(desc, buffer, ctx)?;
        row.insert_unique(&column_name(desc, i, placeholders), value);
    }
    tracing::trace!(columns = row.len(), "row materialized");
    Ok(row)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ctlib_protocol::{CsDateTime, DataFormat, Format};

    use super::*;

    fn ctx(flavor: Flavor) -> RowContext {
        RowContext {
            encoding: encoding_rs::UTF_8,
            tz: ServerZone::utc(),
            numeric: NumericMode::Optimal,
            flavor,
        }
    }

    fn desc(fmt: DataFormat) -> ColumnDescriptor {
        ColumnDescriptor::new(fmt, false, Flavor::Sybase)
    }

    fn buffer(desc: &ColumnDescriptor, bytes: &[u8]) -> ColumnBuffer {
        let mut buf = ColumnBuffer::with_capacity(desc.buffer_len());
        match desc.format().format {
            Format::PadBlank => buf.set_blank_padded(bytes),
            Format::NullTerm => buf.set_null_terminated(bytes),
            Format::Unused => buf.set(bytes),
        };
        buf
    }

    #[test]
    fn test_null_indicator_wins() {
        let d = desc(DataFormat::new(WireType::Int));
        let mut buf = ColumnBuffer::with_capacity(8);
        buf.set_null();
        assert_eq!(column_value(&d, &buf, &ctx(Flavor::Sybase)).unwrap(), Value::Null);
    }

    #[test]
    fn test_char_trimmed() {
        let d = desc(DataFormat::new(WireType::Char).with_max_length(10));
        let buf = buffer(&d, b"abc");
        assert_eq!(buf.value().len(), 10);
        assert_eq!(
            column_value(&d, &buf, &ctx(Flavor::FreeTds)).unwrap(),
            Value::from("abc")
        );
    }

    #[test]
    fn test_varchar_trim_depends_on_flavor() {
        let d = desc(DataFormat::new(WireType::LongChar).with_max_length(10));
        let buf = buffer(&d, b"ab  ");
        assert_eq!(
            column_value(&d, &buf, &ctx(Flavor::Sybase)).unwrap(),
            Value::from("ab")
        );
        assert_eq!(
            column_value(&d, &buf, &ctx(Flavor::FreeTds)).unwrap(),
            Value::from("ab  ")
        );

        let d = desc(DataFormat::new(WireType::VarChar).with_max_length(10));
        let buf = buffer(&d, b"ab  ");
        assert_eq!(
            column_value(&d, &buf, &ctx(Flavor::Sybase)).unwrap(),
            Value::from("ab  ")
        );
    }

    #[test]
    fn test_numeric_modes() {
        let d = desc(DataFormat::new(WireType::Decimal).with_max_length(17));
        let buf = buffer(&d, b"100.00");
        let mut c = ctx(Flavor::Sybase);
        assert_eq!(column_value(&d, &buf, &c).unwrap(), Value::Int(100));

        c.numeric = NumericMode::String;
        assert_eq!(column_value(&d, &buf, &c).unwrap(), Value::from("100.00"));

        c.numeric = NumericMode::Numeric;
        let v = column_value(&d, &buf, &c).unwrap();
        assert_eq!(v.as_number().unwrap().as_str(), "100");
    }

    #[test]
    fn test_integers_and_floats() {
        let c = ctx(Flavor::Sybase);
        let d = desc(DataFormat::new(WireType::SmallInt));
        assert_eq!(
            column_value(&d, &buffer(&d, &(-5i16).to_ne_bytes()), &c).unwrap(),
            Value::Int(-5)
        );
        let d = desc(DataFormat::new(WireType::Money));
        assert_eq!(
            column_value(&d, &buffer(&d, &12.5f64.to_ne_bytes()), &c).unwrap(),
            Value::Float(12.5)
        );
        let d = desc(DataFormat::new(WireType::Bit));
        assert_eq!(column_value(&d, &buffer(&d, &[1]), &c).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_binary_is_copied() {
        let d = desc(DataFormat::new(WireType::VarBinary).with_max_length(4));
        let mut buf = buffer(&d, &[1, 2, 3]);
        let v = column_value(&d, &buf, &ctx(Flavor::Sybase)).unwrap();
        buf.set(&[9, 9, 9]);
        assert_eq!(v.as_bytes().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_time_of_day_user_type() {
        let dt = CsDateTime { days: 40000, time: 300 * 60 };
        let d = desc(DataFormat::new(WireType::DateTime).with_usertype(user_type::TIME_OF_DAY));
        let v = column_value(&d, &buffer(&d, &dt.to_bytes()), &ctx(Flavor::Sybase)).unwrap();
        let ts = v.as_timestamp().unwrap();
        assert_eq!(ts.format("%H:%M:%S").to_string(), "00:01:00");

        let d = desc(DataFormat::new(WireType::DateTime));
        let v = column_value(&d, &buffer(&d, &dt.to_bytes()), &ctx(Flavor::Sybase)).unwrap();
        assert_eq!(v.as_timestamp().unwrap().format("%Y").to_string(), "2009");
    }

    #[test]
    fn test_unknown_type() {
        let d = desc(DataFormat::new(WireType::Xml));
        let err = column_value(&d, &buffer(&d, b"<a/>"), &ctx(Flavor::Sybase)).unwrap_err();
        assert_eq!(err.kind(), "TDS-EXEC-ERROR");
        assert_eq!(err.to_string(), "Unknown data type 34");
    }

    #[test]
    fn test_column_naming() {
        let named = desc(DataFormat::new(WireType::Int).with_name("ID"));
        let unnamed = desc(DataFormat::new(WireType::Int));
        let placeholders = vec!["total".to_string()];

        assert_eq!(column_name(&named, 0, &placeholders), "id");
        assert_eq!(column_name(&unnamed, 0, &placeholders), "total");
        assert_eq!(column_name(&unnamed, 1, &placeholders), "1");
    }

    #[test]
    fn test_name_collisions() {
        let a = desc(DataFormat::new(WireType::Int).with_name("name"));
        let b = desc(DataFormat::new(WireType::Int).with_name("NAME"));
        let keys = column_keys(&[a.clone(), b.clone(), a.clone()], &[]);
        assert_eq!(keys, ["name", "name_1", "name_2"]);

        let bufs = [
            buffer(&a, &1i32.to_ne_bytes()),
            buffer(&b, &2i32.to_ne_bytes()),
        ];
        let row = row_to_hash(&[a, b], &bufs, &[], &ctx(Flavor::Sybase)).unwrap();
        assert_eq!(row.get("name"), Some(&Value::Int(1)));
        assert_eq!(row.get("name_1"), Some(&Value::Int(2)));
    }
}
