//! Decoding of bound column buffers into values.
//!
//! Each function takes the valid bytes of one column buffer as filled by
//! `ct_fetch()`, in the format the column was bound with.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use ctlib_protocol::datetime::{fixed, read_i32, read_u64};
use ctlib_protocol::{CsDateTime, CsDateTime4, WireType};
use encoding_rs::Encoding;

use crate::datetime::ServerZone;
use crate::error::TypeError;

/// Decode character data in the connection encoding.
///
/// With `trim`, trailing blanks are removed first.
pub fn decode_text(src: &[u8], encoding: &'static Encoding, trim: bool) -> Result<String, TypeError> {
    let src = if trim { trim_blanks(src) } else { src };
    let (text, had_errors) = encoding.decode_without_bom_handling(src);
    if had_errors {
        return Err(TypeError::InvalidEncoding(format!(
            "invalid {} byte sequence",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

/// Strip trailing blanks.
#[must_use]
pub fn trim_blanks(src: &[u8]) -> &[u8] {
    let end = src.iter().rposition(|b| *b != b' ').map_or(0, |i| i + 1);
    &src[..end]
}

/// Decode a native-endian integer of the given wire type.
pub fn decode_integer(wire: WireType, src: &[u8]) -> Result<i64, TypeError> {
    let name = wire.name();
    let value = match wire {
        WireType::TinyInt => i64::from(fixed::<1>(src, 0, name)?[0]),
        WireType::SmallInt => i64::from(i16::from_ne_bytes(fixed::<2>(src, 0, name)?)),
        WireType::UShort | WireType::USmallInt => {
            i64::from(u16::from_ne_bytes(fixed::<2>(src, 0, name)?))
        }
        WireType::Int => i64::from(read_i32(src, 0, name)?),
        WireType::UInt => i64::from(u32::from_ne_bytes(fixed::<4>(src, 0, name)?)),
        WireType::BigInt | WireType::Long => i64::from_ne_bytes(fixed::<8>(src, 0, name)?),
        WireType::UBigInt => i64::try_from(read_u64(src, 0, name)?)
            .map_err(|_| TypeError::OutOfRange { target_type: "i64" })?,
        other => {
            return Err(TypeError::UnsupportedConversion {
                from: other.name().to_owned(),
                to: "i64",
            });
        }
    };
    Ok(value)
}

/// Decode a native-endian floating point value of the given wire type.
pub fn decode_float(wire: WireType, src: &[u8]) -> Result<f64, TypeError> {
    let name = wire.name();
    match wire {
        WireType::Real => Ok(f64::from(f32::from_ne_bytes(fixed::<4>(src, 0, name)?))),
        WireType::Float | WireType::Money | WireType::Money4 => {
            Ok(f64::from_ne_bytes(fixed::<8>(src, 0, name)?))
        }
        other => Err(TypeError::UnsupportedConversion {
            from: other.name().to_owned(),
            to: "f64",
        }),
    }
}

/// Decode a BIT value.
pub fn decode_bit(src: &[u8]) -> Result<bool, TypeError> {
    Ok(fixed::<1>(src, 0, "CS_BIT")?[0] != 0)
}

/// Copy binary data.
#[must_use]
pub fn decode_binary(src: &[u8]) -> Bytes {
    Bytes::copy_from_slice(src)
}

/// Decode a `CS_DATETIME`; with `time_only`, the date part is ignored.
pub fn decode_datetime(
    src: &[u8],
    tz: impl Into<ServerZone>,
    time_only: bool,
) -> Result<DateTime<FixedOffset>, TypeError> {
    let dt = CsDateTime::from_bytes(src)?;
    if time_only {
        crate::datetime::time_of_day(dt, tz)
    } else {
        crate::datetime::from_datetime(dt, tz)
    }
}

/// Decode a `CS_DATETIME4`.
pub fn decode_datetime4(src: &[u8], tz: impl Into<ServerZone>) -> Result<DateTime<FixedOffset>, TypeError> {
    crate::datetime::from_datetime4(CsDateTime4::from_bytes(src)?, tz)
}

/// Decode a `CS_BIGDATETIME`.
pub fn decode_bigdatetime(src: &[u8], tz: impl Into<ServerZone>) -> Result<DateTime<FixedOffset>, TypeError> {
    crate::datetime::from_bigdatetime(read_u64(src, 0, "CS_BIGDATETIME")?, tz)
}

/// Decode a `CS_BIGTIME`.
pub fn decode_bigtime(src: &[u8], tz: impl Into<ServerZone>) -> Result<DateTime<FixedOffset>, TypeError> {
    crate::datetime::from_bigtime(read_u64(src, 0, "CS_BIGTIME")?, tz)
}

/// Decode a `CS_DATE`.
pub fn decode_date(src: &[u8], tz: impl Into<ServerZone>) -> Result<DateTime<FixedOffset>, TypeError> {
    crate::datetime::from_date(read_i32(src, 0, "CS_DATE")?, tz)
}

/// Decode a `CS_TIME`.
pub fn decode_time(src: &[u8], tz: impl Into<ServerZone>) -> Result<DateTime<FixedOffset>, TypeError> {
    crate::datetime::from_time(read_i32(src, 0, "CS_TIME")?, tz)
}
