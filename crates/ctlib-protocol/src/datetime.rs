//! Fixed-layout date/time structures.
//!
//! The client library transfers dates as small native-endian structures
//! rather than strings. Only the layouts live here; conversion to calendar
//! values belongs to the type layer.

use crate::error::ProtocolError;

/// `CS_DATETIME`: days since 1900-01-01 plus 1/300 second ticks since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CsDateTime {
    /// Days since 1900-01-01.
    pub days: i32,
    /// 1/300 second ticks since midnight.
    pub time: i32,
}

impl CsDateTime {
    /// Encoded size in bytes.
    pub const SIZE: usize = 8;

    /// Encode to native-endian bytes.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..4].copy_from_slice(&self.days.to_ne_bytes());
        out[4..].copy_from_slice(&self.time.to_ne_bytes());
        out
    }

    /// Decode from native-endian bytes.
    pub fn from_bytes(src: &[u8]) -> Result<Self, ProtocolError> {
        let days = read_i32(src, 0, "CS_DATETIME")?;
        let time = read_i32(src, 4, "CS_DATETIME")?;
        Ok(Self { days, time })
    }
}

/// `CS_DATETIME4`: days since 1900-01-01 plus minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CsDateTime4 {
    /// Days since 1900-01-01.
    pub days: u16,
    /// Minutes since midnight.
    pub minutes: u16,
}

impl CsDateTime4 {
    /// Encoded size in bytes.
    pub const SIZE: usize = 4;

    /// Encode to native-endian bytes.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..2].copy_from_slice(&self.days.to_ne_bytes());
        out[2..].copy_from_slice(&self.minutes.to_ne_bytes());
        out
    }

    /// Decode from native-endian bytes.
    pub fn from_bytes(src: &[u8]) -> Result<Self, ProtocolError> {
        let days = fixed::<2>(src, 0, "CS_DATETIME4")?;
        let minutes = fixed::<2>(src, 2, "CS_DATETIME4")?;
        Ok(Self {
            days: u16::from_ne_bytes(days),
            minutes: u16::from_ne_bytes(minutes),
        })
    }
}

/// Read a native-endian `i32` at `offset`.
pub fn read_i32(src: &[u8], offset: usize, type_name: &'static str) -> Result<i32, ProtocolError> {
    fixed::<4>(src, offset, type_name).map(i32::from_ne_bytes)
}

/// Read a native-endian `u64` at `offset`.
pub fn read_u64(src: &[u8], offset: usize, type_name: &'static str) -> Result<u64, ProtocolError> {
    fixed::<8>(src, offset, type_name).map(u64::from_ne_bytes)
}

/// Copy `N` bytes starting at `offset`.
pub fn fixed<const N: usize>(
    src: &[u8],
    offset: usize,
    type_name: &'static str,
) -> Result<[u8; N], ProtocolError> {
    src.get(offset..offset + N)
        .and_then(|s| <[u8; N]>::try_from(s).ok())
        .ok_or(ProtocolError::ShortBuffer {
            type_name,
            needed: offset + N,
            available: src.len(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_layout() {
        let dt = CsDateTime {
            days: 25567,
            time: 300,
        };
        let bytes = dt.to_bytes();
        assert_eq!(&bytes[..4], &25567i32.to_ne_bytes());
        assert_eq!(CsDateTime::from_bytes(&bytes).unwrap(), dt);
    }

    #[test]
    fn test_datetime4_layout() {
        let dt = CsDateTime4 {
            days: 1,
            minutes: 61,
        };
        assert_eq!(CsDateTime4::from_bytes(&dt.to_bytes()).unwrap(), dt);
    }

    #[test]
    fn test_short_buffer() {
        let err = CsDateTime::from_bytes(&[0u8; 5]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::ShortBuffer {
                type_name: "CS_DATETIME",
                needed: 8,
                available: 5,
            }
        );
    }
}
