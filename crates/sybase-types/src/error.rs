//! Type conversion error types.

use ctlib_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur during value conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    /// Value is null when non-null was expected.
    #[error("unexpected null value")]
    UnexpectedNull,

    /// Type mismatch during conversion.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual type name.
        actual: String,
    },

    /// Value is out of range for target type.
    #[error("value out of range for {target_type}")]
    OutOfRange {
        /// Target type name.
        target_type: &'static str,
    },

    /// Text could not be converted to or from the connection character set.
    #[error("invalid string encoding: {0}")]
    InvalidEncoding(String),

    /// Invalid date/time value.
    #[error("invalid date/time: {0}")]
    InvalidDateTime(String),

    /// Date outside the range the server datetime type can hold.
    #[error("{0}")]
    DateOutOfRange(String),

    /// A relative date (duration) was given where an absolute date is required.
    #[error("relative date passed for binding as absolute date")]
    RelativeDate,

    /// Invalid number text.
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    /// Invalid decimal value.
    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    /// Unsupported type conversion.
    #[error("unsupported conversion from {from} to {to}")]
    UnsupportedConversion {
        /// Source type.
        from: String,
        /// Target type.
        to: &'static str,
    },

    /// Buffer too small for value.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes needed.
        needed: usize,
        /// Bytes available.
        available: usize,
    },
}

impl From<ProtocolError> for TypeError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::ShortBuffer {
                needed, available, ..
            } => Self::BufferTooSmall { needed, available },
            ProtocolError::UnknownType(code) => Self::UnsupportedConversion {
                from: format!("datatype {code}"),
                to: "value",
            },
            ProtocolError::UnknownCharset(name) => {
                Self::InvalidEncoding(format!("unknown character set '{name}'"))
            }
        }
    }
}

impl TypeError {
    /// Whether this error concerns date/time conversion.
    #[must_use]
    pub fn is_date_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDateTime(_) | Self::DateOutOfRange(_) | Self::RelativeDate
        )
    }
}
