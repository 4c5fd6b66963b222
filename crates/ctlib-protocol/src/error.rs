//! Protocol-level error types.

use thiserror::Error;

/// Errors raised when a buffer exchanged with the client library does not
/// have the layout its wire type requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Buffer is shorter than the fixed size of the wire type.
    #[error("buffer too short for {type_name}: need {needed} bytes, have {available}")]
    ShortBuffer {
        /// Wire type being read.
        type_name: &'static str,
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        available: usize,
    },

    /// Unknown wire type code.
    #[error("unknown wire type code {0}")]
    UnknownType(i32),

    /// Unknown character set name.
    #[error("unknown character set '{0}'")]
    UnknownCharset(String),
}
