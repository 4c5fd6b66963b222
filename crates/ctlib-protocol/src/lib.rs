//! # ctlib-protocol
//!
//! Call/return contract with the Sybase Open Client (ct-lib) and FreeTDS
//! client libraries.
//!
//! The bit-level tabular data stream is owned by the vendor library. This
//! crate describes only what the driver exchanges with that library: wire
//! type codes, data formats, result announcements, return codes, diagnostic
//! message records, the fixed-layout date structures, and the object-safe
//! traits through which the library is driven.
//!
//! ## Features
//!
//! - `encoding` (default): Sybase charset names and Windows code pages mapped
//!   to `encoding_rs` encodings
//!
//! ## Design Philosophy
//!
//! This crate is IO-agnostic. It contains no networking logic; an
//! implementation of [`Library`] wraps the real client library (or a mock),
//! and higher-level crates drive it through the traits in [`library`].
//!
//! ## Example
//!
//! ```rust
//! use ctlib_protocol::{DataFormat, Format, WireType};
//!
//! let fmt = DataFormat::new(WireType::Char)
//!     .with_format(Format::PadBlank)
//!     .with_max_length(50);
//! assert!(fmt.datatype.is_character());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

#[cfg(feature = "encoding")]
pub mod charset;
pub mod datetime;
pub mod error;
pub mod library;
pub mod message;
pub mod results;
pub mod types;

pub use datetime::{CsDateTime, CsDateTime4};
pub use error::ProtocolError;
pub use library::{
    Capabilities, ColumnBuffer, CommandHandle, Context, CtResult, Flavor, Library, Session,
    SessionOption, SessionProperty,
};
pub use message::{ClientMessage, ServerMessage};
pub use results::{FetchStatus, ResultType, ReturnCode};
pub use types::{DataFormat, Format, ParamStatus, WireType, user_type};
