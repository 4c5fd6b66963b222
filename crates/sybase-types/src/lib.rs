//! # sybase-types
//!
//! Value model and conversions between client library buffers and Rust
//! values for Sybase ASE and MS-SQL (via FreeTDS).
//!
//! ## Features
//!
//! - `decimal` (default): conversions between [`Number`] and
//!   `rust_decimal::Decimal`
//!
//! ## Type Mappings
//!
//! | Server Type | Value |
//! |-------------|-------|
//! | `BIT` | [`Value::Bool`] |
//! | `TINYINT` .. `BIGINT` | [`Value::Int`] |
//! | `REAL`, `FLOAT`, `MONEY` | [`Value::Float`] |
//! | `DECIMAL`/`NUMERIC` | [`Value::Int`], [`Value::Number`] or [`Value::Text`] per [`NumericMode`] |
//! | `CHAR`/`VARCHAR`/`TEXT`/`UNICHAR` | [`Value::Text`] |
//! | `BINARY`/`VARBINARY`/`IMAGE` | [`Value::Bytes`] |
//! | `DATETIME`, `SMALLDATETIME`, `DATE`, `TIME`, `BIGDATETIME`, `BIGTIME` | [`Value::Timestamp`] |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod datetime;
pub mod decode;
pub mod encode;
pub mod error;
pub mod from_value;
pub mod hash;
pub mod number;
pub mod value;

pub use datetime::ServerZone;
pub use error::TypeError;
pub use from_value::FromValue;
pub use hash::Hash;
pub use number::{Number, NumericMode, numeric_value};
pub use value::Value;

/// Re-exported so callers can build timestamps and offsets without a direct
/// chrono dependency.
pub use chrono;
/// Re-exported for naming tz database regions.
pub use chrono_tz;
