//! # sybase-testing
//!
//! Test infrastructure for Sybase/MS-SQL ct-lib driver development.
//!
//! This crate provides an in-process implementation of the client library
//! traits from `ctlib-protocol`, so the driver can be tested without a
//! server, the vendor library or FreeTDS installed.
//!
//! ## Features
//!
//! - Mock client library answering language commands from scripted responses
//! - Connection loss, failed logins and failed sends on demand
//! - Call counters and a log of every command with its bound parameters
//! - Canned fixtures for common result shapes
//!
//! ## Mock Library Example
//!
//! ```rust
//! use sybase_testing::mock_library::{MockColumn, MockLibrary, MockResponse, ScalarValue};
//!
//! let lib = MockLibrary::builder()
//!     .with_response(
//!         "select * from users where id = 1",
//!         MockResponse::rows(
//!             vec![MockColumn::int("id"), MockColumn::varchar("name", 50)],
//!             vec![vec![ScalarValue::Int(1), ScalarValue::String("Alice".into())]],
//!         ),
//!     )
//!     .build();
//!
//! // Hand `lib` to the driver as its `Library` implementation.
//! assert_eq!(lib.stats().connects, 0);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod fixtures;
pub mod mock_library;

pub use mock_library::{
    MockCall, MockColumn, MockEvent, MockLibrary, MockLibraryBuilder, MockParam, MockResponse,
    MockStats, ScalarValue,
};
