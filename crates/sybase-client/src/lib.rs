//! # sybase-client
//!
//! Blocking Sybase ASE and Microsoft SQL Server client over the ct-lib call
//! interface (Sybase Open Client or FreeTDS).
//!
//! This is the primary public API surface of the workspace. It turns query
//! templates and positional arguments into typed parameters, drives the
//! client library's result stream, and materializes rows into generic
//! [`Value`]s in the shape the caller asks for.
//!
//! ## Features
//!
//! - **Query templates**: `%v` bind slots, `%d`/`%s` inlined literals and
//!   `:name` output placeholders
//! - **Result shapes**: column-wise, list of rows or a single row
//! - **Buffer reuse**: columns are described and bound once per result set
//! - **Reconnect**: a dropped session is reopened and the query retried once
//!   outside a transaction
//! - **Statements**: incremental row fetching with invalidation on reconnect
//! - **Server dialects**: Sybase ASE and MS-SQL, with automatic character
//!   encoding detection for MS-SQL
//!
//! ## Result Shapes
//!
//! ```text
//! select       {col: [v1, v2, ...], ...}
//! select_rows  [{col: v1, ...}, {col: v2, ...}]
//! select_row   {col: v1, ...}
//! exec (DML)   affected row count
//! ```
//!
//! Several result sets in one batch come back as `{query0, query1, ...}`;
//! output parameters as `{query: ..., params: ...}` when rows were returned
//! as well.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sybase_client::{Connection, DataSource, Value};
//! # fn library() -> Arc<dyn ctlib_protocol::Library> { unimplemented!() }
//!
//! fn main() -> Result<(), sybase_client::Error> {
//!     let ds = DataSource::from_connection_string("user=sa;pass=secret;db=pubs2;host=db1;port=5000")?;
//!     let mut conn = Connection::open(library(), ds)?;
//!
//!     let row = conn.select_row("select count(*) as n from titles where type = %v", &[Value::from("business")])?;
//!     println!("{:?}", row.get("n"));
//!
//!     conn.exec("insert into log (msg) values (%v)", &[Value::from("hello")])?;
//!     conn.commit()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod binder;
pub mod columns;
pub mod command;
pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod lock;
pub mod options;
pub mod result;
pub mod row;
pub mod statement;
pub mod template;

// Re-export commonly used types
pub use binder::{BoundParam, ParameterBinder};
pub use columns::{ColumnDescriptor, Columns, RowBuffer};
pub use command::{Command, ResultState};
pub use config::DataSource;
pub use connection::Connection;
pub use error::{Error, Result};
pub use options::Options;
pub use result::{ResultAccumulator, Shape};
pub use row::RowContext;
pub use statement::Statement;
pub use sybase_types::{Hash, Number, NumericMode, ServerZone, Value};
pub use template::{QueryTemplate, SlotKind};
