//! Query shapes and statements against the scripted mock library.
//!
//! This example needs no server: it runs the driver against
//! `sybase-testing`'s mock client library and prints what each query
//! surface returns.
//!
//! # Running
//!
//! ```bash
//! RUST_LOG=sybase_client=debug cargo run --example mock_session
//! ```

// Allow common patterns in example code
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use sybase_client::{Connection, DataSource, Error, Statement, Value};
use sybase_testing::{MockLibrary, MockResponse, fixtures};

fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let library = MockLibrary::builder()
        .with_response("select * from users", fixtures::users())
        .with_response("update users set name = upper(name)", MockResponse::affected(2))
        .with_default_response(MockResponse::echo())
        .build();

    let ds = DataSource::from_connection_string("user=sa;pass=secret;db=demo")?;
    let mut conn = Connection::open(Arc::new(library), ds)?;
    println!("Client: {}", conn.client_version()?);
    println!("Server: {}", conn.server_version()?);

    // Column-wise, row-wise and single row
    println!("\nselect:      {:?}", conn.select("select * from users", &[])?);
    println!("select_rows: {:?}", conn.select_rows("select * from users", &[])?);
    println!(
        "select_row:  {:?}",
        conn.select_row("select %v as a, %v as b", &[Value::Int(1), Value::from("two")])?
    );

    // DML returns the affected row count
    let count = conn.exec("update users set name = upper(name)", &[])?;
    println!("\nupdated {count:?} rows");
    conn.commit()?;

    // Row-at-a-time
    let mut stmt = Statement::prepare("select * from users", Vec::new());
    stmt.exec(&mut conn)?;
    while stmt.next(&mut conn)? {
        if let Some(row) = stmt.fetch_row()? {
            println!("row: {:?}", row.get("name"));
        }
    }
    stmt.close(&mut conn)?;

    conn.close()
}
