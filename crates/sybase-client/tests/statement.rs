//! Incremental fetching through statements.
//!
//! Covers row-at-a-time iteration, batched fetches, output parameters and
//! invalidation of a statement by its connection.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use sybase_client::{Connection, DataSource, Error, Statement, Value};
use sybase_testing::fixtures;
use sybase_testing::{MockColumn, MockLibrary, MockResponse, ScalarValue};

fn connect(lib: &MockLibrary) -> Connection {
    let ds = DataSource::new().username("sa").password("secret").dbname("test");
    Connection::open(Arc::new(lib.clone()), ds).expect("open failed")
}

fn numbers(count: i64) -> MockResponse {
    MockResponse::rows(
        vec![MockColumn::int("n")],
        (1..=count).map(|i| vec![ScalarValue::Int(i)]).collect(),
    )
}

fn ints(values: &[i64]) -> Value {
    Value::List(values.iter().map(|v| Value::Int(*v)).collect())
}

#[test]
fn test_iterate_rows() {
    let lib = MockLibrary::builder()
        .with_response("select * from users", fixtures::users())
        .build();
    let mut conn = connect(&lib);

    let mut stmt = Statement::prepare("select * from users", Vec::new());
    stmt.exec(&mut conn).unwrap();

    let mut names = Vec::new();
    while stmt.next(&mut conn).unwrap() {
        let row = stmt.fetch_row().unwrap().unwrap();
        names.push(row.get("name").and_then(Value::as_str).unwrap().to_owned());
    }
    assert_eq!(names, ["Alice", "Bob"]);

    // exhausted statements stay exhausted
    assert!(!stmt.next(&mut conn).unwrap());
    assert!(stmt.fetch_row().unwrap().is_none());
    assert_eq!(stmt.affected_rows().unwrap(), 2);

    stmt.close(&mut conn).unwrap();
}

#[test]
fn test_next_is_idempotent_until_fetched() {
    let lib = MockLibrary::builder()
        .with_response("select n", numbers(2))
        .build();
    let mut conn = connect(&lib);

    let mut stmt = Statement::prepare("select n", Vec::new());
    stmt.exec(&mut conn).unwrap();
    assert!(stmt.next(&mut conn).unwrap());
    assert!(stmt.next(&mut conn).unwrap());
    assert_eq!(stmt.fetch_row().unwrap().unwrap().get("n"), Some(&Value::Int(1)));
    assert!(stmt.next(&mut conn).unwrap());
    assert_eq!(stmt.fetch_row().unwrap().unwrap().get("n"), Some(&Value::Int(2)));
}

#[test]
fn test_next_crosses_result_sets() {
    let lib = MockLibrary::builder()
        .with_response(
            "select a; select b",
            MockResponse::rows(vec![MockColumn::int("a")], vec![vec![ScalarValue::Int(1)]])
                .then_status(0)
                .then_rows(
                    vec![MockColumn::varchar("b", 10)],
                    vec![vec![ScalarValue::from("x")]],
                ),
        )
        .build();
    let mut conn = connect(&lib);

    let mut stmt = Statement::prepare_raw("select a; select b");
    stmt.exec(&mut conn).unwrap();
    let rows = stmt.fetch_rows(&mut conn, 0).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("a"), Some(&Value::Int(1)));
    assert_eq!(rows[1].get("b"), Some(&Value::from("x")));
}

#[test]
fn test_fetch_rows_in_batches() {
    let lib = MockLibrary::builder()
        .with_response("select n", numbers(5))
        .build();
    let mut conn = connect(&lib);

    let mut stmt = Statement::prepare("select n", Vec::new());
    stmt.exec(&mut conn).unwrap();

    let first = stmt.fetch_rows(&mut conn, 2).unwrap();
    assert_eq!(first.len(), 2);
    let rest = stmt.fetch_rows(&mut conn, -1).unwrap();
    assert_eq!(
        rest.iter().map(|r| r.get("n").cloned().unwrap()).collect::<Vec<_>>(),
        [Value::Int(3), Value::Int(4), Value::Int(5)]
    );
    assert!(stmt.fetch_rows(&mut conn, 10).unwrap().is_empty());
}

#[test]
fn test_fetch_columns_includes_prefetched_row() {
    let lib = MockLibrary::builder()
        .with_response("select n", numbers(5))
        .build();
    let mut conn = connect(&lib);

    let mut stmt = Statement::prepare("select n", Vec::new());
    stmt.exec(&mut conn).unwrap();
    assert!(stmt.next(&mut conn).unwrap());

    let cols = stmt.fetch_columns(&mut conn, 3).unwrap();
    assert_eq!(cols.get("n"), Some(&ints(&[1, 2, 3])));
    let cols = stmt.fetch_columns(&mut conn, 0).unwrap();
    assert_eq!(cols.get("n"), Some(&ints(&[4, 5])));
    assert!(stmt.fetch_columns(&mut conn, 0).unwrap().is_empty());
}

#[test]
fn test_output_parameters() {
    let response = MockResponse::rows(
        vec![MockColumn::int("id")],
        vec![vec![ScalarValue::Int(10)], vec![ScalarValue::Int(11)]],
    )
    .then_params(
        vec![MockColumn::int(""), MockColumn::varchar("", 20)],
        vec![ScalarValue::Int(21), ScalarValue::from("done")],
    )
    .then_done(1)
    .then_status(0)
    .then_done(1);
    let lib = MockLibrary::builder()
        .with_response("exec p @total output, @label output", response)
        .build();
    let mut conn = connect(&lib);

    let mut stmt = Statement::prepare("exec p :total output, :label output", Vec::new());
    stmt.exec(&mut conn).unwrap();
    let out = stmt.get_output(&mut conn).unwrap();
    assert_eq!(out.get("total"), Some(&ints(&[21])));
    assert_eq!(out.get("label"), Some(&Value::List(vec![Value::from("done")])));

    // a fresh execution, this time read as rows with renamed placeholders
    stmt.bind_placeholders(vec!["sum".to_owned(), "tag".to_owned()])
        .unwrap();
    stmt.exec(&mut conn).unwrap();
    let out = stmt.get_output_rows(&mut conn).unwrap();
    assert_eq!(out.get("sum"), Some(&Value::Int(21)));
    assert_eq!(out.get("tag"), Some(&Value::from("done")));
}

#[test]
fn test_output_parameters_absent() {
    let lib = MockLibrary::builder()
        .with_response("select n", numbers(2))
        .build();
    let mut conn = connect(&lib);

    let mut stmt = Statement::prepare("select n", Vec::new());
    stmt.exec(&mut conn).unwrap();
    assert!(stmt.get_output(&mut conn).unwrap().is_empty());
}

#[test]
fn test_rebind_arguments() {
    let lib = MockLibrary::builder()
        .with_default_response(MockResponse::echo())
        .build();
    let mut conn = connect(&lib);

    let mut stmt = Statement::prepare("select %v", vec![Value::Int(1)]);
    stmt.define().unwrap();
    stmt.exec(&mut conn).unwrap();
    assert!(stmt.next(&mut conn).unwrap());
    assert_eq!(stmt.fetch_row().unwrap().unwrap().get("par1"), Some(&Value::Int(1)));

    stmt.bind(vec![Value::Int(2)]).unwrap();
    stmt.exec(&mut conn).unwrap();
    assert!(stmt.next(&mut conn).unwrap());
    assert_eq!(stmt.fetch_row().unwrap().unwrap().get("par1"), Some(&Value::Int(2)));
}

#[test]
fn test_direct_query_invalidates_statement() {
    let lib = MockLibrary::builder()
        .with_response("select n", numbers(3))
        .build();
    let mut conn = connect(&lib);

    let mut stmt = Statement::prepare("select n", Vec::new());
    stmt.exec(&mut conn).unwrap();
    assert!(stmt.next(&mut conn).unwrap());

    conn.select("select n", &[]).unwrap();
    assert!(!stmt.is_valid());
    let err = stmt.next(&mut conn).unwrap_err();
    assert!(matches!(err, Error::StatementInvalidated));
    assert_eq!(err.kind(), "STATEMENT-CONNECTION-ERROR");
    assert!(stmt.fetch_row().is_err());
    assert!(stmt.exec(&mut conn).is_err());
}

#[test]
fn test_second_statement_invalidates_first() {
    let lib = MockLibrary::builder()
        .with_response("select n", numbers(3))
        .build();
    let mut conn = connect(&lib);

    let mut first = Statement::prepare("select n", Vec::new());
    first.exec(&mut conn).unwrap();
    let mut second = Statement::prepare("select n", Vec::new());
    second.exec(&mut conn).unwrap();

    assert!(!first.is_valid());
    assert!(second.is_valid());
    assert_eq!(second.fetch_rows(&mut conn, 0).unwrap().len(), 3);
}

#[test]
fn test_reconnect_invalidates_statement() {
    let lib = MockLibrary::builder()
        .with_response("select n", numbers(3))
        .build();
    let mut conn = connect(&lib);

    let mut stmt = Statement::prepare("select n", Vec::new());
    stmt.exec(&mut conn).unwrap();
    lib.drop_connections();

    // the lost session is detected while reading the next result
    assert!(stmt.next(&mut conn).unwrap());
    stmt.fetch_row().unwrap();
    let err = stmt.fetch_rows(&mut conn, 0).unwrap_err();
    assert!(err.is_connection_lost(), "{err}");
    assert!(!stmt.is_valid());
    assert_eq!(lib.stats().connects, 2);

    // the connection itself is usable again
    assert!(conn.select("select n", &[]).is_ok());
}

#[test]
fn test_close_releases_statement() {
    let lib = MockLibrary::builder()
        .with_response("select n", numbers(3))
        .build();
    let mut conn = connect(&lib);

    let mut stmt = Statement::prepare("select n", Vec::new());
    stmt.exec(&mut conn).unwrap();
    stmt.close(&mut conn).unwrap();
    assert_eq!(lib.stats().cancels, 1);

    // a closed statement is no longer invalidated by other queries
    conn.select("select n", &[]).unwrap();
    assert!(stmt.is_valid());
}
