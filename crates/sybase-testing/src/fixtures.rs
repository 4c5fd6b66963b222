//! Canned responses shared by driver tests.

use ctlib_protocol::user_type;
use ctlib_protocol::{CsDateTime, CsDateTime4};

use crate::mock_library::{MockColumn, MockResponse, ScalarValue};

/// Days from 1900-01-01 to 2024-03-15.
pub const DAYS_2024_03_15: i32 = 45_364;

/// `2024-03-15 12:30:45.500` as a `CS_DATETIME` (UTC wall clock).
pub const DATETIME_2024_03_15: CsDateTime = CsDateTime {
    days: DAYS_2024_03_15,
    time: ((12 * 3600 + 30 * 60 + 45) * 300) + 150,
};

/// A small `users` table with two rows.
#[must_use]
pub fn users() -> MockResponse {
    MockResponse::rows(
        vec![
            MockColumn::int("id"),
            MockColumn::varchar("name", 30),
            MockColumn::varchar("email", 60),
        ],
        vec![
            vec![
                ScalarValue::Int(1),
                ScalarValue::from("Alice"),
                ScalarValue::from("alice@example.com"),
            ],
            vec![ScalarValue::Int(2), ScalarValue::from("Bob"), ScalarValue::Null],
        ],
    )
}

/// A single row carrying one column of each commonly used type.
#[must_use]
pub fn all_types_row() -> MockResponse {
    MockResponse::rows(
        vec![
            MockColumn::tinyint("c_tinyint"),
            MockColumn::smallint("c_smallint"),
            MockColumn::int("c_int"),
            MockColumn::bigint("c_bigint"),
            MockColumn::real("c_real"),
            MockColumn::float("c_float"),
            MockColumn::money("c_money"),
            MockColumn::bit("c_bit"),
            MockColumn::decimal("c_decimal", 10, 2),
            MockColumn::char("c_char", 5).with_usertype(user_type::PADDED_CHAR),
            MockColumn::varchar("c_varchar", 20),
            MockColumn::varbinary("c_varbinary", 4),
            MockColumn::datetime("c_datetime"),
            MockColumn::datetime4("c_smalldatetime"),
            MockColumn::int("c_null"),
        ],
        vec![vec![
            ScalarValue::Int(7),
            ScalarValue::Int(-300),
            ScalarValue::Int(123_456),
            ScalarValue::Int(9_000_000_000),
            ScalarValue::Float(1.5),
            ScalarValue::Float(2.25),
            ScalarValue::Float(19.99),
            ScalarValue::Bool(true),
            ScalarValue::from("12345.67"),
            ScalarValue::from("ab"),
            ScalarValue::from("hello"),
            ScalarValue::Binary(vec![0xDE, 0xAD, 0xBE, 0xEF]),
            ScalarValue::DateTime(DATETIME_2024_03_15),
            ScalarValue::DateTime4(CsDateTime4 {
                days: DAYS_2024_03_15 as u16,
                minutes: 12 * 60 + 30,
            }),
            ScalarValue::Null,
        ]],
    )
}

/// A stored procedure call: one row set, output parameters and a return status.
#[must_use]
pub fn procedure_call() -> MockResponse {
    MockResponse::rows(
        vec![MockColumn::int("id")],
        vec![vec![ScalarValue::Int(10)], vec![ScalarValue::Int(11)]],
    )
    .then_params(
        vec![MockColumn::int("@total"), MockColumn::varchar("@label", 20)],
        vec![ScalarValue::Int(21), ScalarValue::from("done")],
    )
    .then_done(1)
    .then_status(0)
    .then_done(1)
}
