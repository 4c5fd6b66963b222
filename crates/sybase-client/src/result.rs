//! Shaping of one execution's results into a single value.

use sybase_types::{Hash, Value};

/// Requested shape of row data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shape {
    /// Hash of column name to list of values.
    #[default]
    Columns,
    /// List of row hashes; a single row is returned as a bare hash.
    Rows,
    /// A single row hash.
    Row,
}

/// Collects the row sets, output parameter sets and row counts of one
/// execution.
///
/// Row counts are kept only for commands that produced no data since the
/// previous count.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    rows: Vec<Value>,
    params: Vec<Value>,
    pending: bool,
}

impl ResultAccumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row set.
    pub fn add(&mut self, value: Value) {
        self.pending = !value.is_null();
        self.rows.push(value);
    }

    /// Add an output parameter set.
    pub fn add_params(&mut self, value: Value) {
        self.pending = !value.is_null();
        self.params.push(value);
    }

    /// Record the end of one command with its affected row count.
    pub fn done(&mut self, row_count: i64) {
        if row_count > 0 && !self.pending {
            self.rows.push(Value::Int(row_count));
        }
        self.pending = false;
    }

    /// Produce the final value.
    #[must_use]
    pub fn finish(self) -> Value {
        if self.params.is_empty() {
            return smart(self.rows);
        }
        if self.rows.is_empty() {
            return smart(self.params);
        }
        let mut out = Hash::with_capacity(2);
        out.insert("query", smart(self.rows));
        out.insert("params", smart(self.params));
        Value::Hash(out)
    }
}

/// Nothing for no items, the item itself for one, `{query0, query1, ...}`
/// otherwise.
fn smart(mut items: Vec<Value>) -> Value {
    match items.len() {
        0 => Value::Null,
        1 => items.pop().unwrap_or(Value::Null),
        _ => Value::Hash(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (format!("query{i}"), v))
                .collect(),
        ),
    }
}
