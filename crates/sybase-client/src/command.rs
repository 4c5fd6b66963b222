//! Command result state machine.
//!
//! A [`Command`] owns one language command handle from allocation until its
//! results are exhausted or it is canceled. Result announcements move it
//! through [`ResultState`]; row and parameter results are described once per
//! result set and fetched into a reused [`RowBuffer`].
//!
//! ```text
//! None ──results()──> Row | Param | Status ──fetch to end──> None
//!   │                                                         │
//!   ├──results()──> Done (row count) ──next read──> None ─────┘
//!   ├──results()──> Retry (command succeeded) ──> read again
//!   └──results()──> End (all results read)
//! ```
//!
//! Every method that can fail takes the owning session so the queued
//! diagnostics can be drained into the error.

use ctlib_protocol::charset::is_multi_byte;
use ctlib_protocol::{CommandHandle, FetchStatus, ResultType, Session};
use sybase_types::{Hash, Value};

use crate::binder::BoundParam;
use crate::columns::{ColumnDescriptor, Columns, RowBuffer};
use crate::diagnostics::{self, exception};
use crate::error::{Error, Result};
use crate::result::{ResultAccumulator, Shape};
use crate::row::{self, RowContext};
use crate::template::QueryTemplate;

/// Where a command is in its result stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultState {
    /// No result is current; the next announcement must be read.
    #[default]
    None,
    /// Output parameter values are current.
    Param,
    /// A return status is current.
    Status,
    /// Row data is current.
    Row,
    /// A command in the batch finished; its row count is available.
    Done,
    /// A command without data succeeded; read again.
    Retry,
    /// All results were read.
    End,
    /// The server failed the command.
    Error,
    /// The command was canceled.
    Canceled,
}

impl ResultState {
    /// Whether row data (rows or output parameters) can be fetched.
    #[must_use]
    pub fn has_rows(self) -> bool {
        matches!(self, Self::Row | Self::Param)
    }
}

/// One language command and its result stream.
pub struct Command {
    handle: Box<dyn CommandHandle>,
    template: QueryTemplate,
    state: ResultState,
    row_count: i64,
    columns: Columns,
    buffers: RowBuffer,
    ctx: RowContext,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("sql", &self.template.text())
            .field("state", &self.state)
            .field("row_count", &self.row_count)
            .field("columns", &self.columns.len())
            .finish_non_exhaustive()
    }
}

impl Command {
    /// Allocate a command handle for `template`.
    pub fn new(session: &mut dyn Session, template: QueryTemplate, ctx: RowContext) -> Result<Self> {
        let handle = session.alloc_command().map_err(|rc| {
            exception(
                session,
                &format!("ct_cmd_alloc() failed with error {rc}"),
                Error::Exec,
            )
        })?;
        Ok(Self {
            handle,
            template,
            state: ResultState::None,
            row_count: 0,
            columns: Columns::default(),
            buffers: RowBuffer::default(),
            ctx,
        })
    }

    /// Initiate the language command and add its parameters.
    pub fn prepare(&mut self, session: &mut dyn Session, params: &[BoundParam]) -> Result<()> {
        let text = self.template.text();
        if let Err(rc) = self.handle.language(text) {
            return Err(exception(
                session,
                &format!("ct_command(CS_LANG_CMD, '{text}') failed with error {rc}"),
                Error::Exec,
            ));
        }
        for (i, param) in params.iter().enumerate() {
            if let Err(rc) = self.handle.param(&param.format, param.data.as_deref()) {
                return Err(exception(
                    session,
                    &format!("ct_param() for parameter {} failed with error {rc}", i + 1),
                    Error::Exec,
                ));
            }
        }
        Ok(())
    }

    /// Send the command to the server.
    pub fn send(&mut self, session: &mut dyn Session) -> Result<()> {
        if let Err(rc) = self.handle.send() {
            return Err(exception(
                session,
                &format!("ct_send() failed with error {rc}"),
                Error::Exec,
            ));
        }
        tracing::trace!(sql = %self.template.text(), "command sent");
        Ok(())
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ResultState {
        self.state
    }

    /// Row count of the last finished command in the batch.
    #[must_use]
    pub fn row_count(&self) -> i64 {
        self.row_count
    }

    /// The query this command executes.
    #[must_use]
    pub fn template(&self) -> &QueryTemplate {
        &self.template
    }

    /// Replace the output placeholder names.
    pub fn set_placeholders(&mut self, names: Vec<String>) {
        self.template.set_placeholders(names);
    }

    /// Current column descriptors.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        self.columns.descriptors()
    }

    /// How many times the row buffers were allocated.
    #[must_use]
    pub fn buffer_allocations(&self) -> usize {
        self.buffers.allocations()
    }

    /// Advance to the next result that needs the caller's attention.
    ///
    /// A pending row, parameter or status result is returned again until it
    /// is consumed. A failed `ct_results()` cancels the command; if even the
    /// cancel fails the connection is gone and [`Error::ConnectionLost`] is
    /// returned.
    pub fn read_next_result(&mut self, session: &mut dyn Session) -> Result<ResultState> {
        if self.state == ResultState::Done {
            self.state = ResultState::None;
        }
        loop {
            let state = self.read_result(session)?;
            if state != ResultState::Retry {
                return Ok(state);
            }
        }
    }

    fn read_result(&mut self, session: &mut dyn Session) -> Result<ResultState> {
        if !matches!(
            self.state,
            ResultState::None | ResultState::Done | ResultState::Retry
        ) {
            return Ok(self.state);
        }

        let announcement = match self.handle.results() {
            Ok(Some(rt)) => rt,
            Ok(None) => {
                self.state = ResultState::End;
                return Ok(self.state);
            }
            Err(rc) => {
                let description = format!(
                    "command::read_output(): ct_results() failed with error {rc}, command canceled"
                );
                let lost = self.handle.cancel().is_err();
                self.state = ResultState::Canceled;
                return Err(exception(session, &description, |msg| {
                    if lost {
                        Error::ConnectionLost(msg)
                    } else {
                        Error::Exec(msg)
                    }
                }));
            }
        };
        tracing::debug!(result = ?announcement, "result announcement");

        self.state = match announcement {
            ResultType::CmdDone => {
                self.row_count = self.handle.row_count().map_err(|rc| {
                    exception(
                        session,
                        &format!("ct_res_info(CS_ROW_COUNT) failed with error {rc}"),
                        Error::Exec,
                    )
                })?;
                self.columns.set_dirty();
                ResultState::Done
            }
            ResultType::CmdSucceed => ResultState::Retry,
            ResultType::CmdFail => {
                self.state = ResultState::Error;
                return Err(exception(
                    session,
                    "command::read_output(): SQL command failed",
                    Error::Exec,
                ));
            }
            ResultType::Param => ResultState::Param,
            ResultType::Status => ResultState::Status,
            ResultType::Row => ResultState::Row,
            ResultType::Other(code) => {
                self.state = ResultState::Error;
                return Err(exception(
                    session,
                    &format!(
                        "command::read_output(): ct_results() returned unexpected result type {code}"
                    ),
                    Error::Exec,
                ));
            }
        };
        Ok(self.state)
    }

    /// Describe and bind the current result's columns.
    ///
    /// Skipped while the cached description is clean unless `force` is set.
    pub fn describe_columns(&mut self, session: &mut dyn Session, force: bool) -> Result<()> {
        if !force && !self.columns.needs_describe() {
            return Ok(());
        }
        let count = self.handle.column_count().map_err(|rc| {
            exception(
                session,
                &format!("ct_res_info(CS_NUMDATA) failed with error {rc}"),
                Error::Exec,
            )
        })?;
        if count == 0 {
            return Err(exception(
                session,
                "ct_res_info(CS_NUMDATA) failed: no columns",
                Error::Exec,
            ));
        }

        let multi_byte = is_multi_byte(self.ctx.encoding);
        let mut descriptors = Vec::with_capacity(count);
        for i in 0..count {
            let format = self.handle.describe(i).map_err(|rc| {
                exception(
                    session,
                    &format!("ct_describe() failed with error {rc}"),
                    Error::Exec,
                )
            })?;
            descriptors.push(ColumnDescriptor::new(format, multi_byte, self.ctx.flavor));
        }
        tracing::debug!(columns = count, "column metadata received");

        self.buffers.prepare(&descriptors);
        for (i, desc) in descriptors.iter().enumerate() {
            if let Err(rc) = self.handle.bind(i, desc.format()) {
                return Err(exception(
                    session,
                    &format!("ct_bind() failed with error {rc}"),
                    Error::Exec,
                ));
            }
        }
        self.columns.set(descriptors);
        Ok(())
    }

    /// Fetch one row into the bound buffers. Returns `false` at the end of
    /// the result set.
    pub fn fetch_row(&mut self, session: &mut dyn Session) -> Result<bool> {
        match self.handle.fetch(self.buffers.buffers_mut()) {
            Ok(FetchStatus::Rows(1)) => Ok(true),
            Ok(FetchStatus::Rows(n)) => Err(exception(
                session,
                &format!("ct_fetch() returned {n} rows (expected 1)"),
                Error::Exec,
            )),
            Ok(FetchStatus::EndData) => {
                // parameter columns never describe the row set that follows
                if self.state == ResultState::Param {
                    self.columns.set_dirty();
                }
                self.state = ResultState::None;
                Ok(false)
            }
            Err(rc) => Err(exception(
                session,
                &format!("ct_fetch() returned errno {rc}"),
                Error::Exec,
            )),
        }
    }

    /// Fetch the next row as a hash, or `None` at the end of the result set.
    pub fn fetch_hash(
        &mut self,
        session: &mut dyn Session,
        placeholders: &[String],
    ) -> Result<Option<Hash>> {
        self.describe_columns(session, false)?;
        if !self.fetch_row(session)? {
            return Ok(None);
        }
        self.current_row(placeholders).map(Some)
    }

    fn current_row(&self, placeholders: &[String]) -> Result<Hash> {
        row::row_to_hash(
            self.columns.descriptors(),
            self.buffers.buffers(),
            placeholders,
            &self.ctx,
        )
    }

    /// Read the rest of the current result set with row semantics: nothing
    /// for no rows, the row hash for one, a list of row hashes otherwise.
    pub fn read_rows(&mut self, session: &mut dyn Session, placeholders: &[String]) -> Result<Value> {
        self.describe_columns(session, false)?;
        let mut rows = Vec::new();
        while self.fetch_row(session)? {
            rows.push(Value::Hash(self.current_row(placeholders)?));
        }
        tracing::trace!(rows = rows.len(), "row set read");
        Ok(match rows.len() {
            0 => Value::Null,
            1 => rows.pop().unwrap_or(Value::Null),
            _ => Value::List(rows),
        })
    }

    /// Read up to `limit` rows (`0` for all) of the current result set with
    /// column semantics: one list of values per column.
    ///
    /// Keys are created when the first row is read, so an empty result set
    /// yields an empty hash. A row fetched earlier can be passed as `first`;
    /// it counts toward the limit.
    pub fn read_cols(
        &mut self,
        session: &mut dyn Session,
        placeholders: &[String],
        limit: usize,
        first: Option<Hash>,
    ) -> Result<Hash> {
        self.describe_columns(session, false)?;
        let mut out = Hash::new();
        let mut read = 0usize;

        if let Some(row) = first {
            for (key, value) in row {
                out.insert(key, Value::List(vec![value]));
            }
            read += 1;
        }

        while limit == 0 || read < limit {
            if !self.fetch_row(session)? {
                break;
            }
            if out.is_empty() {
                for key in row::column_keys(self.columns.descriptors(), placeholders) {
                    out.insert(key, Value::List(Vec::new()));
                }
            }
            for (i, (desc, buffer)) in self
                .columns
                .descriptors()
                .iter()
                .zip(self.buffers.buffers())
                .enumerate()
            {
                let value = row::column_value(desc, buffer, &self.ctx)?;
                if let Some(list) = out.get_index_mut(i).and_then(Value::as_list_mut) {
                    list.push(value);
                }
            }
            read += 1;
        }
        tracing::trace!(rows = read, "column set read");
        Ok(out)
    }

    /// Discard a return status result.
    pub fn skip_status(&mut self, session: &mut dyn Session) -> Result<()> {
        self.describe_columns(session, true)?;
        self.read_rows(session, &[])?;
        self.columns.set_dirty();
        Ok(())
    }

    /// Read every remaining result and shape them into one value.
    pub fn read_output(&mut self, session: &mut dyn Session, shape: Shape) -> Result<Value> {
        let list = shape != Shape::Columns;
        let mut acc = ResultAccumulator::new();
        loop {
            match self.read_next_result(session)? {
                ResultState::Param => {
                    self.describe_columns(session, true)?;
                    let placeholders = self.template.placeholders().to_vec();
                    let params = self.read_rows(session, &placeholders)?;
                    acc.add_params(params);
                }
                ResultState::Row => {
                    let rows = if list {
                        self.read_rows(session, &[])?
                    } else {
                        Value::Hash(self.read_cols(session, &[], 0, None)?)
                    };
                    acc.add(rows);
                }
                ResultState::Status => self.skip_status(session)?,
                ResultState::Done => acc.done(self.row_count),
                ResultState::End => return Ok(acc.finish()),
                state => {
                    return Err(Error::Exec(format!(
                        "command::read_output(): unexpected result state {state:?}"
                    )));
                }
            }
        }
    }

    /// Consume a result stream expected to hold only a success announcement.
    ///
    /// Used for `commit` and `rollback`; the benign "no transaction"
    /// warnings are ignored.
    pub fn expect_success(&mut self, session: &mut dyn Session) -> Result<()> {
        let text = self.template.text().to_owned();
        let failure = match self.handle.results() {
            Ok(Some(ResultType::CmdSucceed)) => None,
            Ok(other) => Some(format!("{text}: unexpected result {other:?}")),
            Err(rc) => Some(format!("{text}: ct_results() failed with error {rc}")),
        };
        if let Some(description) = failure {
            if let Some(err) = diagnostics::checked_exception(session, &description, Error::Exec) {
                self.state = ResultState::Error;
                return Err(err);
            }
        }
        while let Ok(Some(_)) = self.handle.results() {}
        self.state = ResultState::End;
        diagnostics::purge(session)
    }

    /// Cancel the command and discard its results.
    pub fn cancel(&mut self) -> Result<()> {
        self.state = ResultState::Canceled;
        self.handle
            .cancel()
            .map_err(|rc| Error::Exec(format!("ct_cancel() failed with error {rc}")))
    }

    /// Cancel after the connection dropped; failures are expected and ignored.
    pub fn cancel_disconnect(&mut self) {
        if matches!(self.state, ResultState::End | ResultState::Canceled) {
            return;
        }
        let _ = self.handle.cancel();
        self.state = ResultState::Canceled;
    }
}

impl Drop for Command {
    fn drop(&mut self) {
        if matches!(self.state, ResultState::End | ResultState::Canceled) {
            return;
        }
        if let Err(rc) = self.handle.cancel() {
            tracing::warn!(error = %rc, "ct_cancel() failed while dropping command");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Offset, Utc};
    use ctlib_protocol::{Capabilities, Flavor, Library};
    use sybase_testing::{MockColumn, MockEvent, MockLibrary, MockResponse, ScalarValue};
    use sybase_types::{NumericMode, ServerZone};

    use super::*;
    use crate::binder::ParameterBinder;

    fn ctx() -> RowContext {
        RowContext {
            encoding: encoding_rs::UTF_8,
            tz: ServerZone::utc(),
            numeric: NumericMode::Optimal,
            flavor: Flavor::Sybase,
        }
    }

    fn session(lib: &MockLibrary) -> Box<dyn Session> {
        let mut context = lib.alloc_context().unwrap();
        let mut session = context.alloc_session().unwrap();
        session.connect("test").unwrap();
        session
    }

    fn run(session: &mut dyn Session, sql: &str, args: &[Value]) -> Command {
        let template = QueryTemplate::parse(sql, args).unwrap();
        let binder = ParameterBinder::new(encoding_rs::UTF_8, Utc.fix(), Capabilities::empty());
        let params = binder.bind(&template, args).unwrap();
        let mut cmd = Command::new(session, template, ctx()).unwrap();
        cmd.prepare(session, &params).unwrap();
        cmd.send(session).unwrap();
        cmd
    }

    #[test]
    fn test_state_sequence() {
        let lib = MockLibrary::builder()
            .with_response(
                "select 1",
                MockResponse::rows(vec![MockColumn::int("a")], vec![vec![ScalarValue::Int(1)]]),
            )
            .build();
        let mut s = session(&lib);
        let mut cmd = run(s.as_mut(), "select 1", &[]);

        assert_eq!(cmd.read_next_result(s.as_mut()).unwrap(), ResultState::Row);
        // unread rows keep the state
        assert_eq!(cmd.read_next_result(s.as_mut()).unwrap(), ResultState::Row);
        assert!(cmd.fetch_hash(s.as_mut(), &[]).unwrap().is_some());
        assert!(cmd.fetch_hash(s.as_mut(), &[]).unwrap().is_none());
        assert_eq!(cmd.state(), ResultState::None);
        assert_eq!(cmd.read_next_result(s.as_mut()).unwrap(), ResultState::Done);
        assert_eq!(cmd.row_count(), 1);
        assert_eq!(cmd.read_next_result(s.as_mut()).unwrap(), ResultState::End);
    }

    #[test]
    fn test_succeed_is_retried() {
        let lib = MockLibrary::builder()
            .with_response("set x", MockResponse::new().then_succeed().then_done(0))
            .build();
        let mut s = session(&lib);
        let mut cmd = run(s.as_mut(), "set x", &[]);
        assert_eq!(cmd.read_next_result(s.as_mut()).unwrap(), ResultState::Done);
    }

    #[test]
    fn test_command_failure() {
        let lib = MockLibrary::builder()
            .with_response("select nope", MockResponse::error(207, "Invalid column name 'nope'."))
            .build();
        let mut s = session(&lib);
        let mut cmd = run(s.as_mut(), "select nope", &[]);
        let err = cmd.read_next_result(s.as_mut()).unwrap_err();
        assert_eq!(err.kind(), "TDS-EXEC-ERROR");
        assert!(err.to_string().contains("SQL command failed"));
        assert!(err.to_string().contains("server message 207"));
        assert_eq!(cmd.state(), ResultState::Error);
    }

    #[test]
    fn test_unexpected_result_type() {
        let lib = MockLibrary::builder()
            .with_response(
                "compute",
                MockResponse::new().then_event(MockEvent::Unexpected(4045)),
            )
            .build();
        let mut s = session(&lib);
        let mut cmd = run(s.as_mut(), "compute", &[]);
        let err = cmd.read_next_result(s.as_mut()).unwrap_err();
        assert!(err.to_string().contains("unexpected result type 4045"));
    }

    #[test]
    fn test_results_failure_cancels() {
        let lib = MockLibrary::builder()
            .with_response("slow", MockResponse::new().then_event(MockEvent::Fail))
            .build();
        let mut s = session(&lib);
        let mut cmd = run(s.as_mut(), "slow", &[]);
        let err = cmd.read_next_result(s.as_mut()).unwrap_err();
        assert!(matches!(err, Error::Exec(_)));
        assert!(err.to_string().contains("command canceled"));
        assert_eq!(cmd.state(), ResultState::Canceled);
        assert_eq!(lib.stats().cancels, 1);
    }

    #[test]
    fn test_results_failure_on_lost_connection() {
        let lib = MockLibrary::builder()
            .with_response("slow", MockResponse::connection_lost())
            .build();
        let mut s = session(&lib);
        let mut cmd = run(s.as_mut(), "slow", &[]);
        let err = cmd.read_next_result(s.as_mut()).unwrap_err();
        assert!(err.is_connection_lost());
        drop(cmd);
        // no second cancel on drop
        assert_eq!(lib.stats().cancels, 1);
    }

    #[test]
    fn test_read_cols_limit_and_prefetched_row() {
        let lib = MockLibrary::builder()
            .with_response(
                "select n",
                MockResponse::rows(
                    vec![MockColumn::int("n")],
                    (1..=4).map(|i| vec![ScalarValue::Int(i)]).collect(),
                ),
            )
            .build();
        let mut s = session(&lib);
        let mut cmd = run(s.as_mut(), "select n", &[]);
        cmd.read_next_result(s.as_mut()).unwrap();
        let first = cmd.fetch_hash(s.as_mut(), &[]).unwrap();
        let cols = cmd.read_cols(s.as_mut(), &[], 2, first).unwrap();
        assert_eq!(
            cols.get("n"),
            Some(&Value::List(vec![Value::Int(1), Value::Int(2)]))
        );
        let rest = cmd.read_cols(s.as_mut(), &[], 0, None).unwrap();
        assert_eq!(
            rest.get("n"),
            Some(&Value::List(vec![Value::Int(3), Value::Int(4)]))
        );
    }

    #[test]
    fn test_read_cols_empty_result() {
        let lib = MockLibrary::builder()
            .with_response(
                "select none",
                MockResponse::rows(vec![MockColumn::int("n")], vec![]),
            )
            .build();
        let mut s = session(&lib);
        let mut cmd = run(s.as_mut(), "select none", &[]);
        cmd.read_next_result(s.as_mut()).unwrap();
        assert!(cmd.read_cols(s.as_mut(), &[], 0, None).unwrap().is_empty());
    }

    #[test]
    fn test_read_output_params_use_placeholders() {
        let lib = MockLibrary::builder()
            .with_response(
                "exec p @total output",
                MockResponse::new()
                    .then_params(vec![MockColumn::int("")], vec![ScalarValue::Int(42)])
                    .then_status(0)
                    .then_done(-1),
            )
            .build();
        let mut s = session(&lib);
        let mut cmd = run(s.as_mut(), "exec p :total output", &[]);
        let out = cmd.read_output(s.as_mut(), Shape::Columns).unwrap();
        assert_eq!(out.get("total"), Some(&Value::Int(42)));
    }

    #[test]
    fn test_rows_after_params_are_described_again() {
        let lib = MockLibrary::builder()
            .with_response(
                "exec p @total output",
                MockResponse::new()
                    .then_params(vec![MockColumn::int("")], vec![ScalarValue::Int(42)])
                    .then_rows(
                        vec![MockColumn::varchar("name", 20)],
                        vec![vec![ScalarValue::from("x")]],
                    ),
            )
            .build();
        let mut s = session(&lib);
        let mut cmd = run(s.as_mut(), "exec p :total output", &[]);
        let out = cmd.read_output(s.as_mut(), Shape::Rows).unwrap();

        assert_eq!(
            out.get("params").and_then(|p| p.get("total")),
            Some(&Value::Int(42))
        );
        assert_eq!(
            out.get("query").and_then(|q| q.get("name")),
            Some(&Value::from("x"))
        );
        assert_eq!(lib.stats().describes, 2);
    }

    #[test]
    fn test_same_shape_result_sets_reuse_buffers() {
        let pair = || vec![MockColumn::int("id"), MockColumn::varchar("name", 20)];
        let lib = MockLibrary::builder()
            .with_response(
                "select batch",
                MockResponse::new()
                    .then_rows(
                        pair(),
                        vec![
                            vec![ScalarValue::Int(1), ScalarValue::from("a")],
                            vec![ScalarValue::Int(2), ScalarValue::from("b")],
                        ],
                    )
                    .then_rows(pair(), vec![vec![ScalarValue::Int(3), ScalarValue::from("c")]])
                    .then_rows(vec![MockColumn::int("n")], vec![vec![ScalarValue::Int(4)]]),
            )
            .build();
        let mut s = session(&lib);
        let mut cmd = run(s.as_mut(), "select batch", &[]);

        assert_eq!(cmd.read_next_result(s.as_mut()).unwrap(), ResultState::Row);
        cmd.read_rows(s.as_mut(), &[]).unwrap();
        assert_eq!(cmd.read_next_result(s.as_mut()).unwrap(), ResultState::Done);
        assert_eq!(cmd.buffer_allocations(), 1);

        // same shape: described again, buffers kept
        assert_eq!(cmd.read_next_result(s.as_mut()).unwrap(), ResultState::Row);
        let row = cmd.read_rows(s.as_mut(), &[]).unwrap();
        assert_eq!(row.get("name"), Some(&Value::from("c")));
        assert_eq!(cmd.read_next_result(s.as_mut()).unwrap(), ResultState::Done);
        assert_eq!(cmd.buffer_allocations(), 1);
        assert_eq!(lib.stats().describes, 4);

        // different shape: one reallocation
        assert_eq!(cmd.read_next_result(s.as_mut()).unwrap(), ResultState::Row);
        let row = cmd.read_rows(s.as_mut(), &[]).unwrap();
        assert_eq!(row.get("n"), Some(&Value::Int(4)));
        assert_eq!(cmd.buffer_allocations(), 2);
    }

    #[test]
    fn test_drop_cancels_pending_results() {
        let lib = MockLibrary::builder()
            .with_response(
                "select 1",
                MockResponse::rows(vec![MockColumn::int("a")], vec![vec![ScalarValue::Int(1)]]),
            )
            .build();
        let mut s = session(&lib);
        let mut cmd = run(s.as_mut(), "select 1", &[]);
        cmd.read_next_result(s.as_mut()).unwrap();
        drop(cmd);
        assert_eq!(lib.stats().cancels, 1);

        let mut cmd = run(s.as_mut(), "select 1", &[]);
        cmd.read_output(s.as_mut(), Shape::Rows).unwrap();
        drop(cmd);
        assert_eq!(lib.stats().cancels, 1);
    }
}
