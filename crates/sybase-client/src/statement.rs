//! Statements with incremental result fetching.
//!
//! A [`Statement`] keeps its command open between calls, so rows can be
//! pulled one at a time. The statement registers itself with its connection
//! while executing; the connection invalidates it when another query runs
//! or the session has to be reopened, after which every operation fails with
//! [`Error::StatementInvalidated`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use sybase_types::{Hash, Value};

use crate::command::{Command, ResultState};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::template::QueryTemplate;

/// State shared between a statement and the connection it runs on.
#[derive(Debug)]
pub(crate) struct StatementSlot {
    valid: AtomicBool,
    command: Mutex<Option<Command>>,
}

impl StatementSlot {
    fn new() -> Self {
        Self {
            valid: AtomicBool::new(true),
            command: Mutex::new(None),
        }
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Mark the statement unusable and cancel its command.
    pub(crate) fn invalidate(&self) {
        if !self.valid.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(mut cmd) = self.command.lock().take() {
            cmd.cancel_disconnect();
        }
        tracing::debug!("statement invalidated");
    }
}

/// A query executed step by step.
///
/// ```rust,no_run
/// # fn demo(conn: &mut sybase_client::Connection) -> sybase_client::Result<()> {
/// use sybase_client::{Statement, Value};
///
/// let mut stmt = Statement::prepare("select * from titles where type = %v", vec![Value::from("business")]);
/// stmt.exec(conn)?;
/// while stmt.next(conn)? {
///     let row = stmt.fetch_row()?;
///     println!("{row:?}");
/// }
/// stmt.close(conn)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Statement {
    slot: Arc<StatementSlot>,
    sql: String,
    args: Vec<Value>,
    raw: bool,
    placeholders: Option<Vec<String>>,
    prefetched: Option<Hash>,
}

impl Statement {
    /// Create a statement from a query template and its arguments.
    #[must_use]
    pub fn prepare(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            slot: Arc::new(StatementSlot::new()),
            sql: sql.into(),
            args,
            raw: false,
            placeholders: None,
            prefetched: None,
        }
    }

    /// Create a statement sending `sql` unchanged.
    #[must_use]
    pub fn prepare_raw(sql: impl Into<String>) -> Self {
        Self {
            raw: true,
            ..Self::prepare(sql, Vec::new())
        }
    }

    /// Whether the statement can still be used.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.slot.is_valid()
    }

    fn check_valid(&self) -> Result<()> {
        if self.slot.is_valid() {
            Ok(())
        } else {
            Err(Error::StatementInvalidated)
        }
    }

    fn take_command(&self) -> Result<Command> {
        self.check_valid()?;
        self.slot
            .command
            .lock()
            .take()
            .ok_or_else(|| Error::Exec("the statement has not been executed".to_owned()))
    }

    /// Put the command back unless the statement was invalidated meanwhile.
    fn restore(&self, mut cmd: Command) {
        if self.slot.is_valid() {
            *self.slot.command.lock() = Some(cmd);
        } else {
            cmd.cancel_disconnect();
        }
    }

    /// Replace the arguments for the next [`exec`](Self::exec).
    pub fn bind(&mut self, args: Vec<Value>) -> Result<()> {
        self.check_valid()?;
        self.args = args;
        Ok(())
    }

    /// Replace the names used for output parameter values.
    pub fn bind_placeholders(&mut self, names: Vec<String>) -> Result<()> {
        self.check_valid()?;
        if let Some(cmd) = self.slot.command.lock().as_mut() {
            cmd.set_placeholders(names.clone());
        }
        self.placeholders = Some(names);
        Ok(())
    }

    /// Accepted for interface compatibility; columns are described lazily.
    pub fn define(&self) -> Result<()> {
        self.check_valid()
    }

    /// Send the query and read its first result announcement.
    ///
    /// Any other active statement on `conn` is invalidated; a previous
    /// execution of this statement is canceled.
    pub fn exec(&mut self, conn: &mut Connection) -> Result<()> {
        self.check_valid()?;
        if let Some(mut old) = self.slot.command.lock().take() {
            if let Err(e) = old.cancel() {
                tracing::debug!(error = %e, "canceling previous execution failed");
            }
        }
        self.prefetched = None;

        let mut template = if self.raw {
            QueryTemplate::raw(&self.sql)
        } else {
            QueryTemplate::parse(&self.sql, &self.args)?
        };
        if let Some(names) = &self.placeholders {
            template.set_placeholders(names.clone());
        }

        conn.check_open()?;
        conn.invalidate_other_statement(&self.slot);
        let mut cmd = conn.setup_command(&template, &self.args)?;
        conn.register_statement(&self.slot);

        let result = conn.next_result(&mut cmd);
        self.restore(cmd);
        result.map(|state| tracing::debug!(result = ?state, "statement executed"))
    }

    /// Advance to the next row. Returns whether a row is available to
    /// [`fetch_row`](Self::fetch_row).
    ///
    /// Crosses result set boundaries; return status results are skipped.
    pub fn next(&mut self, conn: &mut Connection) -> Result<bool> {
        let mut cmd = self.take_command()?;
        let result = self.advance(conn, &mut cmd);
        self.restore(cmd);
        result
    }

    fn advance(&mut self, conn: &mut Connection, cmd: &mut Command) -> Result<bool> {
        if self.prefetched.is_some() {
            return Ok(true);
        }
        loop {
            match conn.next_result(cmd)? {
                state @ (ResultState::Row | ResultState::Param) => {
                    let session = conn.session_mut()?;
                    let placeholders = if state == ResultState::Param {
                        cmd.describe_columns(session, true)?;
                        cmd.template().placeholders().to_vec()
                    } else {
                        Vec::new()
                    };
                    if let Some(row) = cmd.fetch_hash(session, &placeholders)? {
                        self.prefetched = Some(row);
                        return Ok(true);
                    }
                }
                ResultState::Status => cmd.skip_status(conn.session_mut()?)?,
                ResultState::End => return Ok(false),
                ResultState::Done | ResultState::None | ResultState::Retry => {}
                state @ (ResultState::Error | ResultState::Canceled) => {
                    return Err(Error::Exec(format!(
                        "cannot read results of a statement in state {state:?}"
                    )));
                }
            }
        }
    }

    /// Hand out the row read by the last [`next`](Self::next).
    pub fn fetch_row(&mut self) -> Result<Option<Hash>> {
        self.check_valid()?;
        Ok(self.prefetched.take())
    }

    /// Collect up to `rows` rows (`rows <= 0` for all).
    pub fn fetch_rows(&mut self, conn: &mut Connection, rows: i64) -> Result<Vec<Hash>> {
        self.check_valid()?;
        let limit = usize::try_from(rows).unwrap_or(0);
        let mut out = Vec::new();
        while limit == 0 || out.len() < limit {
            if let Some(row) = self.prefetched.take() {
                out.push(row);
            } else if !self.next(conn)? {
                break;
            }
        }
        tracing::trace!(rows = out.len(), "rows fetched");
        Ok(out)
    }

    /// Read up to `rows` rows (`rows <= 0` for all) of the current result set
    /// column-wise.
    pub fn fetch_columns(&mut self, conn: &mut Connection, rows: i64) -> Result<Hash> {
        let mut cmd = self.take_command()?;
        let result = self.read_columns(conn, &mut cmd, rows);
        self.restore(cmd);
        result
    }

    fn read_columns(&mut self, conn: &mut Connection, cmd: &mut Command, rows: i64) -> Result<Hash> {
        if !self.advance(conn, cmd)? {
            return Ok(Hash::new());
        }
        let placeholders = if cmd.state() == ResultState::Param {
            cmd.template().placeholders().to_vec()
        } else {
            Vec::new()
        };
        let limit = usize::try_from(rows).unwrap_or(0);
        let first = self.prefetched.take();
        cmd.read_cols(conn.session_mut()?, &placeholders, limit, first)
    }

    /// Skip row results until an output parameter result is current.
    fn seek_params(&mut self, conn: &mut Connection, cmd: &mut Command) -> Result<bool> {
        if cmd.state() == ResultState::Param {
            return Ok(true);
        }
        self.prefetched = None;
        loop {
            match conn.next_result(cmd)? {
                ResultState::Param => {
                    cmd.describe_columns(conn.session_mut()?, true)?;
                    return Ok(true);
                }
                ResultState::Row => {
                    cmd.read_rows(conn.session_mut()?, &[])?;
                }
                ResultState::Status => cmd.skip_status(conn.session_mut()?)?,
                ResultState::End => return Ok(false),
                ResultState::Done | ResultState::None | ResultState::Retry => {}
                state @ (ResultState::Error | ResultState::Canceled) => {
                    return Err(Error::Exec(format!(
                        "cannot read output of a statement in state {state:?}"
                    )));
                }
            }
        }
    }

    /// Output parameter values column-wise, keyed by placeholder name.
    pub fn get_output(&mut self, conn: &mut Connection) -> Result<Hash> {
        let mut cmd = self.take_command()?;
        let result = self.read_output_columns(conn, &mut cmd);
        self.restore(cmd);
        result
    }

    fn read_output_columns(&mut self, conn: &mut Connection, cmd: &mut Command) -> Result<Hash> {
        if !self.seek_params(conn, cmd)? {
            return Ok(Hash::new());
        }
        let placeholders = cmd.template().placeholders().to_vec();
        let first = self.prefetched.take();
        cmd.read_cols(conn.session_mut()?, &placeholders, 0, first)
    }

    /// Output parameter values as row hashes, keyed by placeholder name.
    pub fn get_output_rows(&mut self, conn: &mut Connection) -> Result<Value> {
        let mut cmd = self.take_command()?;
        let result = self.read_output_rows(conn, &mut cmd);
        self.restore(cmd);
        result
    }

    fn read_output_rows(&mut self, conn: &mut Connection, cmd: &mut Command) -> Result<Value> {
        if !self.seek_params(conn, cmd)? {
            return Ok(Value::Null);
        }
        let placeholders = cmd.template().placeholders().to_vec();
        let rest = cmd.read_rows(conn.session_mut()?, &placeholders)?;
        Ok(match (self.prefetched.take(), rest) {
            (None, rest) => rest,
            (Some(first), Value::Null) => Value::Hash(first),
            (Some(first), Value::List(mut rows)) => {
                rows.insert(0, Value::Hash(first));
                Value::List(rows)
            }
            (Some(first), rest) => Value::List(vec![Value::Hash(first), rest]),
        })
    }

    /// Row count of the last finished command.
    pub fn affected_rows(&self) -> Result<i64> {
        self.check_valid()?;
        Ok(self
            .slot
            .command
            .lock()
            .as_ref()
            .map_or(0, Command::row_count))
    }

    /// Cancel any pending results and detach from the connection.
    pub fn close(&mut self, conn: &mut Connection) -> Result<()> {
        self.prefetched = None;
        if let Some(mut cmd) = self.slot.command.lock().take() {
            if let Err(e) = cmd.cancel() {
                tracing::warn!(error = %e, "canceling statement failed");
            }
        }
        conn.release_statement(&self.slot);
        Ok(())
    }
}
