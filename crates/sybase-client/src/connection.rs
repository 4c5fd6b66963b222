//! Database connection.
//!
//! A [`Connection`] owns one library context and one session. It logs in,
//! detects the server dialect, executes queries in the requested shape and
//! transparently reopens the session once when the server goes away outside
//! a transaction.

use std::sync::{Arc, Weak};

use ctlib_protocol::charset::encoding_for_name;
use ctlib_protocol::{Context, Flavor, Library, Session, SessionOption, SessionProperty};
use encoding_rs::Encoding;
use sybase_types::{Hash, Value};

use crate::binder::ParameterBinder;
use crate::command::{Command, ResultState};
use crate::config::{DataSource, defaults};
use crate::diagnostics::{self, exception};
use crate::error::{Error, Result};
use crate::lock;
use crate::options::Options;
use crate::result::Shape;
use crate::row::RowContext;
use crate::statement::StatementSlot;
use crate::template::QueryTemplate;

/// Server version query; wrapped in its own transaction for chained mode.
const VERSION_QUERY: &str = "begin tran select @@version commit tran";
const COLLATION_QUERY: &str = "select convert(varchar, serverproperty('collation')) as 'coll'";
const CODE_PAGE_QUERY: &str = "select cast(collationproperty(%v, 'CodePage') as varchar) as 'cp'";

/// A connection to a Sybase ASE or Microsoft SQL Server database.
///
/// Queries run synchronously; the connection must be used from one thread
/// at a time. At most one [`Statement`](crate::Statement) is active on a
/// connection: any direct query, and any other statement's `exec`,
/// invalidates it.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use sybase_client::{Connection, DataSource, Value};
/// # fn library() -> Arc<dyn ctlib_protocol::Library> { unimplemented!() }
///
/// # fn main() -> Result<(), sybase_client::Error> {
/// let ds = DataSource::new().username("sa").password("secret").dbname("pubs2");
/// let mut conn = Connection::open(library(), ds)?;
///
/// let authors = conn.select("select * from authors where state = %v", &[Value::from("CA")])?;
/// conn.exec("update titles set price = price * 1.1", &[])?;
/// conn.commit()?;
/// # Ok(())
/// # }
/// ```
pub struct Connection {
    library: Arc<dyn Library>,
    context: Option<Box<dyn Context>>,
    session: Option<Box<dyn Session>>,
    datasource: DataSource,
    encoding: &'static Encoding,
    options: Options,
    in_transaction: bool,
    sybase_server: bool,
    aborted: bool,
    statement: Option<Weak<StatementSlot>>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("dbname", &self.datasource.dbname)
            .field("encoding", &self.encoding.name())
            .field("in_transaction", &self.in_transaction)
            .field("sybase_server", &self.sybase_server)
            .field("aborted", &self.aborted)
            .finish_non_exhaustive()
    }
}

fn setup_error(session: &mut dyn Session, kind: &'static str, description: &str) -> Error {
    exception(session, description, |message| Error::Setup { kind, message })
}

fn plain_setup_error(kind: &'static str, message: String) -> Error {
    Error::Setup { kind, message }
}

/// Set the login properties and log in.
fn login(session: &mut dyn Session, ds: &DataSource) -> Result<()> {
    session.init_diagnostics().map_err(|rc| {
        plain_setup_error(
            "TDS-CTLIB-INIT-ERROR-HANDLING-ERROR",
            format!(
                "ct_diag(CS_INIT) failed with error {rc}, unable to initialize inline error handling"
            ),
        )
    })?;
    session
        .set_property(SessionProperty::LoginTimeout(defaults::LOGIN_TIMEOUT_SECS))
        .map_err(|rc| {
            plain_setup_error(
                "TDS-CTLIB-SET-LOGIN-TIMEOUT",
                format!("ct_con_props(CS_LOGIN_TIMEOUT) failed with error {rc}"),
            )
        })?;
    session
        .set_property(SessionProperty::Username(&ds.username))
        .map_err(|rc| {
            plain_setup_error(
                "TDS-CTLIB-SET-USERNAME",
                format!("ct_con_props(CS_USERNAME) failed with error {rc}"),
            )
        })?;
    if !ds.password.is_empty() {
        session
            .set_property(SessionProperty::Password(&ds.password))
            .map_err(|rc| {
                plain_setup_error(
                    "TDS-CTLIB-SET-PASSWORD",
                    format!("ct_con_props(CS_PASSWORD) failed with error {rc}"),
                )
            })?;
    }
    if let Some(address) = ds.server_address() {
        session
            .set_property(SessionProperty::ServerAddress(&address))
            .map_err(|rc| {
                plain_setup_error(
                    "TDS-CTLIB-SET-SERVERADDR",
                    format!("ct_con_props(CS_SERVERADDR, '{address}') failed with error {rc}"),
                )
            })?;
    }
    let charset = ds.charset_name();
    if let Err(rc) = session.set_property(SessionProperty::Charset(charset)) {
        return Err(setup_error(
            session,
            "TDS-EXEC-EXCEPTION",
            &format!("cs_locale(CS_SYB_CHARSET, '{charset}') failed with error {rc}"),
        ));
    }
    if let Err(rc) = session.connect(&ds.dbname) {
        return Err(setup_error(
            session,
            "TDS-CTLIB-CONNECT-ERROR",
            &format!("ct_connect() failed with error {rc}"),
        ));
    }
    Ok(())
}

/// Server options applied right after login.
fn configure(session: &mut dyn Session, context: &mut dyn Context) -> Result<()> {
    if let Err(rc) = session.set_option(SessionOption::ChainedTransactions(true)) {
        return Err(setup_error(
            session,
            "TDS-INIT-ERROR",
            &format!("ct_options(CS_OPT_CHAINXACTS) failed with error {rc}"),
        ));
    }
    if let Err(rc) = session.set_option(SessionOption::TextSize(defaults::TEXT_SIZE)) {
        return Err(setup_error(
            session,
            "TDS-INIT-ERROR",
            &format!("ct_options(CS_OPT_TEXTSIZE) failed with error {rc}"),
        ));
    }
    if let Err(rc) = context.set_long_date_format() {
        return Err(setup_error(
            session,
            "TDS-INIT-ERROR",
            &format!("cs_dt_info(CS_DT_CONVFMT) failed with error {rc}"),
        ));
    }
    if let Err(rc) = session.set_property(SessionProperty::CharsetConversion(false)) {
        return Err(setup_error(
            session,
            "TDS-INIT-ERROR",
            &format!("ct_con_props(CS_CHARSETCNV) failed with error {rc}"),
        ));
    }
    Ok(())
}

impl Connection {
    /// Validate `datasource`, allocate a library context and log in.
    #[tracing::instrument(
        skip(library, datasource),
        fields(user = %datasource.username, db = %datasource.dbname)
    )]
    pub fn open(library: Arc<dyn Library>, datasource: DataSource) -> Result<Self> {
        let encoding = datasource.validate()?;

        let context = {
            let _guard = lock::init_guard();
            library.alloc_context()
        }
        .map_err(|rc| {
            plain_setup_error(
                "TDS-CTLIB-CREATE-CONTEXT",
                format!("cs_ctx_alloc() failed with error {rc}"),
            )
        })?;

        let sybase_server = library.flavor() == Flavor::Sybase;
        let mut conn = Self {
            library,
            context: Some(context),
            session: None,
            datasource,
            encoding,
            options: Options::default(),
            in_transaction: false,
            sybase_server,
            aborted: false,
            statement: None,
        };
        conn.init()?;
        tracing::info!(
            encoding = conn.encoding.name(),
            sybase = conn.sybase_server,
            "connected"
        );
        Ok(conn)
    }

    fn init(&mut self) -> Result<()> {
        let context = self.context.as_deref_mut().ok_or(Error::ConnectionAborted)?;
        let mut session = context.alloc_session().map_err(|rc| {
            plain_setup_error(
                "TDS-CTLIB-CREATE-CONNECTION",
                format!("ct_con_alloc() failed with error {rc}"),
            )
        })?;
        login(session.as_mut(), &self.datasource)?;
        // from here on the session is logged in and closed on drop
        let configured = configure(session.as_mut(), context);
        let converts = session.charset_conversion().unwrap_or(false);
        self.session = Some(session);
        configured?;

        self.sybase_server = self.library.flavor() == Flavor::Sybase;
        if !converts {
            self.detect_server()?;
        }
        diagnostics::purge(self.session_mut()?)
    }

    /// Determine the dialect and, for MS-SQL, the server character encoding.
    fn detect_server(&mut self) -> Result<()> {
        let version = self.server_version()?;
        self.sybase_server = version.contains("Adaptive Server");
        if self.sybase_server {
            return Ok(());
        }

        let row = self.query_once(COLLATION_QUERY, &[], Shape::Row)?;
        let Some(collation) = row.get("coll").and_then(Value::as_str).map(str::to_owned) else {
            return Ok(());
        };
        tracing::debug!(collation = %collation, "server collation");
        if collation.to_ascii_lowercase().contains("utf8") {
            self.encoding = encoding_rs::UTF_8;
            return Ok(());
        }

        match self.query_once(CODE_PAGE_QUERY, &[Value::Text(collation)], Shape::Row) {
            Ok(row) => {
                let code_page = row.get("cp").and_then(Value::as_str).unwrap_or_default();
                if code_page.starts_with(|c: char| c.is_ascii_digit()) {
                    if let Some(encoding) = encoding_for_name(&format!("WINDOWS-{code_page}")) {
                        tracing::debug!(code_page, "server character encoding selected");
                        self.encoding = encoding;
                    }
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "ignoring error while determining the server encoding");
                if let Ok(session) = self.session_mut() {
                    session.clear_messages();
                }
            }
        }
        Ok(())
    }

    pub(crate) fn session_mut(&mut self) -> Result<&mut (dyn Session + 'static)> {
        self.session.as_deref_mut().ok_or(Error::ConnectionAborted)
    }

    pub(crate) fn check_open(&self) -> Result<()> {
        if self.aborted || self.session.is_none() {
            return Err(Error::ConnectionAborted);
        }
        Ok(())
    }

    fn binder(&self) -> ParameterBinder {
        ParameterBinder::new(
            self.encoding,
            self.options.tz(),
            self.library.capabilities(),
        )
    }

    pub(crate) fn row_context(&self) -> RowContext {
        RowContext {
            encoding: self.encoding,
            tz: self.options.tz(),
            numeric: self.options.numeric,
            flavor: self.library.flavor(),
        }
    }

    /// Whether the session reports itself connected.
    #[must_use]
    pub fn ping(&self) -> bool {
        self.session
            .as_deref()
            .is_some_and(|s| s.is_connected().unwrap_or(false))
    }

    /// Bind `args`, allocate a command for `template` and send it.
    ///
    /// A send that fails because the session dropped is retried once on a
    /// fresh session, unless a transaction was active.
    pub(crate) fn setup_command(
        &mut self,
        template: &QueryTemplate,
        args: &[Value],
    ) -> Result<Command> {
        let params = self.binder().bind(template, args)?;
        let mut retried = false;
        loop {
            let ctx = self.row_context();
            let session = self.session_mut()?;
            let mut cmd = Command::new(session, template.clone(), ctx)?;
            cmd.prepare(session, &params)?;
            match cmd.send(session) {
                Ok(()) => return Ok(cmd),
                Err(e) if retried || self.ping() => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, "connection lost while sending command");
                    cmd.cancel_disconnect();
                    drop(cmd);
                    self.reconnect()?;
                    retried = true;
                }
            }
        }
    }

    /// Read the next result announcement of a statement's command.
    ///
    /// If the session dropped, it is reopened and the original error is
    /// returned; the statement cannot be replayed.
    pub(crate) fn next_result(&mut self, cmd: &mut Command) -> Result<ResultState> {
        let session = self.session_mut()?;
        match cmd.read_next_result(session) {
            Err(Error::ConnectionLost(msg)) => {
                cmd.cancel_disconnect();
                self.reconnect()?;
                Err(Error::ConnectionLost(msg))
            }
            other => other,
        }
    }

    /// Close the dropped session and log in again.
    ///
    /// Fails with [`Error::TransactionLost`] if a transaction was active, even
    /// when the new session is up. If logging in fails the connection is
    /// marked aborted.
    fn reconnect(&mut self) -> Result<()> {
        let was_in_transaction = std::mem::take(&mut self.in_transaction);
        tracing::warn!(
            in_transaction = was_in_transaction,
            "connection to server lost; reconnecting"
        );
        self.invalidate_statement();
        if let Some(mut session) = self.session.take() {
            let _ = session.close(true);
            session.clear_messages();
        }

        if let Err(e) = self.init() {
            self.aborted = true;
            tracing::error!(error = %e, "reconnect failed; connection aborted");
            if was_in_transaction {
                return Err(Error::TransactionLost);
            }
            return Err(Error::Connect(format!("reconnect failed: {e}")));
        }
        if was_in_transaction {
            return Err(Error::TransactionLost);
        }
        tracing::debug!("reconnected");
        Ok(())
    }

    /// Execute once without retry, statement invalidation or transaction
    /// tracking.
    fn query_once(&mut self, sql: &str, args: &[Value], shape: Shape) -> Result<Value> {
        let template = QueryTemplate::parse(sql, args)?;
        self.execute_template(&template, args, shape)
    }

    fn execute_template(
        &mut self,
        template: &QueryTemplate,
        args: &[Value],
        shape: Shape,
    ) -> Result<Value> {
        let mut cmd = self.setup_command(template, args)?;
        let session = self.session_mut()?;
        let value = cmd.read_output(session, shape)?;
        diagnostics::purge(session)?;
        Ok(value)
    }

    #[tracing::instrument(level = "debug", skip(self, args), fields(args = args.len()))]
    fn run(
        &mut self,
        sql: &str,
        args: &[Value],
        raw: bool,
        shape: Shape,
        marks_transaction: bool,
    ) -> Result<Value> {
        self.check_open()?;
        self.invalidate_statement();
        let template = if raw {
            QueryTemplate::raw(sql)
        } else {
            QueryTemplate::parse(sql, args)?
        };

        let mut retried = false;
        let value = loop {
            match self.execute_template(&template, args, shape) {
                Err(Error::ConnectionLost(msg)) if !retried => {
                    tracing::warn!(error = %msg, "connection lost while reading results");
                    self.reconnect()?;
                    retried = true;
                }
                other => break other?,
            }
        };
        if marks_transaction {
            self.in_transaction = true;
        }
        Ok(value)
    }

    /// Run a query and return its rows column-wise.
    pub fn select(&mut self, sql: &str, args: &[Value]) -> Result<Value> {
        self.run(sql, args, false, Shape::Columns, false)
    }

    /// Run a query and return a list of row hashes.
    pub fn select_rows(&mut self, sql: &str, args: &[Value]) -> Result<Value> {
        match self.run(sql, args, false, Shape::Rows, false)? {
            Value::Hash(row) => Ok(Value::List(vec![Value::Hash(row)])),
            other => Ok(other),
        }
    }

    /// Run a query expected to return at most one row.
    pub fn select_row(&mut self, sql: &str, args: &[Value]) -> Result<Value> {
        match self.run(sql, args, false, Shape::Row, false)? {
            Value::List(_) => Err(Error::SelectRow(
                "SQL passed to select_row() returned more than 1 row".to_owned(),
            )),
            other => Ok(other),
        }
    }

    /// Execute SQL and return row sets column-wise, or the affected row
    /// count for DML. Marks a transaction as active.
    pub fn exec(&mut self, sql: &str, args: &[Value]) -> Result<Value> {
        self.run(sql, args, false, Shape::Columns, true)
    }

    /// As [`exec`](Self::exec), sending `sql` unchanged.
    pub fn exec_raw(&mut self, sql: &str) -> Result<Value> {
        self.run(sql, &[], true, Shape::Columns, true)
    }

    /// Execute SQL returning rows in the given shape. Marks a transaction as
    /// active.
    pub fn execute(&mut self, sql: &str, args: &[Value], shape: Shape) -> Result<Value> {
        self.run(sql, args, false, shape, true)
    }

    /// Commit the current transaction.
    pub fn commit(&mut self) -> Result<()> {
        self.end_transaction("commit")
    }

    /// Roll back the current transaction.
    pub fn rollback(&mut self) -> Result<()> {
        self.end_transaction("rollback")
    }

    fn end_transaction(&mut self, sql: &str) -> Result<()> {
        self.check_open()?;
        let ctx = self.row_context();
        let session = self.session_mut()?;
        if let Err(rc) = session.cancel_all() {
            tracing::warn!(error = %rc, "ct_cancel(CS_CANCEL_ALL) failed before {}", sql);
        }
        let result = Command::new(session, QueryTemplate::raw(sql), ctx).and_then(|mut cmd| {
            cmd.prepare(session, &[])?;
            cmd.send(session)?;
            cmd.expect_success(session)
        });
        self.in_transaction = false;
        tracing::debug!(sql, ok = result.is_ok(), "transaction ended");
        result
    }

    /// Client library version string.
    pub fn client_version(&self) -> Result<String> {
        let context = self.context.as_deref().ok_or(Error::ConnectionAborted)?;
        context
            .version_string()
            .map_err(|rc| Error::Exec(format!("ct_config(CS_VER_STRING) failed with error {rc}")))
    }

    /// Server version string (`@@version`).
    pub fn server_version(&mut self) -> Result<String> {
        let row = self.query_once(VERSION_QUERY, &[], Shape::Row)?;
        let version = row
            .as_hash()
            .and_then(Hash::first)
            .and_then(|(_, v)| v.as_str())
            .unwrap_or_default();
        Ok(version.trim_end_matches('\n').to_owned())
    }

    /// Set a driver option by name.
    pub fn set_option(&mut self, name: &str, value: &Value) -> Result<()> {
        self.options.set(name, value)?;
        tracing::debug!(option = name, "driver option set");
        Ok(())
    }

    /// Read a driver option by name.
    pub fn get_option(&self, name: &str) -> Result<Value> {
        self.options.get(name)
    }

    /// Current driver options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Character encoding of the connection.
    #[must_use]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Whether the server is Sybase ASE rather than Microsoft SQL Server.
    #[must_use]
    pub fn is_sybase_server(&self) -> bool {
        self.sybase_server
    }

    /// Whether a transaction is active.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Whether a failed reconnect left the connection unusable.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// The datasource this connection was opened with.
    #[must_use]
    pub fn datasource(&self) -> &DataSource {
        &self.datasource
    }

    /// Make `slot` the active statement, invalidating any other.
    pub(crate) fn register_statement(&mut self, slot: &Arc<StatementSlot>) {
        if let Some(current) = self.statement.as_ref().and_then(Weak::upgrade) {
            if Arc::ptr_eq(&current, slot) {
                return;
            }
            current.invalidate();
        }
        self.statement = Some(Arc::downgrade(slot));
    }

    /// Invalidate the active statement unless it is `slot`, leaving none
    /// active.
    pub(crate) fn invalidate_other_statement(&mut self, slot: &Arc<StatementSlot>) {
        if let Some(current) = self.statement.take().and_then(|weak| weak.upgrade()) {
            if !Arc::ptr_eq(&current, slot) {
                current.invalidate();
            }
        }
    }

    /// Forget `slot` if it is the active statement.
    pub(crate) fn release_statement(&mut self, slot: &Arc<StatementSlot>) {
        let active = self
            .statement
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|current| Arc::ptr_eq(&current, slot));
        if active {
            self.statement = None;
        }
    }

    /// Invalidate the active statement, if any.
    pub(crate) fn invalidate_statement(&mut self) {
        if let Some(slot) = self.statement.take().and_then(|weak| weak.upgrade()) {
            slot.invalidate();
        }
    }

    fn shutdown(&mut self) -> Result<()> {
        self.invalidate_statement();
        let mut result = Ok(());
        if let Some(mut session) = self.session.take() {
            if let Err(rc) = session.close(false) {
                result = Err(exception(
                    session.as_mut(),
                    &format!("ct_close() failed with error {rc}"),
                    Error::Exec,
                ));
                let _ = session.close(true);
            }
        }
        if let Some(mut context) = self.context.take() {
            let _guard = lock::exit_guard();
            if context.exit(false).is_err() {
                let _ = context.exit(true);
            }
        }
        result
    }

    /// Close the session and release the library context.
    pub fn close(mut self) -> Result<()> {
        let result = self.shutdown();
        tracing::info!("connection closed");
        result
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.session.is_some() || self.context.is_some() {
            if let Err(e) = self.shutdown() {
                tracing::warn!(error = %e, "error while closing connection");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sybase_testing::{MockLibrary, MockResponse};

    use super::*;

    fn datasource() -> DataSource {
        DataSource::new().username("sa").password("secret").dbname("test")
    }

    #[test]
    fn test_open_sets_session_properties() {
        let lib = MockLibrary::builder().build();
        let conn = Connection::open(Arc::new(lib.clone()), datasource()).unwrap();
        let stats = lib.stats();
        assert_eq!(stats.connects, 1);
        assert!(stats.properties.contains(&"login_timeout=60".to_owned()));
        assert!(stats.properties.contains(&"username=sa".to_owned()));
        assert!(stats.properties.contains(&"charset=utf8".to_owned()));
        assert!(stats.options.contains(&SessionOption::ChainedTransactions(true)));
        assert!(stats.options.contains(&SessionOption::TextSize(1 << 20)));
        // the library converts charsets, so no probe was sent
        assert_eq!(stats.sends, 0);
        assert!(conn.is_sybase_server());
    }

    #[test]
    fn test_open_detects_mssql_code_page() {
        let lib = MockLibrary::builder().mssql().build();
        let conn = Connection::open(Arc::new(lib.clone()), datasource()).unwrap();
        assert!(!conn.is_sybase_server());
        assert_eq!(conn.encoding(), encoding_rs::WINDOWS_1252);
        assert_eq!(lib.stats().sends, 3);
    }

    #[test]
    fn test_open_detects_utf8_collation() {
        let lib = MockLibrary::builder()
            .mssql()
            .with_collation("Latin1_General_100_CI_AS_SC_UTF8")
            .build();
        let conn = Connection::open(Arc::new(lib.clone()), datasource()).unwrap();
        assert_eq!(conn.encoding(), encoding_rs::UTF_8);
        assert_eq!(lib.stats().sends, 2);
    }

    #[test]
    fn test_open_detects_sybase_without_conversion() {
        let lib = MockLibrary::builder().with_charset_conversion(false).build();
        let conn = Connection::open(Arc::new(lib.clone()), datasource()).unwrap();
        assert!(conn.is_sybase_server());
        assert_eq!(lib.stats().sent_count(VERSION_QUERY), 1);
    }

    #[test]
    fn test_code_page_probe_errors_are_ignored() {
        let lib = MockLibrary::builder()
            .mssql()
            .with_response(
                "select cast(collationproperty(@par1, 'CodePage') as varchar) as 'cp'",
                MockResponse::error(8116, "Argument data type is invalid."),
            )
            .build();
        let conn = Connection::open(Arc::new(lib), datasource()).unwrap();
        assert_eq!(conn.encoding(), encoding_rs::UTF_8);
    }

    #[test]
    fn test_login_failure() {
        let lib = MockLibrary::builder().with_login("sa", "right").build();
        let err = Connection::open(Arc::new(lib.clone()), datasource()).unwrap_err();
        assert_eq!(err.kind(), "TDS-CTLIB-CONNECT-ERROR");
        assert!(err.to_string().contains("server message 4002"));
        assert!(err.to_string().contains("Login failed"));
        // the context is released even though login failed
        assert_eq!(lib.stats().context_exits, 1);
    }

    #[test]
    fn test_unknown_charset_rejected_before_library_calls() {
        let lib = MockLibrary::builder().build();
        let err = Connection::open(Arc::new(lib.clone()), datasource().charset("klingon"))
            .unwrap_err();
        assert_eq!(err.kind(), "UNKNOWN-CHARACTER-SET");
        assert_eq!(lib.stats().contexts, 0);
    }

    #[test]
    fn test_close_releases_context() {
        let lib = MockLibrary::builder().build();
        let conn = Connection::open(Arc::new(lib.clone()), datasource()).unwrap();
        conn.close().unwrap();
        let stats = lib.stats();
        assert_eq!(stats.closes, 1);
        assert_eq!(stats.context_exits, 1);
    }

    #[test]
    fn test_versions() {
        let lib = MockLibrary::builder().build();
        let mut conn = Connection::open(Arc::new(lib), datasource()).unwrap();
        assert!(conn.client_version().unwrap().starts_with("Sybase Client-Library"));
        let version = conn.server_version().unwrap();
        assert!(version.starts_with("Adaptive Server Enterprise/16.0"));
        assert!(!version.ends_with('\n'));
    }
}
