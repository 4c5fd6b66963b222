//! Mock client library for unit testing.
//!
//! This module provides an in-process implementation of the ct-lib boundary
//! traits that answers language commands from scripted responses, so the
//! driver can be exercised without a server or the vendor library.
//!
//! ## Features
//!
//! - Scripted result streams per SQL text (rows, output parameters, return
//!   status, row counts, failures)
//! - Server and client diagnostic messages attached to responses
//! - Connection loss on send or while reading results
//! - Built-in answers for `@@version`, collation and code page queries
//! - Call counters and a log of every sent command with its parameters
//!
//! ## Example
//!
//! ```rust
//! use sybase_testing::mock_library::{MockColumn, MockLibrary, MockResponse, ScalarValue};
//!
//! let lib = MockLibrary::builder()
//!     .with_response(
//!         "select id, name from users",
//!         MockResponse::rows(
//!             vec![MockColumn::int("id"), MockColumn::varchar("name", 30)],
//!             vec![vec![ScalarValue::Int(1), ScalarValue::from("Alice")]],
//!         ),
//!     )
//!     .build();
//! assert_eq!(lib.stats().sends, 0);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};

use ctlib_protocol::charset::{encoding_for_code_page, encoding_for_name};
use ctlib_protocol::{
    Capabilities, ClientMessage, ColumnBuffer, CommandHandle, Context, CsDateTime, CsDateTime4,
    CtResult, DataFormat, FetchStatus, Flavor, Format, Library, ResultType, ReturnCode,
    ServerMessage, Session, SessionOption, SessionProperty, WireType,
};
use encoding_rs::Encoding;
use parking_lot::Mutex;
use tracing::trace;

/// Scalar value for mock result rows.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value, encoded in the wire character set when fetched.
    String(String),
    /// Binary data.
    Binary(Vec<u8>),
    /// Bytes copied verbatim into the bound buffer.
    Raw(Vec<u8>),
    /// `CS_DATETIME` value.
    DateTime(CsDateTime),
    /// `CS_DATETIME4` value.
    DateTime4(CsDateTime4),
    /// `CS_DATE` day counter.
    Date(i32),
    /// `CS_TIME` tick counter.
    Time(i32),
    /// `CS_BIGDATETIME` microsecond counter.
    BigDateTime(u64),
    /// `CS_BIGTIME` microsecond counter.
    BigTime(u64),
}

impl ScalarValue {
    fn text(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Bool(b) => Some(String::from(if *b { "1" } else { "0" })),
            _ => None,
        }
    }

    fn int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    fn float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for ScalarValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(v)
    }
}

/// Mock column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct MockColumn {
    /// Column name; empty for unnamed expressions.
    pub name: String,
    /// Wire type reported by describe.
    pub wire_type: WireType,
    /// Maximum length reported by describe.
    pub max_length: usize,
    /// Server user type.
    pub usertype: i32,
    /// Precision of exact numeric columns.
    pub precision: u8,
    /// Scale of exact numeric columns.
    pub scale: u8,
}

impl MockColumn {
    /// Create a new column definition.
    pub fn new(name: impl Into<String>, wire_type: WireType) -> Self {
        Self {
            name: name.into(),
            wire_type,
            max_length: wire_type.fixed_size().unwrap_or(255),
            usertype: 0,
            precision: 0,
            scale: 0,
        }
    }

    /// Create an INT column.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, WireType::Int)
    }

    /// Create a BIGINT column.
    pub fn bigint(name: impl Into<String>) -> Self {
        Self::new(name, WireType::BigInt)
    }

    /// Create a SMALLINT column.
    pub fn smallint(name: impl Into<String>) -> Self {
        Self::new(name, WireType::SmallInt)
    }

    /// Create a TINYINT column.
    pub fn tinyint(name: impl Into<String>) -> Self {
        Self::new(name, WireType::TinyInt)
    }

    /// Create a FLOAT column.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, WireType::Float)
    }

    /// Create a REAL column.
    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, WireType::Real)
    }

    /// Create a MONEY column.
    pub fn money(name: impl Into<String>) -> Self {
        Self::new(name, WireType::Money)
    }

    /// Create a BIT column.
    pub fn bit(name: impl Into<String>) -> Self {
        Self::new(name, WireType::Bit)
    }

    /// Create a CHAR column.
    pub fn char(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, WireType::Char).with_max_length(len)
    }

    /// Create a VARCHAR column.
    pub fn varchar(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, WireType::VarChar).with_max_length(len)
    }

    /// Create a TEXT column.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, WireType::Text).with_max_length(1024)
    }

    /// Create a UNICHAR column.
    pub fn unichar(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, WireType::UniChar).with_max_length(len * 2)
    }

    /// Create a BINARY column.
    pub fn binary(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, WireType::Binary).with_max_length(len)
    }

    /// Create a VARBINARY column.
    pub fn varbinary(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, WireType::VarBinary).with_max_length(len)
    }

    /// Create an IMAGE column.
    pub fn image(name: impl Into<String>) -> Self {
        Self::new(name, WireType::Image).with_max_length(4096)
    }

    /// Create a DECIMAL column.
    pub fn decimal(name: impl Into<String>, precision: u8, scale: u8) -> Self {
        let mut col = Self::new(name, WireType::Decimal).with_max_length(35);
        col.precision = precision;
        col.scale = scale;
        col
    }

    /// Create a NUMERIC column.
    pub fn numeric(name: impl Into<String>, precision: u8, scale: u8) -> Self {
        let mut col = Self::decimal(name, precision, scale);
        col.wire_type = WireType::Numeric;
        col
    }

    /// Create a DATETIME column.
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, WireType::DateTime)
    }

    /// Create a SMALLDATETIME column.
    pub fn datetime4(name: impl Into<String>) -> Self {
        Self::new(name, WireType::DateTime4)
    }

    /// Set the maximum length.
    #[must_use]
    pub fn with_max_length(mut self, len: usize) -> Self {
        self.max_length = len;
        self
    }

    /// Set the user type.
    #[must_use]
    pub fn with_usertype(mut self, usertype: i32) -> Self {
        self.usertype = usertype;
        self
    }

    fn describe(&self) -> DataFormat {
        DataFormat::new(self.wire_type)
            .with_name(self.name.clone())
            .with_max_length(self.max_length)
            .with_usertype(self.usertype)
            .with_precision_scale(self.precision, self.scale)
    }
}

/// One result announcement in a scripted response.
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    /// A row result set.
    Rows {
        /// Column definitions.
        columns: Vec<MockColumn>,
        /// Row data.
        rows: Vec<Vec<ScalarValue>>,
    },
    /// An output parameter result.
    Params {
        /// Parameter columns.
        columns: Vec<MockColumn>,
        /// Parameter values.
        values: Vec<ScalarValue>,
    },
    /// A stored procedure return status.
    Status(i32),
    /// Command done with the given row count.
    Done(i64),
    /// Command without data succeeded.
    Succeed,
    /// The server failed the command.
    CmdFail,
    /// A result type the driver does not handle.
    Unexpected(i32),
    /// `ct_results()` itself fails.
    Fail,
    /// One row whose columns are the bound parameters.
    Echo,
}

/// Scripted answer to one language command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockResponse {
    events: Vec<MockEvent>,
    server_messages: Vec<ServerMessage>,
    client_messages: Vec<ClientMessage>,
    send_failure: bool,
    lose_connection: bool,
}

impl MockResponse {
    /// Create a response with no result announcements.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single row result set followed by its row count.
    pub fn rows(columns: Vec<MockColumn>, rows: Vec<Vec<ScalarValue>>) -> Self {
        Self::new().then_rows(columns, rows)
    }

    /// A command affecting `count` rows.
    pub fn affected(count: i64) -> Self {
        Self::new().then_succeed().then_done(count)
    }

    /// A command without data and without a row count.
    pub fn empty() -> Self {
        Self::new().then_succeed().then_done(-1)
    }

    /// A command the server rejects with an error message.
    pub fn error(number: i32, message: impl Into<String>) -> Self {
        Self::new()
            .with_message(
                ServerMessage::new(number, 16, message)
                    .with_state(1)
                    .with_line(1),
            )
            .then_event(MockEvent::CmdFail)
    }

    /// One row echoing the bound parameters back.
    pub fn echo() -> Self {
        Self::new().then_event(MockEvent::Echo).then_done(1)
    }

    /// The connection drops while the results are read.
    pub fn connection_lost() -> Self {
        let mut r = Self::new().then_event(MockEvent::Fail);
        r.lose_connection = true;
        r
    }

    /// The connection drops while the command is sent.
    pub fn dropped_on_send() -> Self {
        let mut r = Self::new();
        r.send_failure = true;
        r.lose_connection = true;
        r
    }

    /// Sending fails while the connection stays up.
    pub fn send_failed() -> Self {
        let mut r = Self::new().with_client_message(ClientMessage::new(
            155,
            11,
            "ct_send(): user api layer: external error: this routine cannot be called at this time",
        ));
        r.send_failure = true;
        r
    }

    /// Append a row result set and its row count.
    #[must_use]
    pub fn then_rows(self, columns: Vec<MockColumn>, rows: Vec<Vec<ScalarValue>>) -> Self {
        let count = rows.len() as i64;
        self.then_event(MockEvent::Rows { columns, rows })
            .then_done(count)
    }

    /// Append an output parameter result.
    #[must_use]
    pub fn then_params(self, columns: Vec<MockColumn>, values: Vec<ScalarValue>) -> Self {
        self.then_event(MockEvent::Params { columns, values })
    }

    /// Append a return status.
    #[must_use]
    pub fn then_status(self, status: i32) -> Self {
        self.then_event(MockEvent::Status(status))
    }

    /// Append a command-done announcement.
    #[must_use]
    pub fn then_done(self, count: i64) -> Self {
        self.then_event(MockEvent::Done(count))
    }

    /// Append a command-succeeded announcement.
    #[must_use]
    pub fn then_succeed(self) -> Self {
        self.then_event(MockEvent::Succeed)
    }

    /// Append an arbitrary event.
    #[must_use]
    pub fn then_event(mut self, event: MockEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Queue a server message when the command is sent.
    #[must_use]
    pub fn with_message(mut self, message: ServerMessage) -> Self {
        self.server_messages.push(message);
        self
    }

    /// Queue a client message when the command is sent.
    #[must_use]
    pub fn with_client_message(mut self, message: ClientMessage) -> Self {
        self.client_messages.push(message);
        self
    }
}

/// A parameter as passed to `ct_param()`.
#[derive(Debug, Clone, PartialEq)]
pub struct MockParam {
    /// Parameter format.
    pub format: DataFormat,
    /// Parameter data; `None` for NULL.
    pub data: Option<Vec<u8>>,
}

/// A language command as sent to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    /// Command text.
    pub sql: String,
    /// Bound parameters in order.
    pub params: Vec<MockParam>,
}

/// Call counters and logs.
#[derive(Debug, Clone, Default)]
pub struct MockStats {
    /// Contexts allocated.
    pub contexts: usize,
    /// Contexts shut down.
    pub context_exits: usize,
    /// Sessions allocated.
    pub sessions: usize,
    /// Connect attempts.
    pub connects: usize,
    /// Close calls.
    pub closes: usize,
    /// Commands sent.
    pub sends: usize,
    /// Column describe calls.
    pub describes: usize,
    /// Column bind calls.
    pub binds: usize,
    /// Fetch calls.
    pub fetches: usize,
    /// Command cancels.
    pub cancels: usize,
    /// Session-wide cancels.
    pub cancel_alls: usize,
    /// Every command sent, in order.
    pub calls: Vec<MockCall>,
    /// Session properties set, rendered as `name=value`.
    pub properties: Vec<String>,
    /// Server options set.
    pub options: Vec<SessionOption>,
}

impl MockStats {
    /// The most recently sent command.
    #[must_use]
    pub fn last_call(&self) -> Option<&MockCall> {
        self.calls.last()
    }

    /// How many times the given text was sent.
    #[must_use]
    pub fn sent_count(&self, sql: &str) -> usize {
        self.calls.iter().filter(|c| c.sql == sql).count()
    }
}

struct ServerState {
    flavor: Flavor,
    capabilities: Capabilities,
    client_version: String,
    server_version: String,
    collation: String,
    code_page: String,
    charset_conversion: bool,
    login: Option<(String, String)>,
    responses: HashMap<String, VecDeque<MockResponse>>,
    default_response: MockResponse,
    fail_connects: usize,
    sessions: Vec<Weak<Mutex<SessionState>>>,
    stats: MockStats,
}

impl ServerState {
    fn response_for(&mut self, sql: &str) -> MockResponse {
        if let Some(queue) = self.responses.get_mut(sql) {
            if queue.len() > 1 {
                if let Some(r) = queue.pop_front() {
                    return r;
                }
            }
            if let Some(r) = queue.front() {
                return r.clone();
            }
        }
        if let Some(r) = self.catalog_response(sql) {
            return r;
        }
        self.default_response.clone()
    }

    /// Answers to the system queries a driver issues while logging in.
    fn catalog_response(&self, sql: &str) -> Option<MockResponse> {
        if sql.contains("@@version") {
            return Some(MockResponse::rows(
                vec![MockColumn::varchar("", 256)],
                vec![vec![ScalarValue::String(format!("{}\n", self.server_version))]],
            ));
        }
        if sql.contains("serverproperty('collation')") {
            return Some(MockResponse::rows(
                vec![MockColumn::varchar("coll", 128)],
                vec![vec![ScalarValue::String(self.collation.clone())]],
            ));
        }
        if sql.contains("collationproperty(") {
            return Some(MockResponse::rows(
                vec![MockColumn::varchar("cp", 30)],
                vec![vec![ScalarValue::String(self.code_page.clone())]],
            ));
        }
        None
    }

    /// Encoding of character data on the wire for a session.
    fn wire_encoding(&self, session_charset: &str) -> &'static Encoding {
        if self.charset_conversion {
            return encoding_for_name(session_charset).unwrap_or(encoding_rs::UTF_8);
        }
        if self.collation.to_ascii_lowercase().contains("utf8") {
            return encoding_rs::UTF_8;
        }
        self.code_page
            .parse()
            .ok()
            .and_then(encoding_for_code_page)
            .unwrap_or(encoding_rs::UTF_8)
    }
}

/// Builder for [`MockLibrary`].
pub struct MockLibraryBuilder {
    state: ServerState,
}

impl MockLibraryBuilder {
    /// Create a builder emulating Sybase ct-lib against Adaptive Server.
    pub fn new() -> Self {
        Self {
            state: ServerState {
                flavor: Flavor::Sybase,
                capabilities: Capabilities::BIGINT_PARAMS,
                client_version: "Sybase Client-Library/16.0 SP03 PL02/P-EBF27401".to_owned(),
                server_version: "Adaptive Server Enterprise/16.0 SP03 PL02/EBF 27412/P/x86_64/Enterprise Linux"
                    .to_owned(),
                collation: "utf8".to_owned(),
                code_page: "65001".to_owned(),
                charset_conversion: true,
                login: None,
                responses: HashMap::new(),
                default_response: MockResponse::empty(),
                fail_connects: 0,
                sessions: Vec::new(),
                stats: MockStats::default(),
            },
        }
    }

    /// Emulate FreeTDS against Microsoft SQL Server with a Windows-1252 collation.
    #[must_use]
    pub fn mssql(mut self) -> Self {
        self.state.flavor = Flavor::FreeTds;
        self.state.capabilities = Capabilities::BIGINT_PARAMS | Capabilities::NULL_TYPE_HINT;
        self.state.client_version = "freetds v1.3.17".to_owned();
        self.state.server_version =
            "Microsoft SQL Server 2019 (RTM-CU18) (KB5017593) - 15.0.4261.1 (X64)".to_owned();
        self.state.collation = "SQL_Latin1_General_CP1_CI_AS".to_owned();
        self.state.code_page = "1252".to_owned();
        self.state.charset_conversion = false;
        self
    }

    /// Set the library flavor.
    #[must_use]
    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.state.flavor = flavor;
        self
    }

    /// Set the library capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.state.capabilities = caps;
        self
    }

    /// Set the `@@version` string.
    #[must_use]
    pub fn with_server_version(mut self, version: impl Into<String>) -> Self {
        self.state.server_version = version.into();
        self
    }

    /// Set the server collation name.
    #[must_use]
    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.state.collation = collation.into();
        self
    }

    /// Set the code page reported for the collation.
    #[must_use]
    pub fn with_code_page(mut self, code_page: impl Into<String>) -> Self {
        self.state.code_page = code_page.into();
        self
    }

    /// Whether the library converts character sets itself.
    #[must_use]
    pub fn with_charset_conversion(mut self, enabled: bool) -> Self {
        self.state.charset_conversion = enabled;
        self
    }

    /// Require these credentials at login.
    #[must_use]
    pub fn with_login(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.state.login = Some((username.into(), password.into()));
        self
    }

    /// Add a response for the given command text.
    ///
    /// Responses for the same text are used in order; the last one repeats.
    #[must_use]
    pub fn with_response(mut self, sql: impl Into<String>, response: MockResponse) -> Self {
        self.state
            .responses
            .entry(sql.into())
            .or_default()
            .push_back(response);
        self
    }

    /// Set the response for unmatched commands.
    #[must_use]
    pub fn with_default_response(mut self, response: MockResponse) -> Self {
        self.state.default_response = response;
        self
    }

    /// Build the library.
    pub fn build(self) -> MockLibrary {
        MockLibrary {
            server: Arc::new(Mutex::new(self.state)),
        }
    }
}

impl Default for MockLibraryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock client library.
///
/// Clones share the same scripted server state.
#[derive(Clone)]
pub struct MockLibrary {
    server: Arc<Mutex<ServerState>>,
}

impl MockLibrary {
    /// Create a new builder.
    pub fn builder() -> MockLibraryBuilder {
        MockLibraryBuilder::new()
    }

    /// Add a response after construction.
    pub fn push_response(&self, sql: impl Into<String>, response: MockResponse) {
        self.server
            .lock()
            .responses
            .entry(sql.into())
            .or_default()
            .push_back(response);
    }

    /// Make the next `n` connect attempts fail.
    pub fn fail_next_connects(&self, n: usize) {
        self.server.lock().fail_connects = n;
    }

    /// Drop every open connection, as if the server went away.
    pub fn drop_connections(&self) {
        let mut server = self.server.lock();
        server.sessions.retain(|s| s.strong_count() > 0);
        for session in server.sessions.iter().filter_map(Weak::upgrade) {
            session.lock().connected = false;
        }
    }

    /// Snapshot of the call counters.
    #[must_use]
    pub fn stats(&self) -> MockStats {
        self.server.lock().stats.clone()
    }

    /// Reset the call counters.
    pub fn reset_stats(&self) {
        self.server.lock().stats = MockStats::default();
    }
}

impl Library for MockLibrary {
    fn alloc_context(&self) -> CtResult<Box<dyn Context>> {
        self.server.lock().stats.contexts += 1;
        Ok(Box::new(MockContext {
            server: Arc::clone(&self.server),
        }))
    }

    fn flavor(&self) -> Flavor {
        self.server.lock().flavor
    }

    fn capabilities(&self) -> Capabilities {
        self.server.lock().capabilities
    }
}

struct MockContext {
    server: Arc<Mutex<ServerState>>,
}

impl Context for MockContext {
    fn version_string(&self) -> CtResult<String> {
        Ok(self.server.lock().client_version.clone())
    }

    fn set_long_date_format(&mut self) -> CtResult<()> {
        Ok(())
    }

    fn alloc_session(&mut self) -> CtResult<Box<dyn Session>> {
        let state = Arc::new(Mutex::new(SessionState::default()));
        let mut server = self.server.lock();
        server.stats.sessions += 1;
        server.sessions.push(Arc::downgrade(&state));
        Ok(Box::new(MockSession {
            server: Arc::clone(&self.server),
            state,
        }))
    }

    fn exit(&mut self, _force: bool) -> CtResult<()> {
        self.server.lock().stats.context_exits += 1;
        Ok(())
    }
}

#[derive(Default)]
struct SessionState {
    connected: bool,
    username: String,
    password: String,
    charset: String,
    cancel_fails: bool,
    client_messages: Vec<ClientMessage>,
    server_messages: Vec<ServerMessage>,
}

impl SessionState {
    fn lost(&mut self, routine: &str) {
        self.client_messages.push(ClientMessage::new(
            6,
            5,
            format!(
                "{routine}: network packet layer: internal net library error: Net-Lib protocol driver call to write data to endpoint failed"
            ),
        ));
    }
}

struct MockSession {
    server: Arc<Mutex<ServerState>>,
    state: Arc<Mutex<SessionState>>,
}

impl Session for MockSession {
    fn init_diagnostics(&mut self) -> CtResult<()> {
        Ok(())
    }

    fn set_property(&mut self, property: SessionProperty<'_>) -> CtResult<()> {
        let rendered = match property {
            SessionProperty::Username(u) => {
                self.state.lock().username = u.to_owned();
                format!("username={u}")
            }
            SessionProperty::Password(p) => {
                self.state.lock().password = p.to_owned();
                "password=***".to_owned()
            }
            SessionProperty::ServerAddress(a) => format!("server_address={a}"),
            SessionProperty::LoginTimeout(t) => format!("login_timeout={t}"),
            SessionProperty::Charset(c) => {
                if encoding_for_name(c).is_none() {
                    self.state.lock().client_messages.push(ClientMessage::new(
                        1,
                        1,
                        format!("cs_locale(): internal common library error: unknown charset '{c}'"),
                    ));
                    return Err(ReturnCode::Fail);
                }
                self.state.lock().charset = c.to_owned();
                format!("charset={c}")
            }
            SessionProperty::CharsetConversion(b) => format!("charset_conversion={b}"),
        };
        self.server.lock().stats.properties.push(rendered);
        Ok(())
    }

    fn charset_conversion(&self) -> CtResult<bool> {
        Ok(self.server.lock().charset_conversion)
    }

    fn set_option(&mut self, option: SessionOption) -> CtResult<()> {
        self.server.lock().stats.options.push(option);
        Ok(())
    }

    fn connect(&mut self, dbname: &str) -> CtResult<()> {
        let mut server = self.server.lock();
        server.stats.connects += 1;
        let mut state = self.state.lock();
        if server.fail_connects > 0 {
            server.fail_connects -= 1;
            state.client_messages.push(ClientMessage::new(
                4,
                6,
                "ct_connect(): network packet layer: internal net library error: Net-Lib protocol driver call to connect two endpoints failed",
            ).with_os_error(111, "Connection refused"));
            return Err(ReturnCode::Fail);
        }
        if let Some((user, pass)) = &server.login {
            if *user != state.username || *pass != state.password {
                state.server_messages.push(
                    ServerMessage::new(4002, 14, "Login failed.\n")
                        .with_state(1)
                        .with_server("MOCK"),
                );
                return Err(ReturnCode::Fail);
            }
        }
        trace!(dbname, "mock connect");
        state.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> CtResult<bool> {
        Ok(self.state.lock().connected)
    }

    fn alloc_command(&mut self) -> CtResult<Box<dyn CommandHandle>> {
        Ok(Box::new(MockCommand {
            server: Arc::clone(&self.server),
            session: Arc::clone(&self.state),
            sql: None,
            params: Vec::new(),
            pending: VecDeque::new(),
            current: None,
            bound: Vec::new(),
            row_count: -1,
            lose_connection: false,
            encoding: encoding_rs::UTF_8,
        }))
    }

    fn cancel_all(&mut self) -> CtResult<()> {
        self.server.lock().stats.cancel_alls += 1;
        if self.state.lock().connected {
            Ok(())
        } else {
            Err(ReturnCode::Fail)
        }
    }

    fn client_messages(&self) -> Vec<ClientMessage> {
        self.state.lock().client_messages.clone()
    }

    fn server_messages(&self) -> Vec<ServerMessage> {
        self.state.lock().server_messages.clone()
    }

    fn clear_messages(&mut self) {
        let mut state = self.state.lock();
        state.client_messages.clear();
        state.server_messages.clear();
    }

    fn close(&mut self, force: bool) -> CtResult<()> {
        self.server.lock().stats.closes += 1;
        let mut state = self.state.lock();
        if !state.connected && !force {
            return Err(ReturnCode::Fail);
        }
        state.connected = false;
        Ok(())
    }
}

struct CurrentResult {
    columns: Vec<MockColumn>,
    rows: VecDeque<Vec<ScalarValue>>,
}

struct MockCommand {
    server: Arc<Mutex<ServerState>>,
    session: Arc<Mutex<SessionState>>,
    sql: Option<String>,
    params: Vec<MockParam>,
    pending: VecDeque<MockEvent>,
    current: Option<CurrentResult>,
    bound: Vec<Option<DataFormat>>,
    row_count: i64,
    lose_connection: bool,
    encoding: &'static Encoding,
}

impl MockCommand {
    fn echo_result(&self) -> CurrentResult {
        let mut columns = Vec::with_capacity(self.params.len());
        let mut row = Vec::with_capacity(self.params.len());
        for p in &self.params {
            let len = p.data.as_ref().map_or(0, Vec::len);
            columns.push(
                MockColumn::new(p.format.name.trim_start_matches('@'), p.format.datatype)
                    .with_max_length(p.format.max_length.max(len).max(1)),
            );
            row.push(p.data.clone().map_or(ScalarValue::Null, ScalarValue::Raw));
        }
        CurrentResult {
            columns,
            rows: VecDeque::from([row]),
        }
    }

    fn current(&self) -> CtResult<&CurrentResult> {
        self.current.as_ref().ok_or(ReturnCode::Fail)
    }
}

impl CommandHandle for MockCommand {
    fn language(&mut self, text: &str) -> CtResult<()> {
        self.sql = Some(text.to_owned());
        self.params.clear();
        Ok(())
    }

    fn param(&mut self, format: &DataFormat, data: Option<&[u8]>) -> CtResult<()> {
        if self.sql.is_none() {
            return Err(ReturnCode::Fail);
        }
        self.params.push(MockParam {
            format: format.clone(),
            data: data.map(<[u8]>::to_vec),
        });
        Ok(())
    }

    fn send(&mut self) -> CtResult<()> {
        let sql = self.sql.clone().ok_or(ReturnCode::Fail)?;
        let mut server = self.server.lock();
        server.stats.sends += 1;
        server.stats.calls.push(MockCall {
            sql: sql.clone(),
            params: self.params.clone(),
        });
        let response = server.response_for(&sql);
        let mut session = self.session.lock();
        self.encoding = server.wire_encoding(&session.charset);
        drop(server);

        trace!(sql = %sql, events = response.events.len(), "mock send");

        if !session.connected {
            session.lost("ct_send()");
            return Err(ReturnCode::Fail);
        }
        session.server_messages.extend(response.server_messages);
        session.client_messages.extend(response.client_messages);
        if response.send_failure {
            if response.lose_connection {
                session.connected = false;
                session.lost("ct_send()");
            }
            return Err(ReturnCode::Fail);
        }
        self.pending = response.events.into();
        self.lose_connection = response.lose_connection;
        self.current = None;
        self.row_count = -1;
        Ok(())
    }

    fn results(&mut self) -> CtResult<Option<ResultType>> {
        self.current = None;
        self.bound.clear();
        {
            let mut session = self.session.lock();
            if !session.connected && !self.pending.is_empty() {
                session.cancel_fails = true;
                session.lost("ct_results()");
                return Err(ReturnCode::Fail);
            }
        }
        let Some(event) = self.pending.pop_front() else {
            return Ok(None);
        };
        let rt = match event {
            MockEvent::Rows { columns, rows } => {
                self.current = Some(CurrentResult {
                    columns,
                    rows: rows.into(),
                });
                ResultType::Row
            }
            MockEvent::Params { columns, values } => {
                self.current = Some(CurrentResult {
                    columns,
                    rows: VecDeque::from([values]),
                });
                ResultType::Param
            }
            MockEvent::Status(status) => {
                self.current = Some(CurrentResult {
                    columns: vec![MockColumn::int("")],
                    rows: VecDeque::from([vec![ScalarValue::from(status)]]),
                });
                ResultType::Status
            }
            MockEvent::Echo => {
                self.current = Some(self.echo_result());
                ResultType::Row
            }
            MockEvent::Done(count) => {
                self.row_count = count;
                ResultType::CmdDone
            }
            MockEvent::Succeed => ResultType::CmdSucceed,
            MockEvent::CmdFail => ResultType::CmdFail,
            MockEvent::Unexpected(code) => ResultType::Other(code),
            MockEvent::Fail => {
                let mut session = self.session.lock();
                if self.lose_connection {
                    session.connected = false;
                    session.cancel_fails = true;
                }
                session.client_messages.push(ClientMessage::new(
                    63,
                    6,
                    "ct_results(): user api layer: internal Client Library error: Read from the server has timed out",
                ));
                return Err(ReturnCode::Fail);
            }
        };
        trace!(result = ?rt, "mock results");
        Ok(Some(rt))
    }

    fn row_count(&self) -> CtResult<i64> {
        Ok(self.row_count)
    }

    fn column_count(&self) -> CtResult<usize> {
        Ok(self.current()?.columns.len())
    }

    fn describe(&self, index: usize) -> CtResult<DataFormat> {
        let fmt = self
            .current()?
            .columns
            .get(index)
            .map(MockColumn::describe)
            .ok_or(ReturnCode::Fail)?;
        self.server.lock().stats.describes += 1;
        Ok(fmt)
    }

    fn bind(&mut self, index: usize, format: &DataFormat) -> CtResult<()> {
        let count = self.current()?.columns.len();
        if index >= count {
            return Err(ReturnCode::Fail);
        }
        if self.bound.len() < count {
            self.bound.resize(count, None);
        }
        self.bound[index] = Some(format.clone());
        self.server.lock().stats.binds += 1;
        Ok(())
    }

    fn fetch(&mut self, buffers: &mut [ColumnBuffer]) -> CtResult<FetchStatus> {
        self.server.lock().stats.fetches += 1;
        let encoding = self.encoding;
        let current = self.current.as_mut().ok_or(ReturnCode::Fail)?;
        let Some(row) = current.rows.pop_front() else {
            return Ok(FetchStatus::EndData);
        };
        for (i, value) in row.iter().enumerate() {
            let format = self
                .bound
                .get(i)
                .and_then(Option::as_ref)
                .ok_or(ReturnCode::Fail)?;
            let buffer = buffers.get_mut(i).ok_or(ReturnCode::Fail)?;
            write_value(value, format, encoding, buffer)?;
        }
        Ok(FetchStatus::Rows(1))
    }

    fn cancel(&mut self) -> CtResult<()> {
        self.server.lock().stats.cancels += 1;
        let session = self.session.lock();
        if session.cancel_fails {
            return Err(ReturnCode::Fail);
        }
        self.pending.clear();
        self.current = None;
        Ok(())
    }
}

fn write_chars(bytes: &[u8], format: Format, buffer: &mut ColumnBuffer) {
    match format {
        Format::PadBlank => buffer.set_blank_padded(bytes),
        Format::NullTerm => buffer.set_null_terminated(bytes),
        Format::Unused => buffer.set(bytes),
    };
}

/// Convert a scalar into a bound buffer the way `ct_fetch()` would.
fn write_value(
    value: &ScalarValue,
    format: &DataFormat,
    encoding: &'static Encoding,
    buffer: &mut ColumnBuffer,
) -> CtResult<()> {
    if *value == ScalarValue::Null {
        buffer.set_null();
        return Ok(());
    }
    if let ScalarValue::Raw(bytes) = value {
        if format.datatype.is_character() {
            write_chars(bytes, format.format, buffer);
        } else {
            buffer.set(bytes);
        }
        return Ok(());
    }

    let fail = ReturnCode::Fail;
    let int = |v: &ScalarValue| v.int().ok_or(fail);
    match format.datatype {
        t if t.is_character() => {
            let text = value.text().ok_or(fail)?;
            let (bytes, _, had_errors) = encoding.encode(&text);
            if had_errors {
                return Err(fail);
            }
            write_chars(&bytes, format.format, buffer);
        }
        t if t.is_binary() => match value {
            ScalarValue::Binary(b) => {
                buffer.set(b);
            }
            _ => return Err(fail),
        },
        WireType::TinyInt => {
            buffer.set(&[u8::try_from(int(value)?).map_err(|_| fail)?]);
        }
        WireType::SmallInt => {
            buffer.set(&i16::try_from(int(value)?).map_err(|_| fail)?.to_ne_bytes());
        }
        WireType::UShort | WireType::USmallInt => {
            buffer.set(&u16::try_from(int(value)?).map_err(|_| fail)?.to_ne_bytes());
        }
        WireType::Int => {
            buffer.set(&i32::try_from(int(value)?).map_err(|_| fail)?.to_ne_bytes());
        }
        WireType::UInt => {
            buffer.set(&u32::try_from(int(value)?).map_err(|_| fail)?.to_ne_bytes());
        }
        WireType::BigInt | WireType::Long => {
            buffer.set(&int(value)?.to_ne_bytes());
        }
        WireType::UBigInt => {
            buffer.set(&u64::try_from(int(value)?).map_err(|_| fail)?.to_ne_bytes());
        }
        WireType::Real => {
            buffer.set(&(value.float().ok_or(fail)? as f32).to_ne_bytes());
        }
        WireType::Float => {
            buffer.set(&value.float().ok_or(fail)?.to_ne_bytes());
        }
        WireType::Bit => {
            buffer.set(&[u8::from(int(value)? != 0)]);
        }
        WireType::DateTime => match value {
            ScalarValue::DateTime(dt) => {
                buffer.set(&dt.to_bytes());
            }
            _ => return Err(fail),
        },
        WireType::DateTime4 => match value {
            ScalarValue::DateTime4(dt) => {
                buffer.set(&dt.to_bytes());
            }
            _ => return Err(fail),
        },
        WireType::Date => match value {
            ScalarValue::Date(d) => {
                buffer.set(&d.to_ne_bytes());
            }
            _ => return Err(fail),
        },
        WireType::Time => match value {
            ScalarValue::Time(t) => {
                buffer.set(&t.to_ne_bytes());
            }
            _ => return Err(fail),
        },
        WireType::BigDateTime | WireType::BigTime => match value {
            ScalarValue::BigDateTime(v) | ScalarValue::BigTime(v) => {
                buffer.set(&v.to_ne_bytes());
            }
            _ => return Err(fail),
        },
        _ => return Err(fail),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_response_queue_repeats_last() {
        let lib = MockLibrary::builder()
            .with_response("q", MockResponse::affected(1))
            .with_response("q", MockResponse::affected(2))
            .build();
        let mut server = lib.server.lock();
        assert_eq!(server.response_for("q"), MockResponse::affected(1));
        assert_eq!(server.response_for("q"), MockResponse::affected(2));
        assert_eq!(server.response_for("q"), MockResponse::affected(2));
        assert_eq!(server.response_for("other"), MockResponse::empty());
    }

    #[test]
    fn test_write_char_formats() {
        let fmt = DataFormat::new(WireType::Char)
            .with_format(Format::PadBlank)
            .with_max_length(5);
        let mut buf = ColumnBuffer::with_capacity(5);
        write_value(&ScalarValue::from("ab"), &fmt, encoding_rs::UTF_8, &mut buf).unwrap();
        assert_eq!(buf.value(), b"ab   ");

        write_value(&ScalarValue::Null, &fmt, encoding_rs::UTF_8, &mut buf).unwrap();
        assert!(buf.is_null());
    }

    #[test]
    fn test_write_integers() {
        let fmt = DataFormat::new(WireType::SmallInt);
        let mut buf = ColumnBuffer::with_capacity(8);
        write_value(&ScalarValue::Int(-3), &fmt, encoding_rs::UTF_8, &mut buf).unwrap();
        assert_eq!(buf.value(), &(-3i16).to_ne_bytes());
        assert!(write_value(&ScalarValue::Int(70_000), &fmt, encoding_rs::UTF_8, &mut buf).is_err());
    }

    #[test]
    fn test_wire_encoding_follows_code_page() {
        let lib = MockLibrary::builder().mssql().build();
        let server = lib.server.lock();
        assert_eq!(server.wire_encoding("utf8"), encoding_rs::WINDOWS_1252);
    }
}
