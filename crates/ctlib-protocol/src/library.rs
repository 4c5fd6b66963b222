//! Object-safe traits over the vendor client library.
//!
//! The library exposes four handle kinds, nested by ownership:
//!
//! ```text
//! Library ──alloc_context──> Context ──alloc_session──> Session ──alloc_command──> CommandHandle
//! ```
//!
//! Every call blocks until the library returns. Failures are reported as the
//! raw [`ReturnCode`]; the descriptive text is queued as diagnostic messages
//! on the session and drained separately with [`Session::client_messages`]
//! and [`Session::server_messages`].
//!
//! Dropping a handle releases it (`ct_cmd_drop`, `ct_con_drop`,
//! `cs_ctx_drop`).

use bitflags::bitflags;

use crate::message::{ClientMessage, ServerMessage};
use crate::results::{FetchStatus, ResultType, ReturnCode};
use crate::types::DataFormat;

/// Result of a client library call.
pub type CtResult<T> = Result<T, ReturnCode>;

/// Which client library implementation is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// Sybase Open Client ct-lib.
    Sybase,
    /// FreeTDS ct-lib compatibility layer.
    FreeTds,
}

bitflags! {
    /// Build-time capabilities of the loaded client library.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        /// `CS_BIGINT_TYPE` parameters are supported.
        const BIGINT_PARAMS = 0x0001;
        /// NULL parameters need an explicit datatype to be accepted.
        const NULL_TYPE_HINT = 0x0002;
    }
}

/// Connection property set with `ct_con_props(CS_SET, ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionProperty<'a> {
    /// `CS_USERNAME`.
    Username(&'a str),
    /// `CS_PASSWORD`.
    Password(&'a str),
    /// `CS_SERVERADDR` in `"host port"` form.
    ServerAddress(&'a str),
    /// `CS_LOGIN_TIMEOUT` in seconds.
    LoginTimeout(u32),
    /// Locale character set (`cs_locale(CS_SYB_CHARSET)` + `CS_LOC_PROP`).
    Charset(&'a str),
    /// `CS_CHARSETCNV`.
    CharsetConversion(bool),
}

/// Server option set with `ct_options(CS_SET, ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOption {
    /// `CS_OPT_CHAINXACTS`.
    ChainedTransactions(bool),
    /// `CS_OPT_TEXTSIZE` in bytes.
    TextSize(u32),
}

/// The loaded client library.
///
/// Shared by every connection in the process.
pub trait Library: Send + Sync {
    /// Allocate and initialize a context (`cs_ctx_alloc` + `ct_init`).
    ///
    /// Not reentrant: callers must serialize this call process-wide.
    fn alloc_context(&self) -> CtResult<Box<dyn Context>>;

    /// Which implementation is loaded.
    fn flavor(&self) -> Flavor;

    /// Build-time capabilities.
    fn capabilities(&self) -> Capabilities;
}

/// A library context (`CS_CONTEXT`).
pub trait Context: Send {
    /// Client library version string (`ct_config(CS_VER_STRING)`).
    fn version_string(&self) -> CtResult<String>;

    /// Use the long datetime conversion format (`cs_dt_info(CS_DT_CONVFMT, CS_DATES_LONG)`).
    fn set_long_date_format(&mut self) -> CtResult<()>;

    /// Allocate a connection handle (`ct_con_alloc`).
    fn alloc_session(&mut self) -> CtResult<Box<dyn Session>>;

    /// Shut the context down (`ct_exit`).
    ///
    /// Not reentrant: callers must serialize this call process-wide.
    fn exit(&mut self, force: bool) -> CtResult<()>;
}

/// A connection handle (`CS_CONNECTION`).
pub trait Session: Send {
    /// Enable inline message handling (`ct_diag(CS_INIT)`).
    fn init_diagnostics(&mut self) -> CtResult<()>;

    /// Set a connection property.
    fn set_property(&mut self, property: SessionProperty<'_>) -> CtResult<()>;

    /// Whether the library performs character set conversion itself
    /// (`ct_con_props(CS_GET, CS_CHARSETCNV)`).
    fn charset_conversion(&self) -> CtResult<bool>;

    /// Set a server option.
    fn set_option(&mut self, option: SessionOption) -> CtResult<()>;

    /// Log in and open the given database (`ct_connect`).
    fn connect(&mut self, dbname: &str) -> CtResult<()>;

    /// Whether the connection is up (`ct_con_props(CS_GET, CS_CON_STATUS)`).
    fn is_connected(&self) -> CtResult<bool>;

    /// Allocate a command handle (`ct_cmd_alloc`).
    fn alloc_command(&mut self) -> CtResult<Box<dyn CommandHandle>>;

    /// Cancel all pending results on the connection (`ct_cancel(CS_CANCEL_ALL)`).
    fn cancel_all(&mut self) -> CtResult<()>;

    /// Pending client messages (`ct_diag(CS_GET, CS_CLIENTMSG_TYPE)`).
    fn client_messages(&self) -> Vec<ClientMessage>;

    /// Pending server messages (`ct_diag(CS_GET, CS_SERVERMSG_TYPE)`).
    fn server_messages(&self) -> Vec<ServerMessage>;

    /// Discard all pending messages (`ct_diag(CS_CLEAR, CS_ALLMSG_TYPE)`).
    fn clear_messages(&mut self);

    /// Close the connection (`ct_close`), forcibly with `CS_FORCE_CLOSE`.
    fn close(&mut self, force: bool) -> CtResult<()>;
}

/// A command handle (`CS_COMMAND`).
///
/// Column and parameter indexes are zero-based.
pub trait CommandHandle: Send {
    /// Initiate a language command (`ct_command(CS_LANG_CMD)`).
    fn language(&mut self, text: &str) -> CtResult<()>;

    /// Add a parameter (`ct_param`); `None` binds SQL NULL.
    fn param(&mut self, format: &DataFormat, data: Option<&[u8]>) -> CtResult<()>;

    /// Send the command to the server (`ct_send`).
    fn send(&mut self) -> CtResult<()>;

    /// Read the next result announcement (`ct_results`).
    ///
    /// Returns `Ok(None)` once all results were read (`CS_END_RESULTS`).
    fn results(&mut self) -> CtResult<Option<ResultType>>;

    /// Rows affected by the finished command (`ct_res_info(CS_ROW_COUNT)`).
    fn row_count(&self) -> CtResult<i64>;

    /// Number of columns in the current result (`ct_res_info(CS_NUMDATA)`).
    fn column_count(&self) -> CtResult<usize>;

    /// Describe a result column (`ct_describe`).
    fn describe(&self, index: usize) -> CtResult<DataFormat>;

    /// Bind a result column to an output buffer of the given format (`ct_bind`).
    fn bind(&mut self, index: usize, format: &DataFormat) -> CtResult<()>;

    /// Fetch the next row into the bound buffers (`ct_fetch`).
    fn fetch(&mut self, buffers: &mut [ColumnBuffer]) -> CtResult<FetchStatus>;

    /// Cancel the command and discard its results (`ct_cancel(CS_CANCEL_ALL)`).
    fn cancel(&mut self) -> CtResult<()>;
}

/// One bound output buffer: value bytes, actual length and null indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBuffer {
    data: Vec<u8>,
    len: usize,
    indicator: i16,
}

impl ColumnBuffer {
    /// Indicator value marking a NULL column.
    pub const NULL_INDICATOR: i16 = -1;

    /// Allocate a zeroed buffer of fixed capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            len: 0,
            indicator: 0,
        }
    }

    /// Buffer capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The valid bytes of the current value.
    ///
    /// For null-terminated formats this excludes the terminator.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.data[..self.len.min(self.data.len())]
    }

    /// Length of the current value in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the current value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw null indicator.
    #[must_use]
    pub fn indicator(&self) -> i16 {
        self.indicator
    }

    /// Whether the current value is SQL NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.indicator == Self::NULL_INDICATOR
    }

    /// Store a value, truncating to capacity. Returns the stored length.
    ///
    /// A truncated value leaves the stored length in the indicator,
    /// saturating at `i16::MAX`; it is never negative.
    pub fn set(&mut self, value: &[u8]) -> usize {
        let n = value.len().min(self.data.len());
        self.data[..n].copy_from_slice(&value[..n]);
        self.len = n;
        self.indicator = if n < value.len() {
            i16::try_from(n).unwrap_or(i16::MAX)
        } else {
            0
        };
        n
    }

    /// Store a value followed by a NUL terminator when it fits.
    pub fn set_null_terminated(&mut self, value: &[u8]) -> usize {
        let cap = self.data.len();
        let n = value.len().min(cap.saturating_sub(1));
        self.data[..n].copy_from_slice(&value[..n]);
        if n < cap {
            self.data[n] = 0;
        }
        self.len = n;
        self.indicator = 0;
        n
    }

    /// Store a value padded with blanks to the full capacity.
    pub fn set_blank_padded(&mut self, value: &[u8]) -> usize {
        let n = self.set(value);
        self.data[n..].fill(b' ');
        self.len = self.data.len();
        self.len
    }

    /// Mark the value as SQL NULL.
    pub fn set_null(&mut self) {
        self.len = 0;
        self.indicator = Self::NULL_INDICATOR;
    }
}
