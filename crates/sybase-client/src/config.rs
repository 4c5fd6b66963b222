//! Datasource configuration.

use ctlib_protocol::charset::{self, DEFAULT_CHARSET};
use encoding_rs::Encoding;

use crate::error::Error;

/// Fixed session defaults.
pub mod defaults {
    /// Login timeout in seconds.
    pub const LOGIN_TIMEOUT_SECS: u32 = 60;
    /// Maximum text/image size returned by the server (1 MiB).
    pub const TEXT_SIZE: u32 = 1 << 20;
    /// Buffer length for exact numeric columns bound as character data.
    pub const NUMERIC_BUFFER_LEN: usize = 50;
    /// Minimum column buffer length.
    pub const MIN_BUFFER_LEN: usize = 8;
    /// Diagnostic messages above this severity are errors.
    pub const SEVERITY_THRESHOLD: i32 = 10;
}

/// Connection parameters of one external datasource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct DataSource {
    /// Login name.
    pub username: String,
    /// Login password; empty means none.
    pub password: String,
    /// Database to open.
    pub dbname: String,
    /// Client character set name; empty selects `utf8`.
    pub charset: String,
    /// Server host name.
    pub host: Option<String>,
    /// Server port.
    pub port: Option<u16>,
}

impl DataSource {
    /// Create an empty datasource.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `key=value;...` connection string.
    ///
    /// Recognized keys (case-insensitive): `user`, `pass`/`password`,
    /// `db`/`dbname`/`database`, `charset`/`encoding`, `host`/`server`,
    /// `port`. Other keys are ignored.
    pub fn from_connection_string(conn_str: &str) -> Result<Self, Error> {
        let mut ds = Self::default();

        for part in conn_str.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| Error::Config(format!("invalid key-value: {part}")))?;

            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user" | "username" => ds.username = value.to_string(),
                "pass" | "password" => ds.password = value.to_string(),
                "db" | "dbname" | "database" => ds.dbname = value.to_string(),
                "charset" | "encoding" => ds.charset = value.to_string(),
                "host" | "server" => ds.host = Some(value.to_string()),
                "port" => {
                    ds.port = Some(
                        value
                            .parse()
                            .map_err(|_| Error::Config(format!("invalid port: {value}")))?,
                    );
                }
                _ => {
                    tracing::debug!(key = %key, "ignoring unknown connection string key");
                }
            }
        }

        Ok(ds)
    }

    /// Set the login name.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the database name.
    #[must_use]
    pub fn dbname(mut self, dbname: impl Into<String>) -> Self {
        self.dbname = dbname.into();
        self
    }

    /// Set the client character set name.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Set the server host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// The character set name handed to the client library.
    #[must_use]
    pub fn charset_name(&self) -> &str {
        if self.charset.is_empty() {
            DEFAULT_CHARSET
        } else {
            &self.charset
        }
    }

    /// The server address in `"host port"` form, if both are set.
    #[must_use]
    pub fn server_address(&self) -> Option<String> {
        match (&self.host, self.port) {
            (Some(host), Some(port)) => Some(format!("{host} {port}")),
            _ => None,
        }
    }

    /// Check the datasource before any library call and resolve its encoding.
    pub fn validate(&self) -> Result<&'static Encoding, Error> {
        if self.username.is_empty() {
            return Err(Error::MissingUsername);
        }
        if self.dbname.is_empty() {
            return Err(Error::MissingDbName);
        }
        let encoding = charset::encoding_for_name(self.charset_name())
            .ok_or_else(|| Error::UnknownCharset(self.charset_name().to_string()))?;
        match (&self.host, self.port) {
            (Some(host), None) => Err(Error::Connect(format!(
                "hostname '{host}' given without a port number"
            ))),
            (None, Some(port)) => Err(Error::Connect(format!(
                "port number {port} given without a hostname"
            ))),
            _ => Ok(encoding),
        }
    }
}
