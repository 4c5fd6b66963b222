//! Client error types.
//!
//! Every error carries a stable kind string ([`Error::kind`]) so callers can
//! match on the failure class without parsing messages.

use sybase_types::TypeError;
use thiserror::Error;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The datasource has no username.
    #[error("datasource has an empty username parameter")]
    MissingUsername,

    /// The datasource has no database name.
    #[error("datasource has an empty dbname parameter")]
    MissingDbName,

    /// The datasource names a character set that cannot be mapped.
    #[error("cannot map encoding '{0}' to a supported character set")]
    UnknownCharset(String),

    /// Invalid datasource configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection could not be established or re-established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The connection was lost and could not be reopened.
    #[error("the connection was aborted and must be reopened")]
    ConnectionAborted,

    /// A session setup call failed.
    #[error("{message}")]
    Setup {
        /// Kind string naming the failed setup step.
        kind: &'static str,
        /// Description including drained diagnostics.
        message: String,
    },

    /// The client library reported an error.
    #[error("{0}")]
    Client(String),

    /// The server reported an error.
    #[error("{0}")]
    Server(String),

    /// Command execution failed; the connection remains usable.
    #[error("{0}")]
    Exec(String),

    /// The connection dropped while a command was in progress.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// A parameter could not be bound.
    #[error("{0}")]
    Bind(String),

    /// A date could not be bound.
    #[error("{0}")]
    Date(String),

    /// Malformed query template.
    #[error("{0}")]
    Template(String),

    /// A single-row query returned more than one row.
    #[error("{0}")]
    SelectRow(String),

    /// The connection was lost inside a transaction.
    #[error("connection to server lost while in a transaction; transaction has been lost")]
    TransactionLost,

    /// The statement was invalidated by its connection.
    #[error(
        "the connection was lost while the statement was in progress; it cannot be used any longer"
    )]
    StatementInvalidated,

    /// Unknown driver option or invalid option value.
    #[error("{0}")]
    Option(String),

    /// Value conversion error.
    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

impl Error {
    /// The stable kind string of this error.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingUsername => "DATASOURCE-MISSING-USERNAME",
            Self::MissingDbName => "DATASOURCE-MISSING-DBNAME",
            Self::UnknownCharset(_) => "UNKNOWN-CHARACTER-SET",
            Self::Config(_) => "DATASOURCE-CONFIG-ERROR",
            Self::Connect(_) => "CONNECT-ERROR",
            Self::ConnectionAborted => "DATASOURCE-ABORTED",
            Self::Setup { kind, .. } => kind,
            Self::Client(_) => "TDS-CLIENT-ERROR",
            Self::Server(_) => "TDS-SERVER-ERROR",
            Self::Exec(_) | Self::ConnectionLost(_) => "TDS-EXEC-ERROR",
            Self::Bind(_) => "TDS-BIND-ERROR",
            Self::Date(_) => "TDS-DATE-ERROR",
            Self::Template(_) => "DBI-EXEC-EXCEPTION",
            Self::SelectRow(_) => "DBI-SELECT-ROW-ERROR",
            Self::TransactionLost => "TDS-TRANSACTION-ERROR",
            Self::StatementInvalidated => "STATEMENT-CONNECTION-ERROR",
            Self::Option(_) => "OPTION-ERROR",
            Self::Type(e) if e.is_date_error() => "TDS-DATE-ERROR",
            Self::Type(_) => "TDS-EXEC-ERROR",
        }
    }

    /// Check if this error is transient and may succeed on retry.
    ///
    /// Only a dropped connection outside a transaction qualifies; the
    /// connection retries such failures once by itself.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionLost(_))
    }

    /// Check if the connection to the server was lost.
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            Self::ConnectionLost(_)
                | Self::TransactionLost
                | Self::ConnectionAborted
                | Self::StatementInvalidated
        )
    }

    /// Check if this error was raised while binding arguments.
    #[must_use]
    pub fn is_bind_error(&self) -> bool {
        match self {
            Self::Bind(_) | Self::Date(_) | Self::Template(_) => true,
            Self::Type(e) => e.is_date_error(),
            _ => false,
        }
    }

    /// Check if this error was raised before any I/O took place.
    #[must_use]
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::MissingUsername
                | Self::MissingDbName
                | Self::UnknownCharset(_)
                | Self::Config(_)
                | Self::Option(_)
        )
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings() {
        assert_eq!(Error::MissingUsername.kind(), "DATASOURCE-MISSING-USERNAME");
        assert_eq!(Error::TransactionLost.kind(), "TDS-TRANSACTION-ERROR");
        assert_eq!(
            Error::Setup {
                kind: "TDS-CTLIB-SET-USERNAME",
                message: String::new()
            }
            .kind(),
            "TDS-CTLIB-SET-USERNAME"
        );
        assert_eq!(Error::from(TypeError::RelativeDate).kind(), "TDS-DATE-ERROR");
        assert_eq!(Error::from(TypeError::UnexpectedNull).kind(), "TDS-EXEC-ERROR");
    }

    #[test]
    fn test_classification() {
        assert!(Error::ConnectionLost("x".into()).is_transient());
        assert!(!Error::TransactionLost.is_transient());
        assert!(Error::TransactionLost.is_connection_lost());
        assert!(Error::Template("x".into()).is_bind_error());
        assert!(Error::MissingDbName.is_setup_error());
        assert!(!Error::Exec("x".into()).is_setup_error());
    }

    #[test]
    fn test_statement_message() {
        assert_eq!(
            Error::StatementInvalidated.to_string(),
            "the connection was lost while the statement was in progress; it cannot be used any longer"
        );
    }
}
