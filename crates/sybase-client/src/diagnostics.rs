//! Draining of client and server diagnostic messages.
//!
//! The client library queues messages on the session instead of reporting
//! them through the failing call. After every unit of work the queue is
//! drained: messages above [`SEVERITY_THRESHOLD`] become one error, and the
//! queue is always cleared so nothing leaks into the next operation.

use ctlib_protocol::{ClientMessage, ServerMessage, Session};

use crate::config::defaults::SEVERITY_THRESHOLD;
use crate::error::Error;

/// COMMIT TRANSACTION without a matching BEGIN TRANSACTION.
pub const COMMIT_WITHOUT_TRANSACTION: i32 = 3902;
/// ROLLBACK TRANSACTION without a matching BEGIN TRANSACTION.
pub const ROLLBACK_WITHOUT_TRANSACTION: i32 = 3903;

fn trim_trailing(text: &mut String) {
    let len = text.trim_end_matches(['\n', '.']).len();
    text.truncate(len);
}

/// Render a client message.
#[must_use]
pub fn format_client(msg: &ClientMessage) -> String {
    let mut out = format!(
        "client message {}: severity {}: {}",
        msg.number, msg.severity, msg.text
    );
    trim_trailing(&mut out);
    if msg.os_number != 0 {
        if let Some(os_text) = msg.os_text.as_deref().filter(|t| !t.is_empty()) {
            out.push_str(&format!(", OS error {}: {}", msg.os_number, os_text));
        }
    }
    out
}

/// Render a server message.
#[must_use]
pub fn format_server(msg: &ServerMessage) -> String {
    let mut out = String::new();
    if !msg.server.is_empty() {
        out.push_str(&msg.server);
        out.push_str(": ");
    }
    out.push_str(&format!(
        "state {}, server message {}, ",
        msg.state, msg.number
    ));
    if msg.line != 0 {
        out.push_str(&format!("line {}, ", msg.line));
    }
    out.push_str(&format!("severity {}", msg.severity));
    if !msg.text.is_empty() {
        out.push_str(": ");
        out.push_str(&msg.text);
    }
    trim_trailing(&mut out);
    out
}

/// Pending messages taken from a session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Messages {
    /// Client library messages.
    pub client: Vec<ClientMessage>,
    /// Server messages.
    pub server: Vec<ServerMessage>,
}

impl Messages {
    /// Take all pending messages off the session, clearing its queue.
    pub fn drain(session: &mut dyn Session) -> Self {
        let messages = Self {
            client: session.client_messages(),
            server: session.server_messages(),
        };
        session.clear_messages();
        for msg in &messages.client {
            tracing::debug!(
                number = msg.number,
                severity = msg.severity,
                "client message: {}",
                msg.text.trim_end()
            );
        }
        for msg in &messages.server {
            tracing::debug!(
                number = msg.number,
                severity = msg.severity,
                line = msg.line,
                "server message: {}",
                msg.text.trim_end()
            );
        }
        messages
    }

    /// Whether no messages were pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.client.is_empty() && self.server.is_empty()
    }

    /// Messages above the severity threshold, rendered in queue order.
    #[must_use]
    pub fn details(&self) -> Vec<String> {
        let client = self
            .client
            .iter()
            .filter(|m| m.severity > SEVERITY_THRESHOLD)
            .map(format_client);
        let server = self
            .server
            .iter()
            .filter(|m| m.severity > SEVERITY_THRESHOLD)
            .map(format_server);
        client.chain(server).collect()
    }

    /// Whether the only server message is a commit/rollback without an
    /// open transaction.
    #[must_use]
    pub fn only_transaction_warning(&self) -> bool {
        matches!(
            self.server.as_slice(),
            [msg] if msg.number == COMMIT_WITHOUT_TRANSACTION
                || msg.number == ROLLBACK_WITHOUT_TRANSACTION
        )
    }

    /// Build an error from `description` followed by the rendered details.
    #[must_use]
    pub fn error(&self, description: &str, make: impl FnOnce(String) -> Error) -> Error {
        let details = self.details();
        if details.is_empty() {
            make(description.to_string())
        } else {
            make(format!("{description}: {}", details.join(", ")))
        }
    }
}

/// Drain the session and build an error describing the failed operation.
pub fn exception(
    session: &mut dyn Session,
    description: &str,
    make: impl FnOnce(String) -> Error,
) -> Error {
    Messages::drain(session).error(description, make)
}

/// As [`exception`], but returns `None` when the only server message is the
/// benign commit/rollback-without-transaction warning.
pub fn checked_exception(
    session: &mut dyn Session,
    description: &str,
    make: impl FnOnce(String) -> Error,
) -> Option<Error> {
    let messages = Messages::drain(session);
    if messages.only_transaction_warning() {
        tracing::warn!("ignoring commit/rollback without an open transaction");
        return None;
    }
    Some(messages.error(description, make))
}

/// Drain the session, failing if any message is above the severity threshold.
///
/// Client errors take precedence over server errors.
pub fn purge(session: &mut dyn Session) -> Result<(), Error> {
    let messages = Messages::drain(session);
    let details = messages.details();
    if details.is_empty() {
        return Ok(());
    }
    let text = details.join(", ");
    if messages
        .client
        .iter()
        .any(|m| m.severity > SEVERITY_THRESHOLD)
    {
        Err(Error::Client(text))
    } else {
        Err(Error::Server(text))
    }
}
