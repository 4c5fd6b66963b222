//! Diagnostic message records drained with `ct_diag()`.

/// A message generated by the client library itself (`CS_CLIENTMSG`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientMessage {
    /// Message number (the `CS_NUMBER` part of the packed message number).
    pub number: i32,
    /// Severity (the `CS_SEVERITY` part of the packed message number).
    pub severity: i32,
    /// Message text.
    pub text: String,
    /// Operating system error number, 0 if none.
    pub os_number: i32,
    /// Operating system error text.
    pub os_text: Option<String>,
}

impl ClientMessage {
    /// Create a client message.
    pub fn new(number: i32, severity: i32, text: impl Into<String>) -> Self {
        Self {
            number,
            severity,
            text: text.into(),
            os_number: 0,
            os_text: None,
        }
    }

    /// Attach an operating system error.
    #[must_use]
    pub fn with_os_error(mut self, number: i32, text: impl Into<String>) -> Self {
        self.os_number = number;
        self.os_text = Some(text.into());
        self
    }

    /// Unpack a ct-lib message number into `(severity, number)`.
    #[must_use]
    pub const fn unpack(msgnumber: u32) -> (i32, i32) {
        (((msgnumber >> 8) & 0xFF) as i32, (msgnumber & 0xFF) as i32)
    }
}

/// A message sent by the server (`CS_SERVERMSG`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerMessage {
    /// Message number.
    pub number: i32,
    /// Error state.
    pub state: i32,
    /// Severity.
    pub severity: i32,
    /// Line in the batch or procedure, 0 if unknown.
    pub line: i32,
    /// Server name, empty if not reported.
    pub server: String,
    /// Stored procedure name, empty if not applicable.
    pub procedure: String,
    /// Message text.
    pub text: String,
}

impl ServerMessage {
    /// Create a server message.
    pub fn new(number: i32, severity: i32, text: impl Into<String>) -> Self {
        Self {
            number,
            severity,
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the state.
    #[must_use]
    pub fn with_state(mut self, state: i32) -> Self {
        self.state = state;
        self
    }

    /// Set the line number.
    #[must_use]
    pub fn with_line(mut self, line: i32) -> Self {
        self.line = line;
        self
    }

    /// Set the server name.
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }
}
