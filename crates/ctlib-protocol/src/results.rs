//! Return codes and result announcements.

use std::fmt;

/// Return code of a client library call (`CS_RETCODE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    /// `CS_SUCCEED`.
    Succeed,
    /// `CS_FAIL`.
    Fail,
    /// `CS_MEM_ERROR`.
    MemError,
    /// `CS_PENDING`.
    Pending,
    /// `CS_BUSY`.
    Busy,
    /// `CS_CANCELED`.
    Canceled,
    /// `CS_ROW_FAIL`.
    RowFail,
    /// `CS_END_DATA`.
    EndData,
    /// `CS_END_RESULTS`.
    EndResults,
    /// `CS_TIMED_OUT`.
    TimedOut,
    /// Any other code.
    Other(i32),
}

impl ReturnCode {
    /// Create a return code from its raw value.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Succeed,
            0 => Self::Fail,
            -1 => Self::MemError,
            -2 => Self::Pending,
            -4 => Self::Busy,
            -202 => Self::Canceled,
            -203 => Self::RowFail,
            -204 => Self::EndData,
            -205 => Self::EndResults,
            -208 => Self::TimedOut,
            other => Self::Other(other),
        }
    }

    /// The raw value.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Succeed => 1,
            Self::Fail => 0,
            Self::MemError => -1,
            Self::Pending => -2,
            Self::Busy => -4,
            Self::Canceled => -202,
            Self::RowFail => -203,
            Self::EndData => -204,
            Self::EndResults => -205,
            Self::TimedOut => -208,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Result announcement returned by `ct_results()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    /// A row result set follows (`CS_ROW_RESULT`).
    Row,
    /// Output parameter values follow (`CS_PARAM_RESULT`).
    Param,
    /// A stored procedure return status follows (`CS_STATUS_RESULT`).
    Status,
    /// A command finished; the row count is available (`CS_CMD_DONE`).
    CmdDone,
    /// A command without data succeeded (`CS_CMD_SUCCEED`).
    CmdSucceed,
    /// The server failed to execute a command (`CS_CMD_FAIL`).
    CmdFail,
    /// Any other announcement (compute, cursor, message, describe results).
    Other(i32),
}

impl ResultType {
    /// Create a result type from its raw value.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            4040 => Self::Row,
            4042 => Self::Param,
            4043 => Self::Status,
            4046 => Self::CmdDone,
            4047 => Self::CmdSucceed,
            4048 => Self::CmdFail,
            other => Self::Other(other),
        }
    }

    /// The raw value.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Row => 4040,
            Self::Param => 4042,
            Self::Status => 4043,
            Self::CmdDone => 4046,
            Self::CmdSucceed => 4047,
            Self::CmdFail => 4048,
            Self::Other(code) => code,
        }
    }
}

/// Outcome of a successful `ct_fetch()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Rows were transferred into the bound buffers.
    Rows(usize),
    /// No more rows in the current result set (`CS_END_DATA`).
    EndData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_code_values() {
        assert_eq!(ReturnCode::from_code(1), ReturnCode::Succeed);
        assert_eq!(ReturnCode::from_code(-205), ReturnCode::EndResults);
        assert_eq!(ReturnCode::from_code(-77), ReturnCode::Other(-77));
        assert_eq!(ReturnCode::Fail.to_string(), "0");
    }

    #[test]
    fn test_result_type_values() {
        assert_eq!(ResultType::from_code(4046), ResultType::CmdDone);
        assert_eq!(ResultType::Param.code(), 4042);
        assert_eq!(ResultType::from_code(4045), ResultType::Other(4045));
    }
}
