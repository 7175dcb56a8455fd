use std::borrow::Cow;
use std::fmt::{self, Display};

use serde::Serialize;

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The arguments did not match the parameter schema of the tool.
    InvalidArguments,
    /// No tool with the requested name is registered.
    UnknownTool,
    /// Error occurred while executing the tool.
    ExecutionError,
    /// The tool did not finish within the time limit.
    TimedOut,
    /// The request was never executed because the turn ended first.
    NotExecuted,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidArguments => write!(f, "Invalid arguments"),
            ErrorKind::UnknownTool => write!(f, "Unknown tool"),
            ErrorKind::ExecutionError => write!(f, "Execution error"),
            ErrorKind::TimedOut => write!(f, "Timed out"),
            ErrorKind::NotExecuted => write!(f, "Not executed"),
        }
    }
}

/// Describes a tool call error.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    #[inline]
    fn with_kind(kind: ErrorKind) -> Self {
        Self { kind, reason: None }
    }

    /// Creates a new error with the `InvalidArguments` kind.
    #[inline]
    pub fn invalid_arguments() -> Self {
        Self::with_kind(ErrorKind::InvalidArguments)
    }

    /// Creates a new error with the `UnknownTool` kind.
    #[inline]
    pub fn unknown_tool() -> Self {
        Self::with_kind(ErrorKind::UnknownTool)
    }

    /// Creates a new error with the `ExecutionError` kind.
    #[inline]
    pub fn execution_error() -> Self {
        Self::with_kind(ErrorKind::ExecutionError)
    }

    /// Creates a new error with the `TimedOut` kind.
    #[inline]
    pub fn timed_out() -> Self {
        Self::with_kind(ErrorKind::TimedOut)
    }

    /// Creates a new error with the `NotExecuted` kind.
    #[inline]
    pub fn not_executed() -> Self {
        Self::with_kind(ErrorKind::NotExecuted)
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of the error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::unknown_tool();
        assert_eq!(err.to_string(), "Unknown tool");
        assert_eq!(err.reason(), "Unknown tool");

        let err = Error::execution_error().with_reason("slot is taken");
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
        assert_eq!(err.to_string(), "Execution error: slot is taken");
        assert_eq!(err.reason(), "slot is taken");
    }
}
