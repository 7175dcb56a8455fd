use std::error::Error;
use std::fmt::{self, Display};
use std::time::Duration;

use zikomo_model::{ErrorKind, ModelProviderError};

/// Describes why the oracle could not answer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OracleError {
    kind: ErrorKind,
    message: String,
}

impl OracleError {
    /// Creates a new error with the given kind and message.
    #[inline]
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn from_provider<E: ModelProviderError>(err: E) -> Self {
        Self::new(err.kind(), err.to_string())
    }

    pub(crate) fn timed_out(limit: Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("no response within {limit:?}"),
        )
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl Error for OracleError {}

/// A fatal error that ends a turn.
///
/// Tool failures are never reported here: they are appended to the
/// transcript as failed tool results for the oracle to handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnError {
    /// The oracle could not be reached or failed to respond.
    OracleUnavailable(OracleError),
    /// The oracle kept requesting tools after `max_steps` dispatch rounds.
    StepBudgetExceeded {
        /// The configured budget.
        max_steps: usize,
    },
    /// The turn was cancelled by its caller.
    Cancelled,
}

impl Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::OracleUnavailable(err) => {
                write!(f, "oracle unavailable ({err})")
            }
            TurnError::StepBudgetExceeded { max_steps } => {
                write!(f, "no final answer after {max_steps} tool rounds")
            }
            TurnError::Cancelled => write!(f, "turn cancelled"),
        }
    }
}

impl Error for TurnError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TurnError::OracleUnavailable(err) => Some(err),
            _ => None,
        }
    }
}
