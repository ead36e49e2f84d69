//! PJSON error types

use thiserror::Error;

/// PJSON error type
///
/// Running out of input is not a failure for the streaming decoder; it only
/// surfaces as [`Error::Incomplete`] from the one-shot entry points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Incomplete input: stream ends inside a value at offset {offset}")]
    Incomplete { offset: u64 },

    #[error("Malformed stream at offset {offset}: {reason}")]
    Malformed { offset: u64, reason: String },

    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("Nesting depth exceeds limit of {0}")]
    DepthExceeded(usize),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

impl Error {
    pub(crate) fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        Error::Malformed {
            offset,
            reason: reason.into(),
        }
    }

    /// True for errors caused by the input stream itself.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::Malformed { .. } | Error::InvalidEncoding(_))
    }
}

/// PJSON result type
pub type Result<T> = std::result::Result<T, Error>;
