use thiserror::Error;

use crate::parser::Diagnostic;

/// A type alias for handling `Result`s with `Error`
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while typing or rendering SDP documents
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A mandatory document field is missing or malformed; the whole parse failed.
    ///
    /// `diagnostics` holds every problem found up to the point of failure.
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// A recognized attribute carried an invalid value
    #[error("Invalid attribute: {0}")]
    Attribute(String),

    /// Caller supplied an out-of-range or otherwise unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Build a parse error without any attached diagnostics
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics attached to a parse failure, empty for other variants
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Error::Parse { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Self {
        Error::Attribute(format!("Parsing failed: {err}"))
    }
}
