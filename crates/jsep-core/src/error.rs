//! Error types for the negotiation engine
//!
//! Every engine operation returns [`Result`]. Errors fall into a small set of
//! categories (see [`ErrorCategory`]) so callers can decide how to react
//! without matching on every variant.

use jsep_sdp_core::Diagnostic;
use thiserror::Error;

/// A type alias for handling `Result`s with `Error`
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the negotiation engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A description could not be parsed; `diagnostics` says why
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// A recognized attribute carried an invalid value
    #[error("Invalid attribute: {0}")]
    Attribute(String),

    /// The operation is not valid in the current signaling state
    #[error("Invalid state: {0}")]
    State(String),

    /// No workable configuration could be agreed with the remote side
    #[error("Negotiation failed: {0}")]
    Negotiation(String),

    /// Out-of-range index or unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport handoff or finalization problem
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse grouping of [`Error`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed input documents
    Protocol,
    /// Call made in the wrong signaling state
    State,
    /// Capabilities of the two sides could not be reconciled
    Negotiation,
    /// Caller or configuration mistakes
    Configuration,
    /// Transport layer problems
    Transport,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Parse { .. } | Error::Attribute(_) => ErrorCategory::Protocol,
            Error::State(_) => ErrorCategory::State,
            Error::Negotiation(_) => ErrorCategory::Negotiation,
            Error::InvalidArgument(_) | Error::Config(_) => ErrorCategory::Configuration,
            Error::Transport(_) => ErrorCategory::Transport,
        }
    }

    /// Parse diagnostics attached to this error, empty unless it is [`Error::Parse`]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Error::Parse { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

impl From<jsep_sdp_core::Error> for Error {
    fn from(err: jsep_sdp_core::Error) -> Self {
        match err {
            jsep_sdp_core::Error::Parse { message, diagnostics } => Error::Parse { message, diagnostics },
            jsep_sdp_core::Error::Attribute(message) => Error::Attribute(message),
            jsep_sdp_core::Error::InvalidArgument(message) => Error::InvalidArgument(message),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(format!("Invalid configuration document: {}", err))
    }
}
