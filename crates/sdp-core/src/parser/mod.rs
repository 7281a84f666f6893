//! SDP parsing according to RFC 8866
//!
//! Parsing never stops at the first problem. Every call returns a
//! [`ParseResult`] holding the document (when the mandatory structure was
//! intact) and the full list of [`Diagnostic`]s, each tied to the 1-based
//! line that caused it.

pub mod line_parser;
mod media_parser;
mod sdp_parser;
pub mod session_parser;
mod validation;

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::session::SessionDescription;

pub use self::line_parser::parse_sdp_line;
pub use self::media_parser::parse_media_line;
pub use self::sdp_parser::parse;
pub use self::session_parser::{parse_connection_line, parse_origin_line};

/// How bad a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// The line was dropped, or the document could not be built
    Error,
    /// The line was kept or ignored without loss of meaning
    Warning,
}

/// One problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line number; 0 when the problem concerns the whole document
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            line,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            line,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "line {}: {}: {}", self.line, severity, self.message)
    }
}

/// Outcome of a parse: the document if one could be built, plus diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub description: Option<SessionDescription>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    pub(crate) fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        ParseResult {
            description: None,
            diagnostics,
        }
    }

    /// Whether any diagnostic has [`Severity::Error`]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    /// Convert into a `Result`, turning a missing document into [`Error::Parse`]
    pub fn into_result(self) -> Result<(SessionDescription, Vec<Diagnostic>)> {
        match self.description {
            Some(description) => Ok((description, self.diagnostics)),
            None => {
                let message = self
                    .diagnostics
                    .iter()
                    .rev()
                    .find(|d| d.severity == Severity::Error)
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "no session description found".to_string());
                Err(Error::Parse {
                    message,
                    diagnostics: self.diagnostics,
                })
            }
        }
    }
}

/// Parse an SDP message held in a byte buffer
pub fn parse_bytes(content: &Bytes) -> ParseResult {
    match std::str::from_utf8(content) {
        Ok(text) => parse(text),
        Err(e) => ParseResult::failed(vec![Diagnostic::error(
            0,
            format!("SDP content is not valid UTF-8: {}", e),
        )]),
    }
}
