//! Typed SDP (RFC 8866) document model for JSEP offer/answer negotiation.
//!
//! This crate owns the wire format: the [`SessionDescription`] tree, the typed
//! attribute set WebRTC endpoints exchange, a parser that reports every problem
//! as a line-numbered [`Diagnostic`], and a deterministic CRLF serializer.
//!
//! ```
//! use jsep_sdp_core::prelude::*;
//!
//! let text = "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\n\
//!             m=audio 9 RTP/AVP 0\r\na=rtpmap:0 PCMU/8000\r\n";
//! let sdp: SessionDescription = text.parse().unwrap();
//! let rtpmap = sdp.media_sections[0].attributes.get_rtpmap("0").unwrap();
//! assert_eq!(rtpmap.channels, 1);
//! ```

// Error handling
pub mod error;

// Document model
pub mod types;

// Attribute value grammars
pub mod attributes;

// Document parser
pub mod parser;

// Public exports
pub use error::{Error, Result};
pub use parser::{parse, parse_bytes, Diagnostic, ParseResult, Severity};
pub use types::*;

/// Re-export of common types and functions
pub mod prelude {
    pub use super::{
        parse, Attribute, AttributeKind, AttributeList, Diagnostic, Error, MediaDirection, MediaSection,
        MediaType, Origin, ParseResult, Protocol, Result, SessionDescription, SetupRole, Severity,
    };
}
