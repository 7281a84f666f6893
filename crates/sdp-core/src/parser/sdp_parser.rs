//! # SDP Document Parser
//!
//! Turns SDP text into a [`SessionDescription`] while collecting a diagnostic for
//! every problem encountered along the way.
//!
//! ## Required Fields
//!
//! According to RFC 8866, the following fields are mandatory in the session-level section:
//!
//! - `v=` - Protocol version (must be "0" and must be the first line)
//! - `o=` - Origin
//! - `s=` - Session name
//! - `t=` - Timing (at least one)
//!
//! A missing or malformed mandatory field, or a malformed `m=` line, means no
//! document is produced. Everything else is recoverable: the offending line is
//! reported and dropped, and parsing carries on.
//!
//! ## Field Order
//!
//! The session-level section runs from `v=` to the first `m=` line. Each media
//! section runs from its `m=` line to the next one. Session-only lines found
//! inside a media section are reported and dropped.

use tracing::debug;

use crate::attributes::parse_attribute;
use crate::parser::line_parser::{split_lines, SdpLine};
use crate::parser::media_parser::parse_media_line;
use crate::parser::session_parser::{parse_bandwidth, parse_connection_line, parse_origin_line, parse_timing_line};
use crate::parser::{Diagnostic, ParseResult};
use crate::types::attribute::Attribute;
use crate::types::attribute_list::AttributeList;
use crate::types::media::MediaSection;
use crate::types::session::{Bandwidth, Connection, Origin, SessionDescription, Timing};

/// Field order tracking for the session-level section
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum FieldOrder {
    Version,      // v= (must be first)
    Origin,       // o= (must be second)
    SessionName,  // s= (must be third)
    SessionLevel, // All other session-level fields (lenient ordering)
    Media,        // m= (starts a media section)
}

/// Document-under-construction plus its running diagnostics
struct DocumentBuilder {
    diagnostics: Vec<Diagnostic>,
    position: FieldOrder,
    origin: Option<Origin>,
    session_name: Option<String>,
    information: Option<String>,
    uri: Option<String>,
    emails: Vec<String>,
    phones: Vec<String>,
    connection: Option<Connection>,
    bandwidths: Vec<Bandwidth>,
    timings: Vec<Timing>,
    time_zones: Option<String>,
    attributes: AttributeList,
    media_sections: Vec<MediaSection>,
}

/// Marker for an unrecoverable problem; the diagnostic has already been recorded
struct Fatal;

impl DocumentBuilder {
    fn new() -> Self {
        DocumentBuilder {
            diagnostics: Vec::new(),
            position: FieldOrder::Version,
            origin: None,
            session_name: None,
            information: None,
            uri: None,
            emails: Vec::new(),
            phones: Vec::new(),
            connection: None,
            bandwidths: Vec::new(),
            timings: Vec::new(),
            time_zones: None,
            attributes: AttributeList::new(),
            media_sections: Vec::new(),
        }
    }

    fn error(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(line, message));
    }

    fn warning(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(line, message));
    }

    fn fatal(&mut self, line: usize, message: impl Into<String>) -> Fatal {
        self.error(line, message);
        Fatal
    }

    fn in_media(&self) -> bool {
        self.position == FieldOrder::Media
    }

    /// Session-only line types are dropped once the first m= line has been seen
    fn session_only(&mut self, line: &SdpLine<'_>) -> bool {
        if self.in_media() {
            self.error(
                line.number,
                format!("{}= is only allowed at session level", line.kind),
            );
            return false;
        }
        true
    }

    fn handle_line(&mut self, line: &SdpLine<'_>) -> Result<(), Fatal> {
        // Mandatory header ordering
        match (self.position, line.kind) {
            (FieldOrder::Version, 'v') => {
                if line.value.trim() != "0" {
                    return Err(self.fatal(line.number, format!("Unsupported SDP version: {}", line.value)));
                }
                self.position = FieldOrder::Origin;
                return Ok(());
            }
            (FieldOrder::Version, _) => {
                return Err(self.fatal(line.number, "v= must be the first line in SDP"));
            }
            (FieldOrder::Origin, 'o') => {
                match parse_origin_line(line.value) {
                    Ok(origin) => self.origin = Some(origin),
                    Err(e) => return Err(self.fatal(line.number, e.to_string())),
                }
                self.position = FieldOrder::SessionName;
                return Ok(());
            }
            (FieldOrder::Origin, _) => {
                return Err(self.fatal(line.number, "o= must follow v="));
            }
            (FieldOrder::SessionName, 's') => {
                self.session_name = Some(line.value.to_string());
                self.position = FieldOrder::SessionLevel;
                return Ok(());
            }
            (FieldOrder::SessionName, _) => {
                return Err(self.fatal(line.number, "s= must follow o="));
            }
            _ => {}
        }

        match line.kind {
            'v' | 'o' | 's' => {
                self.error(line.number, format!("Duplicate {}= line ignored", line.kind));
            }
            'i' => {
                if self.in_media() {
                    if let Some(section) = self.media_sections.last_mut() {
                        section.information = Some(line.value.to_string());
                    }
                } else if self.information.is_none() {
                    self.information = Some(line.value.to_string());
                } else {
                    self.error(line.number, "Multiple session-level i= lines found");
                }
            }
            'u' => {
                if self.session_only(line) {
                    if self.uri.is_some() {
                        self.error(line.number, "Multiple u= lines found");
                    } else {
                        self.uri = Some(line.value.to_string());
                    }
                }
            }
            'e' => {
                if self.session_only(line) {
                    self.emails.push(line.value.to_string());
                }
            }
            'p' => {
                if self.session_only(line) {
                    self.phones.push(line.value.to_string());
                }
            }
            'c' => match parse_connection_line(line.value) {
                Ok(connection) => {
                    if self.in_media() {
                        if let Some(section) = self.media_sections.last_mut() {
                            section.connection = Some(connection);
                        }
                    } else {
                        self.connection = Some(connection);
                    }
                }
                Err(e) => self.error(line.number, e.to_string()),
            },
            'b' => match parse_bandwidth(line.value) {
                Ok(bandwidth) => {
                    if self.in_media() {
                        if let Some(section) = self.media_sections.last_mut() {
                            section.bandwidths.push(bandwidth);
                        }
                    } else {
                        self.bandwidths.push(bandwidth);
                    }
                }
                Err(e) => self.error(line.number, e.to_string()),
            },
            't' => {
                if self.session_only(line) {
                    match parse_timing_line(line.value) {
                        Ok(timing) => self.timings.push(timing),
                        Err(e) => return Err(self.fatal(line.number, e.to_string())),
                    }
                }
            }
            'r' => {
                if self.session_only(line) {
                    match self.timings.last_mut() {
                        Some(timing) => timing.repeats.push(line.value.trim().to_string()),
                        None => self.error(line.number, "r= without a preceding t= line"),
                    }
                }
            }
            'z' => {
                if self.session_only(line) {
                    self.time_zones = Some(line.value.trim().to_string());
                }
            }
            'k' => {
                self.warning(line.number, "Deprecated k= line ignored");
            }
            'a' => self.handle_attribute(line),
            'm' => {
                if self.timings.is_empty() {
                    return Err(self.fatal(line.number, "m= must come after at least one t= line"));
                }
                match parse_media_line(line.value) {
                    Ok(section) => {
                        self.media_sections.push(section);
                        self.position = FieldOrder::Media;
                    }
                    Err(e) => return Err(self.fatal(line.number, e.to_string())),
                }
            }
            other => {
                self.warning(line.number, format!("Unknown line type {}= ignored", other));
            }
        }

        Ok(())
    }

    fn handle_attribute(&mut self, line: &SdpLine<'_>) {
        let (name, value) = match line.value.split_once(':') {
            Some((name, value)) => (name.trim(), Some(value)),
            None => (line.value.trim(), None),
        };

        if name.is_empty() {
            self.error(line.number, "Attribute without a name");
            return;
        }

        let attribute = match parse_attribute(name, value) {
            Ok(attribute) => attribute,
            Err(e) => {
                self.error(line.number, format!("a={}: {}", name, e));
                return;
            }
        };

        let kind = attribute.kind();
        if let Attribute::Other { .. } = attribute {
            self.warning(line.number, format!("Unknown attribute a={} kept as-is", name));
        }

        if self.in_media() {
            if !kind.allowed_at_media_level() {
                self.error(line.number, format!("a={} is not allowed at media level", kind));
                return;
            }
            if let Some(section) = self.media_sections.last_mut() {
                section.attributes.set_attribute(attribute);
            }
        } else {
            if !kind.allowed_at_session_level() {
                self.error(line.number, format!("a={} is not allowed at session level", kind));
                return;
            }
            self.attributes.set_attribute(attribute);
        }
    }

    fn finish(mut self) -> ParseResult {
        if self.position == FieldOrder::Version {
            self.error(0, "Missing v= line");
        }
        let (Some(origin), Some(session_name)) = (self.origin.take(), self.session_name.take()) else {
            if self.position != FieldOrder::Version {
                self.error(0, "Missing mandatory o= or s= line");
            }
            return ParseResult::failed(self.diagnostics);
        };
        if self.timings.is_empty() {
            self.error(0, "Missing t= line");
            return ParseResult::failed(self.diagnostics);
        }

        let description = SessionDescription {
            version: 0,
            origin,
            session_name,
            information: self.information,
            uri: self.uri,
            emails: self.emails,
            phones: self.phones,
            connection: self.connection,
            bandwidths: self.bandwidths,
            timings: self.timings,
            time_zones: self.time_zones,
            attributes: self.attributes,
            media_sections: self.media_sections,
        };

        ParseResult {
            description: Some(description),
            diagnostics: self.diagnostics,
        }
    }
}

/// Parse SDP text
///
/// Never panics and shares no state between calls: the same input always
/// yields the same result and the same diagnostics.
pub fn parse(text: &str) -> ParseResult {
    let (lines, malformed) = split_lines(text);
    let mut builder = DocumentBuilder::new();

    // Malformed lines are merged back in document order
    let mut malformed = malformed.into_iter().peekable();

    for line in &lines {
        while let Some(bad) = malformed.next_if(|bad| bad.number < line.number) {
            if builder.position == FieldOrder::Version {
                builder.error(bad.number, format!("Failed to parse SDP line: {}", bad.text));
                return ParseResult::failed(builder.diagnostics);
            }
            builder.error(bad.number, format!("Failed to parse SDP line: {}", bad.text));
        }

        if builder.handle_line(line).is_err() {
            debug!(diagnostics = builder.diagnostics.len(), "SDP parse failed");
            return ParseResult::failed(builder.diagnostics);
        }
    }

    for bad in malformed {
        builder.error(bad.number, format!("Failed to parse SDP line: {}", bad.text));
    }

    let result = builder.finish();
    debug!(
        ok = result.description.is_some(),
        diagnostics = result.diagnostics.len(),
        sections = result.description.as_ref().map_or(0, |d| d.media_sections.len()),
        "Parsed session description"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Severity;
    use crate::types::attribute::MediaDirection;
    use crate::types::media::MediaType;

    const MINIMAL: &str = "v=0\r\no=- 0 0 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\n";

    #[test]
    fn test_parse_minimal_valid_sdp() {
        let result = parse(MINIMAL);
        assert!(result.diagnostics.is_empty());
        let sdp = result.description.unwrap();
        assert_eq!(sdp.session_name, "-");
        assert_eq!(sdp.timings.len(), 1);
        assert!(sdp.media_sections.is_empty());
    }

    #[test]
    fn test_parse_webrtc_sdp() {
        let sdp = "v=0\r\n\
o=mozilla...THIS_IS_SDPARTA 4611686018427387903 0 IN IP4 0.0.0.0\r\n\
s=-\r\n\
t=0 0\r\n\
a=fingerprint:sha-256 AA:BB:CC:DD:EE:FF:00:11:22:33:44:55:66:77:88:99:AA:BB:CC:DD:EE:FF:00:11:22:33:44:55:66:77:88:99\r\n\
a=group:BUNDLE sdparta_0\r\n\
a=ice-options:trickle\r\n\
a=msid-semantic:WMS *\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 109 0\r\n\
c=IN IP4 0.0.0.0\r\n\
a=sendrecv\r\n\
a=ice-pwd:e3baa26dd2fa5030d881d385f1e36cce\r\n\
a=ice-ufrag:58b99ead\r\n\
a=mid:sdparta_0\r\n\
a=rtcp-mux\r\n\
a=rtpmap:109 opus/48000/2\r\n\
a=rtpmap:0 PCMU/8000\r\n\
a=setup:actpass\r\n";

        let result = parse(sdp);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let sdp = result.description.unwrap();
        assert_eq!(sdp.attributes.groups().len(), 1);
        assert!(sdp.attributes.get_fingerprint().is_some());

        let audio = &sdp.media_sections[0];
        assert_eq!(audio.media_type, MediaType::Audio);
        assert_eq!(audio.direction(), MediaDirection::SendRecv);
        assert_eq!(audio.mid(), Some("sdparta_0"));
        assert!(audio.attributes.is_rtcp_mux());
        assert_eq!(audio.attributes.rtpmaps().count(), 2);
        assert_eq!(audio.connection.as_ref().map(|c| c.address.as_str()), Some("0.0.0.0"));
    }

    #[test]
    fn test_parse_missing_mandatory_fields() {
        let result = parse("v=0\r\ns=-\r\nt=0 0\r\n");
        assert!(result.description.is_none());
        assert!(result.has_errors());

        let result = parse("v=0\r\no=- 0 0 IN IP4 0.0.0.0\r\ns=-\r\n");
        assert!(result.description.is_none());
        assert!(result.diagnostics.iter().any(|d| d.message.contains("t=")));

        let result = parse("v=1\r\no=- 0 0 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\n");
        assert!(result.description.is_none());
    }

    #[test]
    fn test_parse_malformed_origin_is_fatal() {
        let result = parse("v=0\r\no=- 0 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\n");
        assert!(result.description.is_none());
        assert_eq!(result.diagnostics[0].line, 2);
    }

    #[test]
    fn test_parse_malformed_media_line_is_fatal() {
        let text = format!("{}m=audio nine RTP/AVP 0\r\n", MINIMAL);
        let result = parse(&text);
        assert!(result.description.is_none());
        assert_eq!(result.diagnostics.last().map(|d| d.line), Some(5));
    }

    #[test]
    fn test_recoverable_lines_are_reported_and_dropped() {
        let text = format!(
            "{}c=IN IP4\r\nm=audio 9 RTP/AVP 0\r\na=rtpmap:200 PCMU/8000\r\na=x-custom:1\r\na=group:BUNDLE 0\r\nt=0 0\r\ny=whatever\r\n",
            MINIMAL
        );
        let result = parse(&text);
        let sdp = result.description.clone().unwrap();
        assert!(sdp.connection.is_none());

        let section = &sdp.media_sections[0];
        assert!(section.attributes.rtpmaps().next().is_none());
        assert!(section.attributes.other("x-custom").is_some());
        assert!(section.attributes.groups().is_empty());

        let lines: Vec<(usize, Severity)> = result.diagnostics.iter().map(|d| (d.line, d.severity)).collect();
        assert_eq!(
            lines,
            vec![
                (5, Severity::Error),
                (7, Severity::Error),
                (8, Severity::Warning),
                (9, Severity::Error),
                (10, Severity::Error),
                (11, Severity::Warning),
            ]
        );
    }

    #[test]
    fn test_parse_lf_only_and_repeat_times() {
        let result = parse("v=0\no=- 1 2 IN IP4 127.0.0.1\ns=Talk\nt=0 0\nr=7d 1h 0 25h\n");
        let sdp = result.description.unwrap();
        assert_eq!(sdp.timings[0].repeats, vec!["7d 1h 0 25h"]);
    }
}
