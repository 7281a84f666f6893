//! Session-level SDP fields
//!
//! Types for the session part of a description (RFC 8866 Section 5): origin,
//! connection data, bandwidth, timing and the [`SessionDescription`] container
//! that owns the ordered list of media sections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::attribute::{Attribute, AttributeKind};
use crate::types::attribute_list::AttributeList;
use crate::types::media::MediaSection;

/// Address type of an origin or connection line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressType {
    IP4,
    IP6,
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressType::IP4 => write!(f, "IP4"),
            AddressType::IP6 => write!(f, "IP6"),
        }
    }
}

impl FromStr for AddressType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "IP4" => Ok(AddressType::IP4),
            "IP6" => Ok(AddressType::IP6),
            other => Err(Error::InvalidArgument(format!("Unsupported address type: {}", other))),
        }
    }
}

/// Network type of every origin and connection line we produce or accept
pub const NETWORK_TYPE_INTERNET: &str = "IN";

/// Origin (o=) line
///
/// `o=<username> <sess-id> <sess-version> IN <addrtype> <unicast-address>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub username: String,
    pub session_id: u64,
    pub session_version: u64,
    pub address_type: AddressType,
    pub unicast_address: String,
}

impl Origin {
    pub fn new(
        username: impl Into<String>,
        session_id: u64,
        session_version: u64,
        address_type: AddressType,
        unicast_address: impl Into<String>,
    ) -> Self {
        Origin {
            username: username.into(),
            session_id,
            session_version,
            address_type,
            unicast_address: unicast_address.into(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.username,
            self.session_id,
            self.session_version,
            NETWORK_TYPE_INTERNET,
            self.address_type,
            self.unicast_address
        )
    }
}

/// Connection data (c=) line
///
/// Multicast addresses may carry a TTL (IPv4 only) and an address count:
/// `IN IP4 224.2.1.1/127/3`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub address_type: AddressType,
    pub address: String,
    pub ttl: Option<u8>,
    pub count: Option<u32>,
}

impl Connection {
    pub fn new(address_type: AddressType, address: impl Into<String>) -> Self {
        Connection {
            address_type,
            address: address.into(),
            ttl: None,
            count: None,
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", NETWORK_TYPE_INTERNET, self.address_type, self.address)?;
        if let Some(ttl) = self.ttl {
            write!(f, "/{}", ttl)?;
        }
        if let Some(count) = self.count {
            write!(f, "/{}", count)?;
        }
        Ok(())
    }
}

/// Bandwidth (b=) line, value in kilobits per second for AS/CT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bandwidth {
    pub bw_type: String,
    pub value: u32,
}

impl Bandwidth {
    pub fn new(bw_type: impl Into<String>, value: u32) -> Self {
        Bandwidth {
            bw_type: bw_type.into(),
            value,
        }
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bw_type, self.value)
    }
}

/// Timing (t=) line together with its repeat (r=) lines
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timing {
    pub start: u64,
    pub stop: u64,
    /// Raw r= values, kept verbatim
    pub repeats: Vec<String>,
}

impl Timing {
    pub fn new(start: u64, stop: u64) -> Self {
        Timing {
            start,
            stop,
            repeats: Vec::new(),
        }
    }
}

/// A complete session description
///
/// Media sections are addressed by their zero-based position ("level"); the
/// order is never changed once a section has been added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    pub version: u32,
    pub origin: Origin,
    pub session_name: String,
    pub information: Option<String>,
    pub uri: Option<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub connection: Option<Connection>,
    pub bandwidths: Vec<Bandwidth>,
    pub timings: Vec<Timing>,
    pub time_zones: Option<String>,
    pub attributes: AttributeList,
    pub media_sections: Vec<MediaSection>,
}

impl SessionDescription {
    /// Create a description with `s=-` and a single `t=0 0`
    pub fn new(origin: Origin) -> Self {
        SessionDescription {
            version: 0,
            origin,
            session_name: "-".to_string(),
            information: None,
            uri: None,
            emails: Vec::new(),
            phones: Vec::new(),
            connection: None,
            bandwidths: Vec::new(),
            timings: vec![Timing::new(0, 0)],
            time_zones: None,
            attributes: AttributeList::new(),
            media_sections: Vec::new(),
        }
    }

    pub fn media_section(&self, level: usize) -> Option<&MediaSection> {
        self.media_sections.get(level)
    }

    pub fn media_section_mut(&mut self, level: usize) -> Option<&mut MediaSection> {
        self.media_sections.get_mut(level)
    }

    pub fn media_section_count(&self) -> usize {
        self.media_sections.len()
    }

    /// Append a media section and return its level
    pub fn add_media_section(&mut self, section: MediaSection) -> usize {
        self.media_sections.push(section);
        self.media_sections.len() - 1
    }

    /// Find the level of the section carrying `a=mid:<mid>`
    pub fn level_for_mid(&self, mid: &str) -> Option<usize> {
        self.media_sections
            .iter()
            .position(|section| section.attributes.mid() == Some(mid))
    }

    /// Connection data for a media section, falling back to the session c= line
    pub fn connection_for(&self, level: usize) -> Option<&Connection> {
        self.media_sections
            .get(level)
            .and_then(|section| section.connection.as_ref())
            .or(self.connection.as_ref())
    }

    /// Whether `kind` is present at `level`, optionally consulting the session level
    ///
    /// Only kinds that are legal at session level are inherited.
    pub fn has_attribute_at(&self, level: usize, kind: AttributeKind, include_session_fallback: bool) -> bool {
        let Some(section) = self.media_sections.get(level) else {
            return false;
        };
        if include_session_fallback {
            section.attributes.has_attribute_with_fallback(kind, &self.attributes)
        } else {
            section.attributes.has_attribute(kind)
        }
    }

    /// Values of `kind` at `level`, inheriting session-level values when the
    /// section has none
    pub fn attribute_at(&self, level: usize, kind: AttributeKind) -> &[Attribute] {
        let Some(section) = self.media_sections.get(level) else {
            return &[];
        };
        let local = section.attributes.get(kind);
        if local.is_empty() && kind.allowed_at_session_level() {
            self.attributes.get(kind)
        } else {
            local
        }
    }

    /// Render the description in wire form
    pub fn to_sdp_string(&self) -> String {
        self.to_string()
    }
}

impl FromStr for SessionDescription {
    type Err = Error;

    /// Parses SDP text, failing when any mandatory field is missing or malformed.
    ///
    /// Non-fatal diagnostics are discarded; use [`crate::parser::parse`] to keep them.
    fn from_str(s: &str) -> Result<Self> {
        crate::parser::parse(s).into_result().map(|(description, _)| description)
    }
}

impl fmt::Display for SessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Mandatory lines
        write!(f, "v={}\r\n", self.version)?;
        write!(f, "o={}\r\n", self.origin)?;
        write!(f, "s={}\r\n", self.session_name)?;

        if let Some(information) = &self.information {
            write!(f, "i={}\r\n", information)?;
        }
        if let Some(uri) = &self.uri {
            write!(f, "u={}\r\n", uri)?;
        }
        for email in &self.emails {
            write!(f, "e={}\r\n", email)?;
        }
        for phone in &self.phones {
            write!(f, "p={}\r\n", phone)?;
        }
        if let Some(connection) = &self.connection {
            write!(f, "c={}\r\n", connection)?;
        }
        for bandwidth in &self.bandwidths {
            write!(f, "b={}\r\n", bandwidth)?;
        }
        for timing in &self.timings {
            write!(f, "t={} {}\r\n", timing.start, timing.stop)?;
            for repeat in &timing.repeats {
                write!(f, "r={}\r\n", repeat)?;
            }
        }
        if let Some(zones) = &self.time_zones {
            write!(f, "z={}\r\n", zones)?;
        }

        write!(f, "{}", self.attributes)?;

        for section in &self.media_sections {
            write!(f, "{}", section)?;
        }
        Ok(())
    }
}
