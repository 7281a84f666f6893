//! Media-level SDP fields
//!
//! A [`MediaSection`] starts at an `m=` line and runs until the next `m=` line or
//! the end of the document (RFC 8866 Section 5.14).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::attribute::{Attribute, MediaDirection, Rtpmap};
use crate::types::attribute_list::AttributeList;
use crate::types::session::{Bandwidth, Connection};

/// Media type of an m= line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MediaType {
    Audio,
    Video,
    Text,
    Application,
    Message,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Audio => "audio",
            MediaType::Video => "video",
            MediaType::Text => "text",
            MediaType::Application => "application",
            MediaType::Message => "message",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "audio" => Ok(MediaType::Audio),
            "video" => Ok(MediaType::Video),
            "text" => Ok(MediaType::Text),
            "application" => Ok(MediaType::Application),
            "message" => Ok(MediaType::Message),
            _ => Err(Error::InvalidArgument(format!("Invalid media type: {}", s))),
        }
    }
}

/// Transport protocol token of an m= line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    RtpAvp,
    RtpSavp,
    RtpAvpf,
    RtpSavpf,
    UdpTlsRtpSavp,
    UdpTlsRtpSavpf,
    TcpTlsRtpSavp,
    TcpTlsRtpSavpf,
    DtlsSctp,
    UdpDtlsSctp,
    TcpDtlsSctp,
    Other(String),
}

impl Protocol {
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::RtpAvp => "RTP/AVP",
            Protocol::RtpSavp => "RTP/SAVP",
            Protocol::RtpAvpf => "RTP/AVPF",
            Protocol::RtpSavpf => "RTP/SAVPF",
            Protocol::UdpTlsRtpSavp => "UDP/TLS/RTP/SAVP",
            Protocol::UdpTlsRtpSavpf => "UDP/TLS/RTP/SAVPF",
            Protocol::TcpTlsRtpSavp => "TCP/TLS/RTP/SAVP",
            Protocol::TcpTlsRtpSavpf => "TCP/TLS/RTP/SAVPF",
            Protocol::DtlsSctp => "DTLS/SCTP",
            Protocol::UdpDtlsSctp => "UDP/DTLS/SCTP",
            Protocol::TcpDtlsSctp => "TCP/DTLS/SCTP",
            Protocol::Other(token) => token,
        }
    }

    /// Whether media on this protocol is carried over RTP (and so has RTCP)
    pub fn is_rtp(&self) -> bool {
        match self {
            Protocol::DtlsSctp | Protocol::UdpDtlsSctp | Protocol::TcpDtlsSctp => false,
            Protocol::Other(token) => token.contains("RTP"),
            _ => true,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Protocol {
    fn from(token: &str) -> Self {
        match token {
            "RTP/AVP" => Protocol::RtpAvp,
            "RTP/SAVP" => Protocol::RtpSavp,
            "RTP/AVPF" => Protocol::RtpAvpf,
            "RTP/SAVPF" => Protocol::RtpSavpf,
            "UDP/TLS/RTP/SAVP" => Protocol::UdpTlsRtpSavp,
            "UDP/TLS/RTP/SAVPF" => Protocol::UdpTlsRtpSavpf,
            "TCP/TLS/RTP/SAVP" => Protocol::TcpTlsRtpSavp,
            "TCP/TLS/RTP/SAVPF" => Protocol::TcpTlsRtpSavpf,
            "DTLS/SCTP" => Protocol::DtlsSctp,
            "UDP/DTLS/SCTP" => Protocol::UdpDtlsSctp,
            "TCP/DTLS/SCTP" => Protocol::TcpDtlsSctp,
            other => Protocol::Other(other.to_string()),
        }
    }
}

/// One m= block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSection {
    pub media_type: MediaType,
    pub port: u16,
    pub port_count: Option<u16>,
    pub protocol: Protocol,
    /// Format tokens in preference order (payload types for RTP)
    pub formats: Vec<String>,
    pub information: Option<String>,
    pub connection: Option<Connection>,
    pub bandwidths: Vec<Bandwidth>,
    pub attributes: AttributeList,
}

impl MediaSection {
    pub fn new(media_type: MediaType, port: u16, protocol: Protocol) -> Self {
        MediaSection {
            media_type,
            port,
            port_count: None,
            protocol,
            formats: Vec::new(),
            information: None,
            connection: None,
            bandwidths: Vec::new(),
            attributes: AttributeList::new(),
        }
    }

    /// Append a codec: the payload type goes into the format list and an rtpmap is added
    pub fn add_codec(&mut self, payload_type: u8, name: impl Into<String>, clock_rate: u32, channels: u16) {
        self.formats.push(payload_type.to_string());
        self.attributes.set_attribute(Attribute::Rtpmap(Rtpmap {
            payload_type,
            encoding_name: name.into(),
            clock_rate,
            channels: channels.max(1),
        }));
    }

    pub fn has_format(&self, token: &str) -> bool {
        self.formats.iter().any(|f| f == token)
    }

    /// Direction attribute, sendrecv when absent
    pub fn direction(&self) -> MediaDirection {
        self.attributes.direction().unwrap_or(MediaDirection::SendRecv)
    }

    pub fn set_direction(&mut self, direction: MediaDirection) {
        self.attributes.set_attribute(Attribute::Direction(direction));
    }

    /// A port of zero marks a rejected or disabled section
    pub fn is_rejected(&self) -> bool {
        self.port == 0
    }

    pub fn mid(&self) -> Option<&str> {
        self.attributes.mid()
    }
}

impl fmt::Display for MediaSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m={} {}", self.media_type, self.port)?;
        if let Some(count) = self.port_count {
            write!(f, "/{}", count)?;
        }
        write!(f, " {}", self.protocol)?;
        for format in &self.formats {
            write!(f, " {}", format)?;
        }
        write!(f, "\r\n")?;

        if let Some(information) = &self.information {
            write!(f, "i={}\r\n", information)?;
        }
        if let Some(connection) = &self.connection {
            write!(f, "c={}\r\n", connection)?;
        }
        for bandwidth in &self.bandwidths {
            write!(f, "b={}\r\n", bandwidth)?;
        }
        write!(f, "{}", self.attributes)
    }
}
