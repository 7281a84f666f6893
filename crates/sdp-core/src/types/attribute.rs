//! Typed SDP attributes
//!
//! Every attribute the stack understands is a variant of [`Attribute`]; its
//! [`AttributeKind`] decides cardinality, where the attribute may appear and
//! the canonical position in serialized output. Anything else is kept as
//! [`Attribute::Other`] so documents survive a parse/serialize round trip.
//!
//! # RFC References
//!
//! - [RFC 8866](https://datatracker.ietf.org/doc/html/rfc8866): SDP
//! - [RFC 8839](https://datatracker.ietf.org/doc/html/rfc8839): ICE SDP attributes
//! - [RFC 8122](https://datatracker.ietf.org/doc/html/rfc8122): fingerprint and setup
//! - [RFC 8285](https://datatracker.ietf.org/doc/html/rfc8285): extmap
//! - [RFC 8830](https://datatracker.ietf.org/doc/html/rfc8830): msid

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::session::Connection;

/// Attribute kinds, declared in canonical serialization order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeKind {
    Group,
    MsidSemantic,
    IceLite,
    IceOptions,
    IceUfrag,
    IcePwd,
    IceMismatch,
    Fingerprint,
    Setup,
    Identity,
    Mid,
    BundleOnly,
    Extmap,
    Direction,
    Msid,
    Rtcp,
    RtcpMux,
    RtcpRsize,
    Rtpmap,
    Fmtp,
    RtcpFb,
    Ptime,
    MaxPtime,
    Sctpmap,
    Ssrc,
    SsrcGroup,
    Label,
    Candidate,
    EndOfCandidates,
    Other,
}

impl AttributeKind {
    /// Map an attribute name to its kind; `None` for names we do not type
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "group" => AttributeKind::Group,
            "msid-semantic" => AttributeKind::MsidSemantic,
            "ice-lite" => AttributeKind::IceLite,
            "ice-options" => AttributeKind::IceOptions,
            "ice-ufrag" => AttributeKind::IceUfrag,
            "ice-pwd" => AttributeKind::IcePwd,
            "ice-mismatch" => AttributeKind::IceMismatch,
            "fingerprint" => AttributeKind::Fingerprint,
            "setup" => AttributeKind::Setup,
            "identity" => AttributeKind::Identity,
            "mid" => AttributeKind::Mid,
            "bundle-only" => AttributeKind::BundleOnly,
            "extmap" => AttributeKind::Extmap,
            "sendrecv" | "sendonly" | "recvonly" | "inactive" => AttributeKind::Direction,
            "msid" => AttributeKind::Msid,
            "rtcp" => AttributeKind::Rtcp,
            "rtcp-mux" => AttributeKind::RtcpMux,
            "rtcp-rsize" => AttributeKind::RtcpRsize,
            "rtpmap" => AttributeKind::Rtpmap,
            "fmtp" => AttributeKind::Fmtp,
            "rtcp-fb" => AttributeKind::RtcpFb,
            "ptime" => AttributeKind::Ptime,
            "maxptime" => AttributeKind::MaxPtime,
            "sctpmap" => AttributeKind::Sctpmap,
            "ssrc" => AttributeKind::Ssrc,
            "ssrc-group" => AttributeKind::SsrcGroup,
            "label" => AttributeKind::Label,
            "candidate" => AttributeKind::Candidate,
            "end-of-candidates" => AttributeKind::EndOfCandidates,
            _ => return None,
        };
        Some(kind)
    }

    /// Repeatable kinds keep every value; singletons keep only the last one set
    pub fn is_repeatable(&self) -> bool {
        matches!(
            self,
            AttributeKind::Group
                | AttributeKind::MsidSemantic
                | AttributeKind::Fingerprint
                | AttributeKind::Extmap
                | AttributeKind::Msid
                | AttributeKind::Rtpmap
                | AttributeKind::Fmtp
                | AttributeKind::RtcpFb
                | AttributeKind::Sctpmap
                | AttributeKind::Ssrc
                | AttributeKind::SsrcGroup
                | AttributeKind::Candidate
                | AttributeKind::Other
        )
    }

    pub fn allowed_at_session_level(&self) -> bool {
        matches!(
            self,
            AttributeKind::Group
                | AttributeKind::MsidSemantic
                | AttributeKind::IceLite
                | AttributeKind::IceOptions
                | AttributeKind::IceUfrag
                | AttributeKind::IcePwd
                | AttributeKind::Fingerprint
                | AttributeKind::Setup
                | AttributeKind::Identity
                | AttributeKind::Extmap
                | AttributeKind::Direction
                | AttributeKind::EndOfCandidates
                | AttributeKind::Other
        )
    }

    pub fn allowed_at_media_level(&self) -> bool {
        !matches!(
            self,
            AttributeKind::Group | AttributeKind::MsidSemantic | AttributeKind::IceLite | AttributeKind::Identity
        )
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::Group => "group",
            AttributeKind::MsidSemantic => "msid-semantic",
            AttributeKind::IceLite => "ice-lite",
            AttributeKind::IceOptions => "ice-options",
            AttributeKind::IceUfrag => "ice-ufrag",
            AttributeKind::IcePwd => "ice-pwd",
            AttributeKind::IceMismatch => "ice-mismatch",
            AttributeKind::Fingerprint => "fingerprint",
            AttributeKind::Setup => "setup",
            AttributeKind::Identity => "identity",
            AttributeKind::Mid => "mid",
            AttributeKind::BundleOnly => "bundle-only",
            AttributeKind::Extmap => "extmap",
            AttributeKind::Direction => "direction",
            AttributeKind::Msid => "msid",
            AttributeKind::Rtcp => "rtcp",
            AttributeKind::RtcpMux => "rtcp-mux",
            AttributeKind::RtcpRsize => "rtcp-rsize",
            AttributeKind::Rtpmap => "rtpmap",
            AttributeKind::Fmtp => "fmtp",
            AttributeKind::RtcpFb => "rtcp-fb",
            AttributeKind::Ptime => "ptime",
            AttributeKind::MaxPtime => "maxptime",
            AttributeKind::Sctpmap => "sctpmap",
            AttributeKind::Ssrc => "ssrc",
            AttributeKind::SsrcGroup => "ssrc-group",
            AttributeKind::Label => "label",
            AttributeKind::Candidate => "candidate",
            AttributeKind::EndOfCandidates => "end-of-candidates",
            AttributeKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Media direction (RFC 8866 Section 6.7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaDirection {
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

impl MediaDirection {
    pub fn from_flags(send: bool, recv: bool) -> Self {
        match (send, recv) {
            (true, true) => MediaDirection::SendRecv,
            (true, false) => MediaDirection::SendOnly,
            (false, true) => MediaDirection::RecvOnly,
            (false, false) => MediaDirection::Inactive,
        }
    }

    pub fn sends(&self) -> bool {
        matches!(self, MediaDirection::SendRecv | MediaDirection::SendOnly)
    }

    pub fn receives(&self) -> bool {
        matches!(self, MediaDirection::SendRecv | MediaDirection::RecvOnly)
    }

    /// The direction as seen from the other side of the session
    pub fn reverse(&self) -> Self {
        MediaDirection::from_flags(self.receives(), self.sends())
    }

    /// Intersection of two capabilities
    pub fn and(&self, other: MediaDirection) -> Self {
        MediaDirection::from_flags(self.sends() && other.sends(), self.receives() && other.receives())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaDirection::SendRecv => "sendrecv",
            MediaDirection::SendOnly => "sendonly",
            MediaDirection::RecvOnly => "recvonly",
            MediaDirection::Inactive => "inactive",
        }
    }
}

impl fmt::Display for MediaDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sendrecv" => Ok(MediaDirection::SendRecv),
            "sendonly" => Ok(MediaDirection::SendOnly),
            "recvonly" => Ok(MediaDirection::RecvOnly),
            "inactive" => Ok(MediaDirection::Inactive),
            other => Err(Error::Attribute(format!("Invalid direction: {}", other))),
        }
    }
}

/// DTLS setup role (RFC 4145, RFC 8122)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetupRole {
    Active,
    Passive,
    Actpass,
    Holdconn,
}

impl fmt::Display for SetupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self {
            SetupRole::Active => "active",
            SetupRole::Passive => "passive",
            SetupRole::Actpass => "actpass",
            SetupRole::Holdconn => "holdconn",
        };
        f.write_str(role)
    }
}

impl FromStr for SetupRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(SetupRole::Active),
            "passive" => Ok(SetupRole::Passive),
            "actpass" => Ok(SetupRole::Actpass),
            "holdconn" => Ok(SetupRole::Holdconn),
            _ => Err(Error::Attribute(format!("Invalid setup role: {}", s))),
        }
    }
}

/// Hash function of a certificate fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Md5,
    Md2,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashAlgorithm::Sha1 => "sha-1",
            HashAlgorithm::Sha224 => "sha-224",
            HashAlgorithm::Sha256 => "sha-256",
            HashAlgorithm::Sha384 => "sha-384",
            HashAlgorithm::Sha512 => "sha-512",
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Md2 => "md2",
        };
        f.write_str(name)
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha-1" => Ok(HashAlgorithm::Sha1),
            "sha-224" => Ok(HashAlgorithm::Sha224),
            "sha-256" => Ok(HashAlgorithm::Sha256),
            "sha-384" => Ok(HashAlgorithm::Sha384),
            "sha-512" => Ok(HashAlgorithm::Sha512),
            "md5" => Ok(HashAlgorithm::Md5),
            "md2" => Ok(HashAlgorithm::Md2),
            _ => Err(Error::Attribute(format!("Unsupported fingerprint hash function: {}", s))),
        }
    }
}

/// `a=fingerprint:<hash-func> <digest>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub hash: HashAlgorithm,
    pub digest: Vec<u8>,
}

impl Fingerprint {
    pub fn new(hash: HashAlgorithm, digest: Vec<u8>) -> Self {
        Fingerprint { hash, digest }
    }

    /// Uppercase, colon-separated hex
    pub fn digest_hex(&self) -> String {
        self.digest
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// `a=rtpmap:<payload type> <encoding name>/<clock rate>[/<channels>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rtpmap {
    pub payload_type: u8,
    pub encoding_name: String,
    pub clock_rate: u32,
    /// Defaults to 1 when the line does not carry a channel count
    pub channels: u16,
}

/// `a=fmtp:<format> <format specific parameters>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fmtp {
    pub format: String,
    pub parameters: String,
}

impl Fmtp {
    /// Look up a `key=value` parameter (keys compared case-insensitively)
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }
}

/// `a=extmap:<id>[/<direction>] <uri> [<extension attributes>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extmap {
    pub id: u16,
    pub direction: Option<MediaDirection>,
    pub uri: String,
    pub extension_attributes: Option<String>,
}

/// `a=group:<semantics> <tag>*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub semantics: String,
    pub tags: Vec<String>,
}

/// `a=msid:<identifier> [<appdata>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msid {
    pub identifier: String,
    pub appdata: Option<String>,
}

/// `a=msid-semantic:<semantic> <msid>*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsidSemantic {
    pub semantic: String,
    pub msids: Vec<String>,
}

/// `a=rtcp:<port> [IN <addrtype> <address>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtcpAttribute {
    pub port: u16,
    pub connection: Option<Connection>,
}

/// `a=rtcp-fb:<payload type|*> <type> [<parameter>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtcpFb {
    pub payload_type: String,
    pub feedback_type: String,
    pub parameter: Option<String>,
}

impl RtcpFb {
    pub fn new(payload_type: impl Into<String>, feedback_type: impl Into<String>, parameter: Option<&str>) -> Self {
        RtcpFb {
            payload_type: payload_type.into(),
            feedback_type: feedback_type.into(),
            parameter: parameter.map(str::to_string),
        }
    }

    /// `nack`, `nack pli`, `ccm fir` style form without the payload type
    pub fn feedback(&self) -> String {
        match &self.parameter {
            Some(parameter) => format!("{} {}", self.feedback_type, parameter),
            None => self.feedback_type.clone(),
        }
    }

    /// Whether the feedback applies to `payload_type` (`*` matches every format)
    pub fn applies_to(&self, payload_type: &str) -> bool {
        self.payload_type == "*" || self.payload_type == payload_type
    }
}

/// `a=sctpmap:<port> <protocol> [<streams>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sctpmap {
    pub port: u16,
    pub protocol: String,
    pub streams: Option<u32>,
}

/// `a=ssrc:<ssrc-id> <attribute>[:<value>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ssrc {
    pub ssrc: u32,
    pub attribute: String,
    pub value: Option<String>,
}

/// `a=ssrc-group:<semantics> <ssrc-id>*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsrcGroup {
    pub semantics: String,
    pub ssrcs: Vec<u32>,
}

/// A typed SDP attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
    Group(Group),
    MsidSemantic(MsidSemantic),
    IceLite,
    IceOptions(Vec<String>),
    IceUfrag(String),
    IcePwd(String),
    IceMismatch,
    Fingerprint(Fingerprint),
    Setup(SetupRole),
    Identity(String),
    Mid(String),
    BundleOnly,
    Extmap(Extmap),
    Direction(MediaDirection),
    Msid(Msid),
    Rtcp(RtcpAttribute),
    RtcpMux,
    RtcpRsize,
    Rtpmap(Rtpmap),
    Fmtp(Fmtp),
    RtcpFb(RtcpFb),
    Ptime(u32),
    MaxPtime(u32),
    Sctpmap(Sctpmap),
    Ssrc(Ssrc),
    SsrcGroup(SsrcGroup),
    Label(String),
    /// Candidate text after `candidate:`, kept opaque
    Candidate(String),
    EndOfCandidates,
    /// Unknown attribute preserved verbatim
    Other { name: String, value: Option<String> },
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::Group(_) => AttributeKind::Group,
            Attribute::MsidSemantic(_) => AttributeKind::MsidSemantic,
            Attribute::IceLite => AttributeKind::IceLite,
            Attribute::IceOptions(_) => AttributeKind::IceOptions,
            Attribute::IceUfrag(_) => AttributeKind::IceUfrag,
            Attribute::IcePwd(_) => AttributeKind::IcePwd,
            Attribute::IceMismatch => AttributeKind::IceMismatch,
            Attribute::Fingerprint(_) => AttributeKind::Fingerprint,
            Attribute::Setup(_) => AttributeKind::Setup,
            Attribute::Identity(_) => AttributeKind::Identity,
            Attribute::Mid(_) => AttributeKind::Mid,
            Attribute::BundleOnly => AttributeKind::BundleOnly,
            Attribute::Extmap(_) => AttributeKind::Extmap,
            Attribute::Direction(_) => AttributeKind::Direction,
            Attribute::Msid(_) => AttributeKind::Msid,
            Attribute::Rtcp(_) => AttributeKind::Rtcp,
            Attribute::RtcpMux => AttributeKind::RtcpMux,
            Attribute::RtcpRsize => AttributeKind::RtcpRsize,
            Attribute::Rtpmap(_) => AttributeKind::Rtpmap,
            Attribute::Fmtp(_) => AttributeKind::Fmtp,
            Attribute::RtcpFb(_) => AttributeKind::RtcpFb,
            Attribute::Ptime(_) => AttributeKind::Ptime,
            Attribute::MaxPtime(_) => AttributeKind::MaxPtime,
            Attribute::Sctpmap(_) => AttributeKind::Sctpmap,
            Attribute::Ssrc(_) => AttributeKind::Ssrc,
            Attribute::SsrcGroup(_) => AttributeKind::SsrcGroup,
            Attribute::Label(_) => AttributeKind::Label,
            Attribute::Candidate(_) => AttributeKind::Candidate,
            Attribute::EndOfCandidates => AttributeKind::EndOfCandidates,
            Attribute::Other { .. } => AttributeKind::Other,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Group(group) => {
                write!(f, "a=group:{}", group.semantics)?;
                for tag in &group.tags {
                    write!(f, " {}", tag)?;
                }
                Ok(())
            }
            Attribute::MsidSemantic(semantic) => {
                write!(f, "a=msid-semantic:{}", semantic.semantic)?;
                for msid in &semantic.msids {
                    write!(f, " {}", msid)?;
                }
                Ok(())
            }
            Attribute::IceLite => write!(f, "a=ice-lite"),
            Attribute::IceOptions(options) => write!(f, "a=ice-options:{}", options.join(" ")),
            Attribute::IceUfrag(ufrag) => write!(f, "a=ice-ufrag:{}", ufrag),
            Attribute::IcePwd(pwd) => write!(f, "a=ice-pwd:{}", pwd),
            Attribute::IceMismatch => write!(f, "a=ice-mismatch"),
            Attribute::Fingerprint(fp) => write!(f, "a=fingerprint:{} {}", fp.hash, fp.digest_hex()),
            Attribute::Setup(role) => write!(f, "a=setup:{}", role),
            Attribute::Identity(identity) => write!(f, "a=identity:{}", identity),
            Attribute::Mid(mid) => write!(f, "a=mid:{}", mid),
            Attribute::BundleOnly => write!(f, "a=bundle-only"),
            Attribute::Extmap(extmap) => {
                write!(f, "a=extmap:{}", extmap.id)?;
                if let Some(direction) = extmap.direction {
                    write!(f, "/{}", direction)?;
                }
                write!(f, " {}", extmap.uri)?;
                if let Some(attrs) = &extmap.extension_attributes {
                    write!(f, " {}", attrs)?;
                }
                Ok(())
            }
            Attribute::Direction(direction) => write!(f, "a={}", direction),
            Attribute::Msid(msid) => {
                write!(f, "a=msid:{}", msid.identifier)?;
                if let Some(appdata) = &msid.appdata {
                    write!(f, " {}", appdata)?;
                }
                Ok(())
            }
            Attribute::Rtcp(rtcp) => {
                write!(f, "a=rtcp:{}", rtcp.port)?;
                if let Some(connection) = &rtcp.connection {
                    write!(f, " {}", connection)?;
                }
                Ok(())
            }
            Attribute::RtcpMux => write!(f, "a=rtcp-mux"),
            Attribute::RtcpRsize => write!(f, "a=rtcp-rsize"),
            Attribute::Rtpmap(rtpmap) => {
                write!(f, "a=rtpmap:{} {}/{}", rtpmap.payload_type, rtpmap.encoding_name, rtpmap.clock_rate)?;
                if rtpmap.channels != 1 {
                    write!(f, "/{}", rtpmap.channels)?;
                }
                Ok(())
            }
            Attribute::Fmtp(fmtp) => write!(f, "a=fmtp:{} {}", fmtp.format, fmtp.parameters),
            Attribute::RtcpFb(fb) => {
                write!(f, "a=rtcp-fb:{} {}", fb.payload_type, fb.feedback_type)?;
                if let Some(parameter) = &fb.parameter {
                    write!(f, " {}", parameter)?;
                }
                Ok(())
            }
            Attribute::Ptime(ptime) => write!(f, "a=ptime:{}", ptime),
            Attribute::MaxPtime(maxptime) => write!(f, "a=maxptime:{}", maxptime),
            Attribute::Sctpmap(sctpmap) => {
                write!(f, "a=sctpmap:{} {}", sctpmap.port, sctpmap.protocol)?;
                if let Some(streams) = sctpmap.streams {
                    write!(f, " {}", streams)?;
                }
                Ok(())
            }
            Attribute::Ssrc(ssrc) => {
                write!(f, "a=ssrc:{} {}", ssrc.ssrc, ssrc.attribute)?;
                if let Some(value) = &ssrc.value {
                    write!(f, ":{}", value)?;
                }
                Ok(())
            }
            Attribute::SsrcGroup(group) => {
                write!(f, "a=ssrc-group:{}", group.semantics)?;
                for ssrc in &group.ssrcs {
                    write!(f, " {}", ssrc)?;
                }
                Ok(())
            }
            Attribute::Label(label) => write!(f, "a=label:{}", label),
            Attribute::Candidate(candidate) => write!(f, "a=candidate:{}", candidate),
            Attribute::EndOfCandidates => write!(f, "a=end-of-candidates"),
            Attribute::Other { name, value: Some(value) } => write!(f, "a={}:{}", name, value),
            Attribute::Other { name, value: None } => write!(f, "a={}", name),
        }
    }
}
