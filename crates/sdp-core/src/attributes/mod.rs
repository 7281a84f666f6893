//! SDP Attribute Parsers
//!
//! Value grammars for every [`AttributeKind`] and the single dispatch that turns
//! an `a=<name>[:<value>]` pair into a typed [`Attribute`].

pub mod common;
pub mod dtls;
pub mod extmap;
pub mod grouping;
pub mod ice;
pub mod rtcp;
pub mod rtpmap;
pub mod stream;

pub use dtls::{parse_fingerprint, parse_setup};
pub use extmap::parse_extmap;
pub use grouping::{parse_group, parse_mid, parse_msid, parse_msid_semantic};
pub use ice::{parse_candidate, parse_ice_credential, parse_ice_options};
pub use rtcp::{parse_rtcp, parse_rtcp_fb};
pub use rtpmap::{parse_fmtp, parse_rtpmap};
pub use stream::{parse_packet_time, parse_sctpmap, parse_ssrc, parse_ssrc_group};

use crate::attributes::common::require_value;
use crate::error::{Error, Result};
use crate::types::attribute::{Attribute, AttributeKind};

/// Type an attribute; names with no typed grammar come back as [`Attribute::Other`]
pub fn parse_attribute(name: &str, value: Option<&str>) -> Result<Attribute> {
    let Some(kind) = AttributeKind::from_name(name) else {
        return Ok(Attribute::Other {
            name: name.to_string(),
            value: value.map(str::to_string),
        });
    };

    let flag = |attribute: Attribute| match value {
        Some(v) if !v.trim().is_empty() => Err(Error::Attribute(format!("a={} takes no value", name))),
        _ => Ok(attribute),
    };

    match kind {
        AttributeKind::Group => Ok(Attribute::Group(parse_group(require_value(value, name)?)?)),
        AttributeKind::MsidSemantic => Ok(Attribute::MsidSemantic(parse_msid_semantic(require_value(value, name)?)?)),
        AttributeKind::IceLite => flag(Attribute::IceLite),
        AttributeKind::IceOptions => Ok(Attribute::IceOptions(parse_ice_options(require_value(value, name)?)?)),
        AttributeKind::IceUfrag => Ok(Attribute::IceUfrag(parse_ice_credential(require_value(value, name)?, 4)?)),
        AttributeKind::IcePwd => Ok(Attribute::IcePwd(parse_ice_credential(require_value(value, name)?, 22)?)),
        AttributeKind::IceMismatch => flag(Attribute::IceMismatch),
        AttributeKind::Fingerprint => Ok(Attribute::Fingerprint(parse_fingerprint(require_value(value, name)?)?)),
        AttributeKind::Setup => Ok(Attribute::Setup(parse_setup(require_value(value, name)?)?)),
        AttributeKind::Identity => Ok(Attribute::Identity(require_value(value, name)?.trim().to_string())),
        AttributeKind::Mid => Ok(Attribute::Mid(parse_mid(require_value(value, name)?)?)),
        AttributeKind::BundleOnly => flag(Attribute::BundleOnly),
        AttributeKind::Extmap => Ok(Attribute::Extmap(parse_extmap(require_value(value, name)?)?)),
        AttributeKind::Direction => {
            let direction = name.to_ascii_lowercase().parse()?;
            flag(Attribute::Direction(direction))
        }
        AttributeKind::Msid => Ok(Attribute::Msid(parse_msid(require_value(value, name)?)?)),
        AttributeKind::Rtcp => Ok(Attribute::Rtcp(parse_rtcp(require_value(value, name)?)?)),
        AttributeKind::RtcpMux => flag(Attribute::RtcpMux),
        AttributeKind::RtcpRsize => flag(Attribute::RtcpRsize),
        AttributeKind::Rtpmap => Ok(Attribute::Rtpmap(parse_rtpmap(require_value(value, name)?)?)),
        AttributeKind::Fmtp => Ok(Attribute::Fmtp(parse_fmtp(require_value(value, name)?)?)),
        AttributeKind::RtcpFb => Ok(Attribute::RtcpFb(parse_rtcp_fb(require_value(value, name)?)?)),
        AttributeKind::Ptime => Ok(Attribute::Ptime(parse_packet_time(require_value(value, name)?, name)?)),
        AttributeKind::MaxPtime => Ok(Attribute::MaxPtime(parse_packet_time(require_value(value, name)?, name)?)),
        AttributeKind::Sctpmap => Ok(Attribute::Sctpmap(parse_sctpmap(require_value(value, name)?)?)),
        AttributeKind::Ssrc => Ok(Attribute::Ssrc(parse_ssrc(require_value(value, name)?)?)),
        AttributeKind::SsrcGroup => Ok(Attribute::SsrcGroup(parse_ssrc_group(require_value(value, name)?)?)),
        AttributeKind::Label => Ok(Attribute::Label(require_value(value, name)?.trim().to_string())),
        AttributeKind::Candidate => Ok(Attribute::Candidate(parse_candidate(require_value(value, name)?)?)),
        AttributeKind::EndOfCandidates => flag(Attribute::EndOfCandidates),
        AttributeKind::Other => Ok(Attribute::Other {
            name: name.to_string(),
            value: value.map(str::to_string),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::attribute::MediaDirection;

    #[test]
    fn test_dispatch_typed() {
        let attr = parse_attribute("rtpmap", Some("96 VP8/90000")).unwrap();
        assert_eq!(attr.kind(), AttributeKind::Rtpmap);

        let attr = parse_attribute("sendonly", None).unwrap();
        assert_eq!(attr, Attribute::Direction(MediaDirection::SendOnly));
    }

    #[test]
    fn test_dispatch_unknown_kept_opaque() {
        let attr = parse_attribute("x-google-flag", Some("conference")).unwrap();
        assert_eq!(
            attr,
            Attribute::Other {
                name: "x-google-flag".to_string(),
                value: Some("conference".to_string()),
            }
        );
    }

    #[test]
    fn test_dispatch_value_rules() {
        assert!(parse_attribute("rtcp-mux", Some("yes")).is_err());
        assert!(parse_attribute("mid", None).is_err());
        assert!(parse_attribute("setup", Some("sideways")).is_err());
    }
}
