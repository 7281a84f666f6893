//! SDP Stream Attribute Parsers
//!
//! - a=ssrc:<ssrc-id> <attribute>[:<value>] (RFC 5576)
//! - a=ssrc-group:<semantics> <ssrc-id>* (RFC 5576)
//! - a=sctpmap:<port> <protocol> [<streams>] (draft-ietf-mmusic-sctp-sdp-05)
//! - a=ptime / a=maxptime (RFC 8866)

use crate::attributes::common::{complete, positive_integer, is_token_char};
use crate::error::{Error, Result};
use crate::types::attribute::{Sctpmap, Ssrc, SsrcGroup};

/// Parses an ssrc value
pub fn parse_ssrc(value: &str) -> Result<Ssrc> {
    let value = value.trim();
    let (id, rest) = value
        .split_once(' ')
        .ok_or_else(|| Error::Attribute(format!("Invalid ssrc format: {}", value)))?;

    let ssrc = id
        .parse::<u32>()
        .map_err(|_| Error::Attribute(format!("Invalid ssrc id: {}", id)))?;

    let rest = rest.trim();
    let (attribute, attr_value) = match rest.split_once(':') {
        Some((attribute, attr_value)) => (attribute, Some(attr_value.to_string())),
        None => (rest, None),
    };
    if attribute.is_empty() || !attribute.chars().all(is_token_char) {
        return Err(Error::Attribute(format!("Invalid ssrc attribute: {}", value)));
    }

    Ok(Ssrc {
        ssrc,
        attribute: attribute.to_string(),
        value: attr_value,
    })
}

/// Parses an ssrc-group value
pub fn parse_ssrc_group(value: &str) -> Result<SsrcGroup> {
    let mut parts = value.split_whitespace();
    let semantics = parts
        .next()
        .filter(|s| s.chars().all(is_token_char))
        .ok_or_else(|| Error::Attribute(format!("Invalid ssrc-group format: {}", value)))?;

    let ssrcs = parts
        .map(|id| {
            id.parse::<u32>()
                .map_err(|_| Error::Attribute(format!("Invalid ssrc id in ssrc-group: {}", id)))
        })
        .collect::<Result<Vec<u32>>>()?;

    Ok(SsrcGroup {
        semantics: semantics.to_string(),
        ssrcs,
    })
}

/// Parses an sctpmap value
pub fn parse_sctpmap(value: &str) -> Result<Sctpmap> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(Error::Attribute(format!("Invalid sctpmap format: {}", value)));
    }

    let port = parts[0]
        .parse::<u16>()
        .map_err(|_| Error::Attribute(format!("Invalid port in sctpmap: {}", parts[0])))?;

    if !parts[1].chars().all(is_token_char) {
        return Err(Error::Attribute(format!("Invalid protocol in sctpmap: {}", parts[1])));
    }

    let streams = parts
        .get(2)
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| Error::Attribute(format!("Invalid stream count in sctpmap: {}", s)))
        })
        .transpose()?;

    Ok(Sctpmap {
        port,
        protocol: parts[1].to_string(),
        streams,
    })
}

/// Parses a ptime or maxptime value (milliseconds)
pub fn parse_packet_time(value: &str, name: &str) -> Result<u32> {
    let ptime = complete(positive_integer, value, name)?;
    if ptime == 0 {
        return Err(Error::Attribute(format!("Zero {} value", name)));
    }
    Ok(ptime)
}
