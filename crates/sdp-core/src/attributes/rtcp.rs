//! SDP RTCP Attribute Parsers
//!
//! - a=rtcp:<port> [<nettype> <addrtype> <connection-address>] (RFC 3605)
//! - a=rtcp-fb:<payload type|*> <feedback type> [<parameter>] (RFC 4585)

use crate::attributes::common::is_token_char;
use crate::error::{Error, Result};
use crate::parser::session_parser::parse_connection_line;
use crate::types::attribute::{RtcpAttribute, RtcpFb};

/// Parses an rtcp value
pub fn parse_rtcp(value: &str) -> Result<RtcpAttribute> {
    let value = value.trim();
    let (port, address) = match value.split_once(' ') {
        Some((port, address)) => (port, Some(address.trim())),
        None => (value, None),
    };

    let port = port
        .parse::<u16>()
        .map_err(|_| Error::Attribute(format!("Invalid port in rtcp: {}", value)))?;
    let connection = address.map(parse_connection_line).transpose()?;

    Ok(RtcpAttribute { port, connection })
}

/// Parses an rtcp-fb value
pub fn parse_rtcp_fb(value: &str) -> Result<RtcpFb> {
    let value = value.trim();
    let mut parts = value.splitn(3, ' ');

    let payload_type = parts.next().unwrap_or_default();
    if payload_type != "*" && payload_type.parse::<u8>().map_or(true, |pt| pt > 127) {
        return Err(Error::Attribute(format!("Invalid payload type in rtcp-fb: {}", value)));
    }

    let feedback_type = parts.next().unwrap_or_default();
    if feedback_type.is_empty() || !feedback_type.chars().all(is_token_char) {
        return Err(Error::Attribute(format!("Invalid feedback type in rtcp-fb: {}", value)));
    }

    let parameter = parts.next().map(str::trim).filter(|p| !p.is_empty());

    Ok(RtcpFb::new(payload_type, feedback_type, parameter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::session::AddressType;

    #[test]
    fn test_parse_rtcp() {
        let rtcp = parse_rtcp("9 IN IP4 0.0.0.0").unwrap();
        assert_eq!(rtcp.port, 9);
        let connection = rtcp.connection.unwrap();
        assert_eq!(connection.address_type, AddressType::IP4);
        assert_eq!(connection.address, "0.0.0.0");

        assert_eq!(parse_rtcp("53020").unwrap().connection, None);
        assert!(parse_rtcp("port").is_err());
    }

    #[test]
    fn test_parse_rtcp_fb() {
        let fb = parse_rtcp_fb("120 nack pli").unwrap();
        assert_eq!(fb.payload_type, "120");
        assert_eq!(fb.feedback_type, "nack");
        assert_eq!(fb.parameter.as_deref(), Some("pli"));
        assert_eq!(fb.feedback(), "nack pli");

        let fb = parse_rtcp_fb("* ccm fir").unwrap();
        assert_eq!(fb.payload_type, "*");

        assert!(parse_rtcp_fb("200 nack").is_err());
        assert!(parse_rtcp_fb("96").is_err());
    }
}
