//! Session-level SDP line parsing
//!
//! This module handles parsing of session-level SDP elements according to RFC 8866:
//! - Origin (o=)
//! - Connection Data (c=), also used for the address part of `a=rtcp`
//! - Bandwidth (b=)
//! - Timing (t=)

use crate::error::{Error, Result};
use crate::parser::line_parser::parse_bandwidth_line;
use crate::parser::validation::is_valid_address;
use crate::types::session::{AddressType, Bandwidth, Connection, Origin, Timing, NETWORK_TYPE_INTERNET};

fn validate_network_type(net_type: &str) -> Result<()> {
    // RFC 8866 only defines "IN" for Internet
    if net_type != NETWORK_TYPE_INTERNET {
        return Err(Error::Attribute(format!("Invalid network type: {}", net_type)));
    }
    Ok(())
}

fn address_type(value: &str) -> Result<AddressType> {
    value
        .parse()
        .map_err(|_| Error::Attribute(format!("Invalid address type: {}", value)))
}

/// Parse an origin line (o=)
///
/// ```text
/// o=<username> <sess-id> <sess-version> <nettype> <addrtype> <unicast-address>
/// ```
///
/// Session id and version must fit in 64 bits.
pub fn parse_origin_line(value: &str) -> Result<Origin> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() != 6 {
        return Err(Error::Attribute(format!("Invalid origin line format: {}", value)));
    }

    let session_id = parts[1]
        .parse::<u64>()
        .map_err(|_| Error::Attribute(format!("Invalid session id: {}", parts[1])))?;
    let session_version = parts[2]
        .parse::<u64>()
        .map_err(|_| Error::Attribute(format!("Invalid session version: {}", parts[2])))?;

    validate_network_type(parts[3])?;
    let address_type = address_type(parts[4])?;

    if !is_valid_address(parts[5], address_type) {
        return Err(Error::Attribute(format!("Invalid address: {}", parts[5])));
    }

    Ok(Origin::new(parts[0], session_id, session_version, address_type, parts[5]))
}

/// Parse a connection line (c=)
///
/// ```text
/// c=<nettype> <addrtype> <connection-address>[/<ttl>][/<count>]
/// ```
///
/// A TTL is only meaningful for IPv4 multicast, so for IP6 a single suffix is
/// read as the address count.
pub fn parse_connection_line(value: &str) -> Result<Connection> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(Error::Attribute(format!("Invalid connection line format: {}", value)));
    }

    validate_network_type(parts[0])?;
    let address_type = address_type(parts[1])?;

    let mut addr_parts = parts[2].split('/');
    let base_addr = addr_parts.next().unwrap_or_default();
    if !is_valid_address(base_addr, address_type) {
        return Err(Error::Attribute(format!("Invalid address: {}", base_addr)));
    }

    let suffixes: Vec<&str> = addr_parts.collect();
    let mut connection = Connection::new(address_type, base_addr);

    let parse_ttl = |s: &str| {
        s.parse::<u8>()
            .map_err(|_| Error::Attribute(format!("Invalid TTL: {}", s)))
    };
    let parse_count = |s: &str| {
        s.parse::<u32>()
            .map_err(|_| Error::Attribute(format!("Invalid multicast count: {}", s)))
    };

    match (address_type, suffixes.as_slice()) {
        (_, []) => {}
        (AddressType::IP4, [ttl]) => connection.ttl = Some(parse_ttl(ttl)?),
        (AddressType::IP4, [ttl, count]) => {
            connection.ttl = Some(parse_ttl(ttl)?);
            connection.count = Some(parse_count(count)?);
        }
        (AddressType::IP6, [count]) => connection.count = Some(parse_count(count)?),
        _ => {
            return Err(Error::Attribute(format!("Invalid connection address: {}", parts[2])));
        }
    }

    Ok(connection)
}

/// Parse a bandwidth line (b=)
pub fn parse_bandwidth(value: &str) -> Result<Bandwidth> {
    let (rest, (bw_type, bw_value)) = parse_bandwidth_line(value.trim())?;
    if !rest.is_empty() || bw_type.is_empty() {
        return Err(Error::Attribute(format!("Invalid bandwidth line: {}", value)));
    }
    Ok(Bandwidth::new(bw_type, bw_value))
}

/// Parse a timing line (t=)
pub fn parse_timing_line(value: &str) -> Result<Timing> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(Error::Attribute(format!("Invalid timing line format: {}", value)));
    }

    let start = parts[0]
        .parse::<u64>()
        .map_err(|_| Error::Attribute(format!("Invalid start time: {}", parts[0])))?;
    let stop = parts[1]
        .parse::<u64>()
        .map_err(|_| Error::Attribute(format!("Invalid stop time: {}", parts[1])))?;

    if stop != 0 && stop < start {
        return Err(Error::Attribute(format!("Stop time precedes start time: {}", value)));
    }

    Ok(Timing::new(start, stop))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origin_line() {
        let origin = parse_origin_line("jdoe 2890844526 2890842807 IN IP4 10.47.16.5").unwrap();
        assert_eq!(origin.username, "jdoe");
        assert_eq!(origin.session_id, 2890844526);
        assert_eq!(origin.session_version, 2890842807);
        assert_eq!(origin.address_type, AddressType::IP4);
        assert_eq!(origin.unicast_address, "10.47.16.5");

        let origin = parse_origin_line("- 4611686018427387903 0 IN IP6 2001:db8::1").unwrap();
        assert_eq!(origin.address_type, AddressType::IP6);

        assert!(parse_origin_line("- 1 1 IN IP4").is_err());
        assert!(parse_origin_line("- abc 1 IN IP4 1.2.3.4").is_err());
        assert!(parse_origin_line("- 1 1 ATM IP4 1.2.3.4").is_err());
        assert!(parse_origin_line("- 1 1 IN IP5 1.2.3.4").is_err());
    }

    #[test]
    fn test_parse_connection_line() {
        let conn = parse_connection_line("IN IP4 192.168.1.1").unwrap();
        assert_eq!(conn.address, "192.168.1.1");
        assert_eq!(conn.ttl, None);

        let conn = parse_connection_line("IN IP4 224.2.36.42/127/3").unwrap();
        assert_eq!(conn.address, "224.2.36.42");
        assert_eq!(conn.ttl, Some(127));
        assert_eq!(conn.count, Some(3));

        let conn = parse_connection_line("IN IP6 FF15::101/3").unwrap();
        assert_eq!(conn.ttl, None);
        assert_eq!(conn.count, Some(3));

        assert!(parse_connection_line("IN IP4").is_err());
        assert!(parse_connection_line("IN IP4 1.2.3.4/300").is_err());
        assert!(matches!(parse_connection_line("XX IP4 1.2.3.4"), Err(Error::Attribute(_))));
    }

    #[test]
    fn test_parse_bandwidth_and_timing() {
        let bw = parse_bandwidth("AS:256").unwrap();
        assert_eq!(bw.bw_type, "AS");
        assert_eq!(bw.value, 256);
        assert!(parse_bandwidth("AS:fast").is_err());

        let timing = parse_timing_line("0 0").unwrap();
        assert_eq!((timing.start, timing.stop), (0, 0));
        assert!(parse_timing_line("10 5").is_err());
        assert!(parse_timing_line("0").is_err());
    }
}
