//! SDP DTLS Attribute Parsers
//!
//! Implements parsers for the DTLS-SRTP attributes of RFC 8122 and RFC 8842.
//! - a=fingerprint:<hash-function> <hex>:<hex>:...
//! - a=setup:<active|passive|actpass|holdconn>

use nom::{
    bytes::complete::take_while_m_n,
    character::complete::{char, space1},
    combinator::map_res,
    multi::separated_list1,
    sequence::separated_pair,
    IResult,
};

use crate::attributes::common::{complete, token};
use crate::error::{Error, Result};
use crate::types::attribute::{Fingerprint, HashAlgorithm, SetupRole};

/// One or two hex digits
fn hex_octet(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(1, 2, |c: char| c.is_ascii_hexdigit()), |hex: &str| {
        u8::from_str_radix(hex, 16)
    })(input)
}

fn fingerprint_parser(input: &str) -> IResult<&str, (&str, Vec<u8>)> {
    separated_pair(token, space1, separated_list1(char(':'), hex_octet))(input)
}

/// Parses a fingerprint value into the hash function and raw digest bytes
pub fn parse_fingerprint(value: &str) -> Result<Fingerprint> {
    let (hash, digest) = complete(fingerprint_parser, value, "fingerprint")?;
    let hash: HashAlgorithm = hash.parse()?;
    if digest.len() < 16 {
        return Err(Error::Attribute(format!(
            "Fingerprint digest too short ({} bytes): {}",
            digest.len(),
            value
        )));
    }
    Ok(Fingerprint::new(hash, digest))
}

/// Parses a setup value
pub fn parse_setup(value: &str) -> Result<SetupRole> {
    value.trim().parse()
}
