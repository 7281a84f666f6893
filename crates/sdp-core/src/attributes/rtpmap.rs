//! SDP RTP Map and Format Parameter Attribute Parsers
//!
//! Implements parsers for rtpmap and fmtp attributes as defined in RFC 8866.
//! Formats:
//! - a=rtpmap:<payload type> <encoding name>/<clock rate>[/<encoding parameters>]
//! - a=fmtp:<format> <format specific parameters>

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space1},
    combinator::{map, map_res, opt, rest, verify},
    sequence::{preceded, separated_pair, tuple},
    IResult,
};

use crate::attributes::common::{complete, positive_integer, token};
use crate::error::{Error, Result};
use crate::types::attribute::{Fmtp, Rtpmap};

/// Payload type, 0-127 (RFC 3550 Section 5.1)
fn payload_type(input: &str) -> IResult<&str, u8> {
    map(verify(positive_integer, |pt| *pt <= 127), |pt| pt as u8)(input)
}

/// Encoding name: token chars minus '/'
fn encoding_name(input: &str) -> IResult<&str, &str> {
    token(input)
}

/// Channel count, bounded to u16
fn channel_count(input: &str) -> IResult<&str, u16> {
    map_res(positive_integer, u16::try_from)(input)
}

/// <encoding name>/<clock rate>[/<channels>]
fn encoding_parser(input: &str) -> IResult<&str, (&str, u32, Option<u16>)> {
    tuple((
        encoding_name,
        preceded(char('/'), positive_integer),
        opt(preceded(char('/'), channel_count)),
    ))(input)
}

fn rtpmap_parser(input: &str) -> IResult<&str, Rtpmap> {
    map(
        separated_pair(payload_type, space1, encoding_parser),
        |(payload_type, (name, clock_rate, channels))| Rtpmap {
            payload_type,
            encoding_name: name.to_string(),
            clock_rate,
            channels: channels.unwrap_or(1),
        },
    )(input)
}

/// Parses an rtpmap value; a missing channel count means one channel
pub fn parse_rtpmap(value: &str) -> Result<Rtpmap> {
    let rtpmap = complete(rtpmap_parser, value, "rtpmap")?;
    if rtpmap.clock_rate == 0 {
        return Err(Error::Attribute(format!("Zero clock rate in rtpmap: {}", value)));
    }
    if rtpmap.channels == 0 {
        return Err(Error::Attribute(format!("Zero channel count in rtpmap: {}", value)));
    }
    Ok(rtpmap)
}

fn fmtp_parser(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(
        take_while1(|c: char| !c.is_ascii_whitespace()),
        space1,
        rest,
    )(input)
}

/// Parses an fmtp value; the parameter string is kept verbatim
pub fn parse_fmtp(value: &str) -> Result<Fmtp> {
    let (format, parameters) = complete(fmtp_parser, value, "fmtp")?;
    if parameters.trim().is_empty() {
        return Err(Error::Attribute("Empty format parameters in fmtp".to_string()));
    }
    Ok(Fmtp {
        format: format.to_string(),
        parameters: parameters.trim().to_string(),
    })
}
