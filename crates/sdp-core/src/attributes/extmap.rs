//! SDP ExtMap Attribute Parser
//!
//! Implements parser for RTP header extension map attributes as defined in RFC 8285.
//! Format: a=extmap:<id>[/<direction>] <uri> [<extension attributes>]

use nom::{
    character::complete::{char, space1},
    combinator::{map, map_res, opt, rest, verify},
    sequence::{preceded, tuple},
    IResult,
};

use crate::attributes::common::{complete, non_ws, positive_integer, token};
use crate::error::Result;
use crate::types::attribute::{Extmap, MediaDirection};

/// Extension ID: 1-14 for one-byte headers, up to 255 with two-byte headers
fn extension_id(input: &str) -> IResult<&str, u16> {
    map(verify(positive_integer, |id| (1..=255).contains(id)), |id| id as u16)(input)
}

fn direction(input: &str) -> IResult<&str, MediaDirection> {
    map_res(token, |s: &str| s.parse::<MediaDirection>())(input)
}

fn extmap_parser(input: &str) -> IResult<&str, Extmap> {
    map(
        tuple((
            extension_id,
            opt(preceded(char('/'), direction)),
            preceded(space1, non_ws),
            opt(preceded(space1, rest)),
        )),
        |(id, direction, uri, attrs): (u16, Option<MediaDirection>, &str, Option<&str>)| Extmap {
            id,
            direction,
            uri: uri.to_string(),
            extension_attributes: attrs.map(str::trim).filter(|a| !a.is_empty()).map(str::to_string),
        },
    )(input)
}

/// Parses an extmap value
pub fn parse_extmap(value: &str) -> Result<Extmap> {
    complete(extmap_parser, value, "extmap")
}
