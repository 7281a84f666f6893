//! SDP Grouping and Identification Attribute Parsers
//!
//! - a=group:<semantics> <identification-tag>* (RFC 5888)
//! - a=mid:<identification-tag> (RFC 5888)
//! - a=msid:<identifier> [<appdata>] (RFC 8830)
//! - a=msid-semantic:<semantic> <msid>*

use nom::{
    bytes::complete::take_while1,
    character::complete::{space0, space1},
    combinator::{map, opt},
    multi::separated_list0,
    sequence::{pair, preceded},
    IResult,
};

use crate::attributes::common::{complete, is_token_char, token};
use crate::error::{Error, Result};
use crate::types::attribute::{Group, Msid, MsidSemantic};

/// msid identifiers; browsers put braces around UUIDs, so any visible char is accepted
fn msid_id(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_graphic())(input)
}

fn tag_list(input: &str) -> IResult<&str, Vec<String>> {
    map(
        opt(preceded(space1, separated_list0(space1, token))),
        |tags: Option<Vec<&str>>| {
            tags.unwrap_or_default()
                .into_iter()
                .map(str::to_string)
                .collect()
        },
    )(input)
}

fn group_parser(input: &str) -> IResult<&str, Group> {
    map(pair(token, tag_list), |(semantics, tags)| Group {
        semantics: semantics.to_string(),
        tags,
    })(input)
}

/// Parses a group value; an empty tag list is legal (RFC 5888 Section 5)
pub fn parse_group(value: &str) -> Result<Group> {
    complete(group_parser, value, "group")
}

/// Parses a mid value
pub fn parse_mid(value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(is_token_char) {
        return Err(Error::Attribute(format!("Invalid mid value: {}", value)));
    }
    Ok(value.to_string())
}

fn msid_parser(input: &str) -> IResult<&str, Msid> {
    map(
        pair(msid_id, opt(preceded(space1, msid_id))),
        |(identifier, appdata): (&str, Option<&str>)| Msid {
            identifier: identifier.to_string(),
            appdata: appdata.map(str::to_string),
        },
    )(input)
}

/// Parses an msid value
pub fn parse_msid(value: &str) -> Result<Msid> {
    let msid = complete(msid_parser, value, "msid")?;
    if msid.identifier.len() > 64 || msid.appdata.as_ref().is_some_and(|a| a.len() > 64) {
        return Err(Error::Attribute(format!("msid identifier too long: {}", value)));
    }
    Ok(msid)
}

fn msid_semantic_parser(input: &str) -> IResult<&str, MsidSemantic> {
    map(
        pair(
            preceded(space0, token),
            opt(preceded(space1, separated_list0(space1, msid_id))),
        ),
        |(semantic, msids): (&str, Option<Vec<&str>>)| MsidSemantic {
            semantic: semantic.to_string(),
            msids: msids
                .unwrap_or_default()
                .into_iter()
                .map(str::to_string)
                .collect(),
        },
    )(input)
}

/// Parses an msid-semantic value (`WMS *`, `WMS stream-a stream-b`)
pub fn parse_msid_semantic(value: &str) -> Result<MsidSemantic> {
    complete(msid_semantic_parser, value, "msid-semantic")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group() {
        let group = parse_group("BUNDLE audio video").unwrap();
        assert_eq!(group.semantics, "BUNDLE");
        assert_eq!(group.tags, vec!["audio", "video"]);

        let empty = parse_group("BUNDLE").unwrap();
        assert!(empty.tags.is_empty());

        assert!(parse_group("").is_err());
    }

    #[test]
    fn test_parse_mid() {
        assert_eq!(parse_mid("sdparta_0").unwrap(), "sdparta_0");
        assert!(parse_mid("").is_err());
        assert!(parse_mid("a b").is_err());
    }

    #[test]
    fn test_parse_msid() {
        let msid = parse_msid("stream-1 track-1").unwrap();
        assert_eq!(msid.identifier, "stream-1");
        assert_eq!(msid.appdata.as_deref(), Some("track-1"));

        let msid = parse_msid("{5d3fa1c2-aa}").unwrap();
        assert_eq!(msid.appdata, None);

        assert!(parse_msid("a b c").is_err());
    }

    #[test]
    fn test_parse_msid_semantic() {
        let semantic = parse_msid_semantic("WMS *").unwrap();
        assert_eq!(semantic.semantic, "WMS");
        assert_eq!(semantic.msids, vec!["*"]);

        let semantic = parse_msid_semantic(" WMS").unwrap();
        assert!(semantic.msids.is_empty());
    }
}
