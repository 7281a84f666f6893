//! Raw line splitting
//!
//! An SDP document is a sequence of `<letter>=<value>` lines (RFC 8866
//! Section 5). [`split_lines`] turns text into numbered [`SdpLine`]s and keeps
//! anything else aside as [`MalformedLine`]s; what a line means is decided by
//! the document parser.

use nom::{
    bytes::complete::{tag, take_until},
    character::complete::{char, digit1, not_line_ending, satisfy},
    IResult,
};

/// One raw `x=value` line with its 1-based position in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdpLine<'a> {
    pub number: usize,
    pub kind: char,
    pub value: &'a str,
}

/// A line that does not follow `<letter>=<value>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    pub number: usize,
    pub text: String,
}

/// Parse an SDP line into a key-value pair
///
/// SDP lines have the format `x=value` where x is a single lowercase letter.
/// Trailing CR/LF are not part of the value.
///
/// # Examples
///
/// ```
/// use jsep_sdp_core::parser::line_parser::parse_sdp_line;
///
/// let (_, (key, value)) = parse_sdp_line("a=rtpmap:96 VP8/90000").unwrap();
/// assert_eq!(key, 'a');
/// assert_eq!(value, "rtpmap:96 VP8/90000");
/// ```
pub fn parse_sdp_line(input: &str) -> IResult<&str, (char, &str)> {
    let (input, key) = satisfy(|c| c.is_ascii_lowercase())(input)?;
    let (input, _) = char('=')(input)?;
    let (input, value) = not_line_ending(input)?;

    // Handle different line endings (CRLF, LF)
    let input = input.trim_start_matches(['\r', '\n']);

    Ok((input, (key, value.trim_end())))
}

/// Split a document into raw lines
///
/// Blank lines are skipped. Lines that do not match the `x=value` grammar are
/// returned separately so the caller can report them.
pub fn split_lines(text: &str) -> (Vec<SdpLine<'_>>, Vec<MalformedLine>) {
    let mut lines = Vec::new();
    let mut malformed = Vec::new();

    for (index, raw) in text.split('\n').enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if raw.trim().is_empty() {
            continue;
        }
        match parse_sdp_line(raw) {
            Ok((_, (kind, value))) => lines.push(SdpLine {
                number: index + 1,
                kind,
                value,
            }),
            Err(_) => malformed.push(MalformedLine {
                number: index + 1,
                text: raw.to_string(),
            }),
        }
    }

    (lines, malformed)
}

/// Parse a bandwidth line (b=) value
///
/// Format: `b=<bwtype>:<bandwidth>`
///
/// # RFC References
///
/// - [RFC 8866 Section 5.8](https://datatracker.ietf.org/doc/html/rfc8866#section-5.8)
pub fn parse_bandwidth_line(input: &str) -> IResult<&str, (&str, u32)> {
    let (input, bw_type) = take_until(":")(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, bw_value) = digit1(input)?;

    bw_value
        .parse::<u32>()
        .map(|kbps| (input, (bw_type, kbps)))
        .map_err(|_| nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit)))
}
