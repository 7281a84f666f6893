//! Common parsing utilities for SDP attributes
//!
//! Small nom parsers shared by several attribute grammars.

use nom::{
    bytes::complete::take_while1,
    character::complete::digit1,
    combinator::{all_consuming, map_res},
    IResult,
};

use crate::error::{Error, Result};

/// RFC 8866 token-char: any visible ASCII except the separators below
pub fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic()
        && !matches!(c, '"' | '(' | ')' | ',' | '/' | ':' | ';' | '<' | '=' | '>' | '?' | '@' | '[' | '\\' | ']' | '{' | '}')
}

/// Parses a token (RFC 8866 Section 9)
pub fn token(input: &str) -> IResult<&str, &str> {
    take_while1(is_token_char)(input)
}

/// Parses a non-whitespace run
pub fn non_ws(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_ascii_whitespace())(input)
}

/// Parses a positive integer
pub fn positive_integer(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>())(input)
}

/// ICE ufrag/pwd characters: ALPHA / DIGIT / "+" / "/"
pub fn is_ice_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/'
}

/// Run `parser` over the whole of `input`, turning any failure into an
/// attribute error mentioning `what`
pub fn complete<'a, T>(
    parser: impl FnMut(&'a str) -> IResult<&'a str, T>,
    input: &'a str,
    what: &str,
) -> Result<T> {
    match all_consuming(parser)(input.trim()) {
        Ok((_, value)) => Ok(value),
        Err(_) => Err(Error::Attribute(format!("Invalid {} value: {}", what, input))),
    }
}

/// Require that a value is present
pub fn require_value<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::Attribute(format!("Missing value for a={}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token() {
        assert_eq!(token("PCMU/8000"), Ok(("/8000", "PCMU")));
        assert!(token("/x").is_err());
    }

    #[test]
    fn test_complete_rejects_trailing_content() {
        assert_eq!(complete(positive_integer, " 20 ", "ptime").unwrap(), 20);
        assert!(complete(positive_integer, "20ms", "ptime").is_err());
    }
}
