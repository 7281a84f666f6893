//! SDP ICE Attribute Parsers
//!
//! Implements parsers for the ICE attributes of RFC 8839.
//! - a=candidate:<foundation> <component-id> <transport> <priority> <conn-addr> <port> typ <cand-type> [raddr <raddr>] [rport <rport>] *(extensions)
//! - a=ice-ufrag / a=ice-pwd
//! - a=ice-options:<option tag>*
//!
//! Candidates stay opaque text: only the mandatory structure is checked so a
//! garbled line is reported, and the original text is handed on unchanged.

use crate::attributes::common::{is_ice_char, is_token_char};
use crate::error::{Error, Result};

/// Validates a candidate value and returns it trimmed
pub fn parse_candidate(value: &str) -> Result<String> {
    let value = value.trim();
    let parts: Vec<&str> = value.split_whitespace().collect();

    if parts.len() < 8 {
        return Err(Error::Attribute(format!(
            "Invalid candidate format, insufficient parts: {}",
            value
        )));
    }

    if parts[0].is_empty() || parts[0].len() > 32 || !parts[0].chars().all(is_ice_char) {
        return Err(Error::Attribute(format!("Invalid foundation in candidate: {}", parts[0])));
    }

    match parts[1].parse::<u32>() {
        Ok(id) if (1..=256).contains(&id) => {}
        _ => {
            return Err(Error::Attribute(format!(
                "Invalid component ID in candidate: {}",
                parts[1]
            )))
        }
    }

    if !parts[2].chars().all(is_token_char) {
        return Err(Error::Attribute(format!("Invalid transport in candidate: {}", parts[2])));
    }

    if parts[3].parse::<u32>().is_err() {
        return Err(Error::Attribute(format!("Invalid priority in candidate: {}", parts[3])));
    }

    if parts[5].parse::<u16>().is_err() {
        return Err(Error::Attribute(format!("Invalid port in candidate: {}", parts[5])));
    }

    if parts[6] != "typ" {
        return Err(Error::Attribute(format!(
            "Expected 'typ' keyword in candidate, found: {}",
            parts[6]
        )));
    }

    if !parts[7].chars().all(is_token_char) {
        return Err(Error::Attribute(format!("Invalid candidate type: {}", parts[7])));
    }

    Ok(value.to_string())
}

/// Validates an ice-ufrag (4-256 ice-chars) or ice-pwd (22-256 ice-chars)
pub fn parse_ice_credential(value: &str, min_len: usize) -> Result<String> {
    let value = value.trim();
    if value.len() < min_len || value.len() > 256 || !value.chars().all(is_ice_char) {
        return Err(Error::Attribute(format!("Invalid ICE credential: {}", value)));
    }
    Ok(value.to_string())
}

/// Parses a space separated ice-options list
pub fn parse_ice_options(value: &str) -> Result<Vec<String>> {
    let options: Vec<String> = value.split_whitespace().map(str::to_string).collect();
    if options.is_empty() || !options.iter().all(|o| o.chars().all(is_ice_char)) {
        return Err(Error::Attribute(format!("Invalid ice-options value: {}", value)));
    }
    Ok(options)
}
