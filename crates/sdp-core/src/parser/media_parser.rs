//! SDP media description parsing
//!
//! ```text
//! m=<media> <port>[/<number of ports>] <proto> [<fmt> ...]
//! ```
//!
//! The format list may be empty; rejected sections written by some stacks
//! carry none.

use crate::error::{Error, Result};
use crate::types::media::{MediaSection, MediaType, Protocol};

/// Parse the value of an m= line into an empty [`MediaSection`]
///
/// # Examples
///
/// ```
/// use jsep_sdp_core::parser::parse_media_line;
/// use jsep_sdp_core::types::{MediaType, Protocol};
///
/// let section = parse_media_line("audio 49170 RTP/AVP 0 8").unwrap();
/// assert_eq!(section.media_type, MediaType::Audio);
/// assert_eq!(section.port, 49170);
/// assert_eq!(section.protocol, Protocol::RtpAvp);
/// assert_eq!(section.formats, vec!["0", "8"]);
/// ```
pub fn parse_media_line(value: &str) -> Result<MediaSection> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(Error::Attribute(format!("Invalid media description format: {}", value)));
    }

    let media_type: MediaType = parts[0]
        .parse()
        .map_err(|_| Error::Attribute(format!("Invalid media type: {}", parts[0])))?;

    // Parse port and optional port count
    let (port, port_count) = match parts[1].split_once('/') {
        Some((port, count)) => (port, Some(count)),
        None => (parts[1], None),
    };
    let port = port
        .parse::<u16>()
        .map_err(|_| Error::Attribute(format!("Invalid port: {}", port)))?;
    let port_count = port_count
        .map(|count| {
            count
                .parse::<u16>()
                .ok()
                .filter(|c| *c > 0)
                .ok_or_else(|| Error::Attribute(format!("Invalid port count: {}", count)))
        })
        .transpose()?;

    let mut section = MediaSection::new(media_type, port, Protocol::from(parts[2]));
    section.port_count = port_count;
    section.formats = parts[3..].iter().map(|fmt| fmt.to_string()).collect();

    Ok(section)
}
