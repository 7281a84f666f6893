//! Address validation for origin and connection lines

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::types::session::AddressType;

/// Helper function to check if a string is a valid hostname
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > 255 {
        return false;
    }

    hostname.split('.').all(|label| {
        // Each DNS label must be between 1 and 63 characters long
        !label.is_empty()
            && label.len() <= 63
            && label.starts_with(|c: char| c.is_ascii_alphanumeric())
            && label.ends_with(|c: char| c.is_ascii_alphanumeric())
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Whether `address` is a literal of `address_type` or a fully qualified domain name
pub fn is_valid_address(address: &str, address_type: AddressType) -> bool {
    match address_type {
        AddressType::IP4 => address.parse::<Ipv4Addr>().is_ok() || is_valid_hostname(address),
        AddressType::IP6 => {
            let literal = address
                .strip_prefix('[')
                .and_then(|a| a.strip_suffix(']'))
                .unwrap_or(address);
            literal.parse::<Ipv6Addr>().is_ok() || is_valid_hostname(address)
        }
    }
}
