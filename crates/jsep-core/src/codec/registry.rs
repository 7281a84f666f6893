//! External codec registry
//!
//! Codecs flagged `requires_external` have no built-in implementation; an
//! encoder or decoder has to be provided by the embedding application. The
//! registry records which names are available, looked up case-insensitively.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::codec::description::CodecDescription;
use crate::error::{Error, Result};

/// Which halves of an external codec are available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExternalCodecSupport {
    pub encoder: bool,
    pub decoder: bool,
}

/// Name-keyed lookup of externally provided codec implementations
#[derive(Debug, Clone, Default)]
pub struct ExternalCodecRegistry {
    /// Keyed by lowercased codec name
    codecs: HashMap<String, ExternalCodecSupport>,
}

impl ExternalCodecRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an external encoder for `name`
    pub fn register_encoder(&mut self, name: &str) {
        self.codecs.entry(name.to_ascii_lowercase()).or_default().encoder = true;
        debug!("Registered external encoder: {}", name);
    }

    /// Register an external decoder for `name`
    pub fn register_decoder(&mut self, name: &str) {
        self.codecs.entry(name.to_ascii_lowercase()).or_default().decoder = true;
        debug!("Registered external decoder: {}", name);
    }

    /// Register both halves for `name`
    pub fn register(&mut self, name: &str) {
        self.register_encoder(name);
        self.register_decoder(name);
    }

    pub fn lookup(&self, name: &str) -> Option<ExternalCodecSupport> {
        self.codecs.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn has_encoder(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|support| support.encoder)
    }

    pub fn has_decoder(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|support| support.decoder)
    }

    /// Check that the send codec can actually be encoded
    pub fn resolve_send(&self, codec: &CodecDescription) -> Result<()> {
        if codec.requires_external && !self.has_encoder(&codec.name) {
            warn!("External encoder not available for {}", codec.name);
            return Err(Error::Negotiation(format!(
                "External encoder not available for {}",
                codec.name
            )));
        }
        Ok(())
    }

    /// Drop receive codecs with no decoder; at least one must remain
    pub fn resolve_receive(&self, codecs: &[CodecDescription]) -> Result<Vec<CodecDescription>> {
        let resolved: Vec<CodecDescription> = codecs
            .iter()
            .filter(|codec| {
                let usable = !codec.requires_external || self.has_decoder(&codec.name);
                if !usable {
                    debug!("Skipping receive codec {} without an external decoder", codec.name);
                }
                usable
            })
            .cloned()
            .collect();

        if resolved.is_empty() {
            return Err(Error::Negotiation("No usable receive codec".to_string()));
        }
        Ok(resolved)
    }
}
