//! Codec configuration handed to the media pipeline
//!
//! For every negotiated pair the pipeline gets one entry per active
//! direction: the single send codec, or the full receive set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::codec::{CodecDescription, ExternalCodecRegistry};
use crate::error::Error;
use crate::track::{TrackDirection, TrackPair};

/// Direction of a pipeline entry; ordered so send sorts before receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PipelineDirection {
    Send,
    Receive,
}

impl From<TrackDirection> for PipelineDirection {
    fn from(direction: TrackDirection) -> Self {
        match direction {
            TrackDirection::Sending => PipelineDirection::Send,
            TrackDirection::Receiving => PipelineDirection::Receive,
        }
    }
}

/// Key of one pipeline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CodecConfigKey {
    pub level: usize,
    pub direction: PipelineDirection,
}

impl CodecConfigKey {
    pub fn new(level: usize, direction: PipelineDirection) -> Self {
        CodecConfigKey { level, direction }
    }
}

/// Pipeline input for every negotiated pair
///
/// A pair that cannot be configured only loses its own entry; the failure is
/// kept under the same key.
#[derive(Debug, Default)]
pub struct MediaConfiguration {
    pub codecs: BTreeMap<CodecConfigKey, Vec<CodecDescription>>,
    pub failures: BTreeMap<CodecConfigKey, Error>,
}

impl MediaConfiguration {
    pub fn get(&self, key: &CodecConfigKey) -> Option<&[CodecDescription]> {
        self.codecs.get(key).map(Vec::as_slice)
    }

    pub fn failure(&self, key: &CodecConfigKey) -> Option<&Error> {
        self.failures.get(key)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Per-level, per-direction codec configuration
///
/// A send codec needing an unregistered external encoder, or a receive set
/// with no usable codec, fails that key with a negotiation error. Other
/// levels and directions are still configured.
pub fn configure_pairs(pairs: &[TrackPair], registry: &ExternalCodecRegistry) -> MediaConfiguration {
    let mut config = MediaConfiguration::default();

    for pair in pairs {
        if let (Some(track), Some(codec)) = (&pair.sending, pair.send_codec()) {
            let key = CodecConfigKey::new(pair.level, track.direction.into());
            match registry.resolve_send(codec) {
                Ok(()) => {
                    debug!("Level {}: sending {} with {}", pair.level, track.id, codec);
                    config.codecs.insert(key, vec![codec.clone()]);
                }
                Err(e) => {
                    warn!("Level {}: cannot send {}: {}", pair.level, track.id, e);
                    config.failures.insert(key, e);
                }
            }
        }

        if let Some(track) = &pair.receiving {
            if pair.receive_codecs().is_empty() {
                continue;
            }
            let key = CodecConfigKey::new(pair.level, track.direction.into());
            match registry.resolve_receive(pair.receive_codecs()) {
                Ok(receive) => {
                    debug!("Level {}: receiving {} with {} codecs", pair.level, track.id, receive.len());
                    config.codecs.insert(key, receive);
                }
                Err(e) => {
                    warn!("Level {}: cannot receive {}: {}", pair.level, track.id, e);
                    config.failures.insert(key, e);
                }
            }
        }
    }

    config
}
