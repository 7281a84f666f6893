//! Media tracks and negotiated track pairs

use std::fmt;
use std::sync::{Arc, Weak};

use jsep_sdp_core::MediaType;
use uuid::Uuid;

use crate::codec::{CodecDescription, NegotiatedCodecs};
use crate::transport::TransportDescriptor;

/// Something that produces media for a sending track
///
/// Tracks only hold a weak reference; the application keeps the source alive.
pub trait MediaSource: Send + Sync + fmt::Debug {
    /// Identifier of the source, e.g. a capture device name
    fn id(&self) -> &str;

    fn media_type(&self) -> MediaType;
}

/// Whether a track carries media out of or into this endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackDirection {
    Sending,
    Receiving,
}

impl fmt::Display for TrackDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackDirection::Sending => write!(f, "send"),
            TrackDirection::Receiving => write!(f, "recv"),
        }
    }
}

/// One media track
#[derive(Debug, Clone)]
pub struct Track {
    pub id: String,
    /// Media stream the track belongs to (the msid identifier)
    pub stream_id: String,
    pub media_type: MediaType,
    pub direction: TrackDirection,
    /// Codec preference list; empty means use the session table
    pub codecs: Vec<CodecDescription>,
    /// Bandwidth limit in kbps
    pub bandwidth: Option<u32>,
    source: Option<Weak<dyn MediaSource>>,
    level: Option<usize>,
}

impl Track {
    /// A new sending track with generated track and stream ids
    pub fn new(media_type: MediaType) -> Self {
        Track {
            id: Uuid::new_v4().to_string(),
            stream_id: Uuid::new_v4().to_string(),
            media_type,
            direction: TrackDirection::Sending,
            codecs: Vec::new(),
            bandwidth: None,
            source: None,
            level: None,
        }
    }

    pub(crate) fn receiving(media_type: MediaType, stream_id: String, id: String, level: usize) -> Self {
        Track {
            id,
            stream_id,
            media_type,
            direction: TrackDirection::Receiving,
            codecs: Vec::new(),
            bandwidth: None,
            source: None,
            level: Some(level),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_stream_id(mut self, stream_id: impl Into<String>) -> Self {
        self.stream_id = stream_id.into();
        self
    }

    pub fn with_codecs(mut self, codecs: Vec<CodecDescription>) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn with_bandwidth(mut self, kbps: u32) -> Self {
        self.bandwidth = Some(kbps);
        self
    }

    pub fn with_source(mut self, source: &Arc<dyn MediaSource>) -> Self {
        self.source = Some(Arc::downgrade(source));
        self
    }

    /// The media source, if one was attached and is still alive
    pub fn source(&self) -> Option<Arc<dyn MediaSource>> {
        self.source.as_ref().and_then(Weak::upgrade)
    }

    /// Level this track is bound to, once offered or matched
    pub fn level(&self) -> Option<usize> {
        self.level
    }

    pub(crate) fn bind(&mut self, level: usize) {
        self.level = Some(level);
    }

    pub(crate) fn unbind(&mut self) {
        self.level = None;
    }
}

/// The negotiated result for one level
#[derive(Debug, Clone)]
pub struct TrackPair {
    pub level: usize,
    pub sending: Option<Track>,
    pub receiving: Option<Track>,
    pub negotiated_codecs: NegotiatedCodecs,
    pub rtp_transport: Arc<TransportDescriptor>,
    /// Same handle as `rtp_transport` when RTCP is multiplexed
    pub rtcp_transport: Option<Arc<TransportDescriptor>>,
}

impl TrackPair {
    pub fn send_codec(&self) -> Option<&CodecDescription> {
        self.negotiated_codecs.send.as_ref()
    }

    pub fn receive_codecs(&self) -> &[CodecDescription] {
        &self.negotiated_codecs.receive
    }

    pub fn is_rtcp_muxed(&self) -> bool {
        self.rtcp_transport
            .as_ref()
            .is_some_and(|rtcp| Arc::ptr_eq(rtcp, &self.rtp_transport))
    }
}
