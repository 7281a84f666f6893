//! JSEP offer/answer negotiation engine.
//!
//! A [`JsepSession`] tracks one peer connection through the signaling state
//! machine: it builds offers and answers, applies local and remote
//! descriptions, reconciles codecs per media section into [`TrackPair`]s, and
//! hands transport descriptors to an external transport layer through the
//! [`TransportFinalizer`].
//!
//! ```
//! use jsep_core::prelude::*;
//!
//! let mut session = JsepSession::new(JsepConfig::new("caller")).unwrap();
//! session.add_track(Track::new(MediaType::Audio)).unwrap();
//!
//! let offer = session.create_offer(&OfferOptions::default()).unwrap();
//! session.set_local_description(SdpType::Offer, &offer).unwrap();
//! assert_eq!(session.signaling_state(), SignalingState::HaveLocalOffer);
//! ```

// Error handling
pub mod error;

// Logging setup
pub mod logging;

// Configuration
pub mod config;

// Codec tables and reconciliation
pub mod codec;

// Tracks and track pairs
pub mod track;

// Transport descriptors and finalization
pub mod transport;

// Media pipeline output
pub mod pipeline;

// Negotiation engine
pub mod session;

// Public exports
pub use codec::{CodecDescription, ExternalCodecRegistry, H264Parameters, NegotiatedCodecs};
pub use config::{AnswerOptions, JsepConfig, OfferOptions};
pub use error::{Error, ErrorCategory, Result};
pub use pipeline::{configure_pairs, CodecConfigKey, MediaConfiguration, PipelineDirection};
pub use session::{DescriptionSource, Finalization, JsepSession, SdpType, SignalingState};
pub use track::{MediaSource, Track, TrackDirection, TrackPair};
pub use transport::{
    FinalizeOutcome, FinalizeRequest, SessionLiveness, TransportDescriptor, TransportFinalizer, TransportHandler,
    TransportLayer,
};

/// Re-export of common types and functions
pub mod prelude {
    pub use super::{
        AnswerOptions, CodecDescription, Error, JsepConfig, JsepSession, OfferOptions, Result, SdpType,
        SignalingState, Track, TrackPair,
    };
    pub use jsep_sdp_core::{MediaDirection, MediaType, SessionDescription};
}
