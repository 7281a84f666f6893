//! Codec tables and reconciliation
//!
//! - [`CodecDescription`]: one negotiable codec with its rtpmap/fmtp/rtcp-fb data
//! - [`default_codecs`]: the table every session starts from
//! - [`NegotiatedCodecs`]: send/receive selection for one level
//! - [`ExternalCodecRegistry`]: availability of externally provided codecs

pub mod defaults;
pub mod description;
pub mod negotiation;
pub mod registry;

pub use defaults::default_codecs;
pub use description::{CodecDescription, H264Parameters};
pub use negotiation::{order_by_formats, receive_codecs, select_send_codec, NegotiatedCodecs};
pub use registry::{ExternalCodecRegistry, ExternalCodecSupport};
