//! SDP document model

pub mod attribute;
pub mod attribute_list;
pub mod media;
pub mod session;

pub use attribute::{
    Attribute, AttributeKind, Extmap, Fingerprint, Fmtp, Group, HashAlgorithm, MediaDirection, Msid,
    MsidSemantic, RtcpAttribute, RtcpFb, Rtpmap, Sctpmap, SetupRole, Ssrc, SsrcGroup,
};
pub use attribute_list::AttributeList;
pub use media::{MediaSection, MediaType, Protocol};
pub use session::{AddressType, Bandwidth, Connection, Origin, SessionDescription, Timing};
