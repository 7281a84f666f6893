//! Codec reconciliation for one media section
//!
//! Matching is by payload type token only: a local codec matches when its
//! payload type appears in the remote format list.

use jsep_sdp_core::MediaSection;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::description::CodecDescription;

/// Codecs agreed for one level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiatedCodecs {
    /// Single best codec to send with, if any matched
    pub send: Option<CodecDescription>,
    /// Every codec the remote may send us, in local preference order
    pub receive: Vec<CodecDescription>,
}

impl NegotiatedCodecs {
    /// Reconcile `local` (preference order) against the formats of `remote`
    pub fn negotiate(local: &[CodecDescription], remote: &MediaSection) -> Self {
        let send = select_send_codec(local, &remote.formats).map(|codec| codec.negotiate_with(remote));
        let receive = receive_codecs(local, &remote.formats)
            .into_iter()
            .map(|codec| codec.negotiate_with(remote))
            .collect();

        let negotiated = NegotiatedCodecs { send, receive };
        debug!(
            "Negotiated {} codecs: send={:?}, receive={}",
            remote.media_type,
            negotiated.send.as_ref().map(|c| c.name.as_str()),
            negotiated.receive.len()
        );
        negotiated
    }

    /// Reconcile as the offerer against an applied answer
    ///
    /// The answer's format order decides the send codec; the receive set keeps
    /// local order.
    pub fn negotiate_answered(local: &[CodecDescription], answer: &MediaSection) -> Self {
        let send_order = order_by_formats(local, &answer.formats);
        let mut negotiated = Self::negotiate(local, answer);
        negotiated.send = select_send_codec(&send_order, &answer.formats).map(|codec| codec.negotiate_with(answer));
        negotiated
    }

    /// Nothing matched in either direction
    pub fn is_empty(&self) -> bool {
        self.send.is_none() && self.receive.is_empty()
    }

    /// Format tokens to put in an answer, in preference order
    pub fn formats(&self) -> Vec<String> {
        self.receive.iter().map(CodecDescription::pt_token).collect()
    }
}

/// First enabled local codec whose payload type the remote lists
pub fn select_send_codec<'a>(local: &'a [CodecDescription], remote_formats: &[String]) -> Option<&'a CodecDescription> {
    let selected = local
        .iter()
        .filter(|codec| codec.enabled)
        .find(|codec| remote_formats.iter().any(|token| codec.matches_format(token)));
    if selected.is_none() {
        trace!("No send codec matches remote formats {:?}", remote_formats);
    }
    selected
}

/// All enabled local codecs the remote lists, keeping local order
pub fn receive_codecs<'a>(local: &'a [CodecDescription], remote_formats: &[String]) -> Vec<&'a CodecDescription> {
    local
        .iter()
        .filter(|codec| codec.enabled)
        .filter(|codec| remote_formats.iter().any(|token| codec.matches_format(token)))
        .collect()
}

/// Local codecs that appear in `formats`, reordered to follow `formats`
///
/// Used by the offerer once an answer is applied: the answerer's format order
/// becomes the preference list for that level.
pub fn order_by_formats(local: &[CodecDescription], formats: &[String]) -> Vec<CodecDescription> {
    formats
        .iter()
        .filter_map(|token| local.iter().find(|codec| codec.matches_format(token)))
        .cloned()
        .collect()
}
