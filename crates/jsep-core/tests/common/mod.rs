//! Helpers shared by the jsep-core integration tests

#![allow(dead_code)]

use jsep_core::prelude::*;
use jsep_core::OfferOptions;

pub const PWD: &str = "0123456789012345678901";

/// A session with fixed ICE credentials and a fingerprint
pub fn session(name: &str) -> JsepSession {
    session_with(JsepConfig::new(name).with_ice_credentials(format!("{}ufrag", name), PWD))
}

pub fn session_with(config: JsepConfig) -> JsepSession {
    let mut session = JsepSession::new(config).expect("valid config");
    session
        .add_dtls_fingerprint("sha-256", &[0x5A; 32])
        .expect("valid fingerprint");
    session
}

pub fn video_codec(pt: u8, name: &str) -> CodecDescription {
    CodecDescription::new(MediaType::Video, pt, name, 90000, 1)
}

/// Run a full offer/answer exchange, caller offering
pub fn exchange(caller: &mut JsepSession, callee: &mut JsepSession) -> (String, String) {
    exchange_with(caller, callee, &OfferOptions::default())
}

pub fn exchange_with(caller: &mut JsepSession, callee: &mut JsepSession, options: &OfferOptions) -> (String, String) {
    let offer = caller.create_offer(options).expect("create offer");
    caller.set_local_description(SdpType::Offer, &offer).expect("set local offer");
    callee.set_remote_description(SdpType::Offer, &offer).expect("set remote offer");

    let answer = callee.create_answer(&AnswerOptions::default()).expect("create answer");
    callee.set_local_description(SdpType::Answer, &answer).expect("set local answer");
    caller.set_remote_description(SdpType::Answer, &answer).expect("set remote answer");
    (offer, answer)
}

/// Everything a rejected call must leave untouched
#[derive(Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub state: SignalingState,
    pub pending_local: Option<String>,
    pub current_local: Option<String>,
    pub pending_remote: Option<String>,
    pub current_remote: Option<String>,
    pub local_tracks: Vec<(String, Option<usize>)>,
    pub remote_tracks: Vec<(String, Option<usize>)>,
    pub pairs: Vec<usize>,
}

pub fn snapshot(session: &JsepSession) -> Snapshot {
    Snapshot {
        state: session.signaling_state(),
        pending_local: session.pending_local_description().map(|d| d.to_string()),
        current_local: session.current_local_description().map(|d| d.to_string()),
        pending_remote: session.pending_remote_description().map(|d| d.to_string()),
        current_remote: session.current_remote_description().map(|d| d.to_string()),
        local_tracks: session.local_tracks().iter().map(|t| (t.id.clone(), t.level())).collect(),
        remote_tracks: session.remote_tracks().iter().map(|t| (t.id.clone(), t.level())).collect(),
        pairs: session.negotiated_track_pairs().iter().map(|p| p.level).collect(),
    }
}
