//! Signaling state machine
//!
//! Which description may be applied in which state is fixed by a single
//! transition table; every path through the engine consults it, so there is no
//! other place where state rules live.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Signaling state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalingState {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
    HaveLocalPranswer,
    HaveRemotePranswer,
    Closed,
}

impl SignalingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalingState::Stable => "stable",
            SignalingState::HaveLocalOffer => "have-local-offer",
            SignalingState::HaveRemoteOffer => "have-remote-offer",
            SignalingState::HaveLocalPranswer => "have-local-pranswer",
            SignalingState::HaveRemotePranswer => "have-remote-pranswer",
            SignalingState::Closed => "closed",
        }
    }
}

impl fmt::Display for SignalingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a description in the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SdpType {
    Offer,
    Answer,
    Pranswer,
}

impl fmt::Display for SdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdpType::Offer => write!(f, "offer"),
            SdpType::Answer => write!(f, "answer"),
            SdpType::Pranswer => write!(f, "pranswer"),
        }
    }
}

impl FromStr for SdpType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "offer" => Ok(SdpType::Offer),
            "answer" => Ok(SdpType::Answer),
            "pranswer" => Ok(SdpType::Pranswer),
            _ => Err(Error::InvalidArgument(format!("Unknown description type: {}", s))),
        }
    }
}

/// Which side authored a description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptionSource {
    Local,
    Remote,
}

impl fmt::Display for DescriptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptionSource::Local => write!(f, "local"),
            DescriptionSource::Remote => write!(f, "remote"),
        }
    }
}

type TransitionKey = (DescriptionSource, SignalingState, SdpType);

lazy_static! {
    /// Every legal (source, state, type) combination and the state it leads to
    static ref TRANSITIONS: HashMap<TransitionKey, SignalingState> = build_transition_table();
}

fn build_transition_table() -> HashMap<TransitionKey, SignalingState> {
    use DescriptionSource::{Local, Remote};
    use SdpType::{Answer, Offer, Pranswer};
    use SignalingState::*;

    let entries = [
        // Local descriptions
        ((Local, Stable, Offer), HaveLocalOffer),
        ((Local, HaveLocalOffer, Offer), HaveLocalOffer),
        ((Local, HaveRemoteOffer, Answer), Stable),
        ((Local, HaveRemoteOffer, Pranswer), HaveLocalPranswer),
        ((Local, HaveLocalPranswer, Pranswer), HaveLocalPranswer),
        ((Local, HaveLocalPranswer, Answer), Stable),
        // Remote descriptions
        ((Remote, Stable, Offer), HaveRemoteOffer),
        ((Remote, HaveRemoteOffer, Offer), HaveRemoteOffer),
        ((Remote, HaveLocalOffer, Answer), Stable),
        ((Remote, HaveLocalOffer, Pranswer), HaveRemotePranswer),
        ((Remote, HaveRemotePranswer, Pranswer), HaveRemotePranswer),
        ((Remote, HaveRemotePranswer, Answer), Stable),
    ];

    let table: HashMap<_, _> = entries.into_iter().collect();
    tracing::debug!(transitions = table.len(), "Built signaling transition table");
    table
}

/// State reached by applying a `sdp_type` description from `source` in `state`
pub fn next_state(source: DescriptionSource, state: SignalingState, sdp_type: SdpType) -> Result<SignalingState> {
    TRANSITIONS
        .get(&(source, state, sdp_type))
        .copied()
        .ok_or_else(|| {
            Error::State(format!(
                "Cannot set {} {} in state {}",
                source, sdp_type, state
            ))
        })
}
