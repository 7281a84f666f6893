//! Transport descriptors
//!
//! A descriptor carries what the transport layer needs to run ICE and DTLS for
//! one component of one level. It is shared behind an `Arc` between the track
//! pair and the finalization task, so everything that changes after creation
//! sits behind interior mutability: candidates may keep arriving, and the
//! finalized flow is written exactly once.

use std::fmt;
use std::sync::OnceLock;

use jsep_sdp_core::Fingerprint;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};

/// RTP component numbering (RFC 5245 Section 4.1.1.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Rtp,
    Rtcp,
}

impl Component {
    pub fn id(&self) -> u8 {
        match self {
            Component::Rtp => 1,
            Component::Rtcp => 2,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Rtp => write!(f, "rtp"),
            Component::Rtcp => write!(f, "rtcp"),
        }
    }
}

/// ICE credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceParameters {
    pub ufrag: String,
    pub pwd: String,
}

impl IceParameters {
    pub fn new(ufrag: impl Into<String>, pwd: impl Into<String>) -> Self {
        IceParameters {
            ufrag: ufrag.into(),
            pwd: pwd.into(),
        }
    }
}

/// Which end of the DTLS handshake we are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DtlsRole {
    Client,
    Server,
}

impl fmt::Display for DtlsRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DtlsRole::Client => write!(f, "client"),
            DtlsRole::Server => write!(f, "server"),
        }
    }
}

/// Our DTLS role plus the fingerprints the remote certificate must match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtlsParameters {
    pub role: DtlsRole,
    pub fingerprints: Vec<Fingerprint>,
}

/// Handle the transport layer returns once a flow is running
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportFlow {
    pub id: String,
}

/// Transport parameters for one component of one level
#[derive(Debug)]
pub struct TransportDescriptor {
    level: usize,
    component: Component,
    /// Remote ICE credentials
    ice: IceParameters,
    dtls: DtlsParameters,
    /// Remote candidates, priority order as received
    candidates: RwLock<Vec<String>>,
    flow: OnceLock<TransportFlow>,
}

impl TransportDescriptor {
    pub fn new(
        level: usize,
        component: Component,
        ice: IceParameters,
        dtls: DtlsParameters,
        candidates: Vec<String>,
    ) -> Self {
        TransportDescriptor {
            level,
            component,
            ice,
            dtls,
            candidates: RwLock::new(candidates),
            flow: OnceLock::new(),
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn component(&self) -> Component {
        self.component
    }

    pub fn ice(&self) -> &IceParameters {
        &self.ice
    }

    pub fn dtls(&self) -> &DtlsParameters {
        &self.dtls
    }

    /// Append a remote candidate; duplicates are ignored
    pub fn add_candidate(&self, candidate: &str) {
        let mut candidates = self.candidates.write();
        if !candidates.iter().any(|existing| existing == candidate) {
            trace!("Level {} {}: adding candidate {}", self.level, self.component, candidate);
            candidates.push(candidate.to_string());
        }
    }

    /// Snapshot of the candidates known so far
    pub fn candidates(&self) -> Vec<String> {
        self.candidates.read().clone()
    }

    /// Record the finalized flow; only the first call succeeds
    pub fn set_flow(&self, flow: TransportFlow) -> Result<()> {
        self.flow.set(flow).map_err(|_| {
            Error::Transport(format!(
                "Transport for level {} {} is already finalized",
                self.level, self.component
            ))
        })
    }

    pub fn flow(&self) -> Option<&TransportFlow> {
        self.flow.get()
    }

    pub fn is_finalized(&self) -> bool {
        self.flow.get().is_some()
    }

    /// Same remote identity and role, so an existing handle can be kept
    pub fn matches(&self, ice: &IceParameters, dtls: &DtlsParameters) -> bool {
        &self.ice == ice && &self.dtls == dtls
    }
}
