//! The JSEP session
//!
//! [`JsepSession`] owns all negotiation state for one peer connection. It is
//! not internally synchronized; callers serialize access. Every mutating
//! operation is all-or-nothing: derived state is computed first and committed
//! only once nothing else can fail.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::Arc;

use jsep_sdp_core::attributes::parse_candidate;
use jsep_sdp_core::{
    AddressType, Attribute, Connection, Extmap, Fingerprint, HashAlgorithm, MediaDirection, MediaSection, MediaType,
    Msid, MsidSemantic, Origin, Protocol, Sctpmap, SessionDescription, SetupRole,
};
use rand::random;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::pairing::{self, Negotiation, PairingContext};
use super::state::{next_state, DescriptionSource, SdpType, SignalingState};
use crate::codec::{default_codecs, CodecDescription, ExternalCodecRegistry, NegotiatedCodecs};
use crate::config::{valid_ice_credentials, AnswerOptions, JsepConfig, OfferOptions, MIN_ICE_PWD_LEN, MIN_ICE_UFRAG_LEN};
use crate::error::{Error, Result};
use crate::pipeline::{configure_pairs, MediaConfiguration};
use crate::track::{Track, TrackDirection, TrackPair};
use crate::transport::{
    FinalizeOutcome, FinalizeRequest, IceParameters, SessionLiveness, TransportDescriptor, TransportFinalizer,
    TransportLayer,
};

/// SCTP port offered for data sections
const SCTP_PORT: u16 = 5000;
/// Stream count offered for data sections
const SCTP_STREAMS: u32 = 256;

fn default_mid(level: usize) -> String {
    format!("sdparta_{}", level)
}

/// A pending transport finalization
#[derive(Debug)]
pub struct Finalization {
    pub level: usize,
    pub rtcp: bool,
    pub outcome: oneshot::Receiver<FinalizeOutcome>,
}

/// Everything a successful set-description call will commit
struct Staged {
    next: SignalingState,
    pending_local: Option<SessionDescription>,
    current_local: Option<SessionDescription>,
    pending_remote: Option<SessionDescription>,
    current_remote: Option<SessionDescription>,
    remote_tracks: Option<Vec<Track>>,
    is_offerer: bool,
    negotiation: Option<Negotiation>,
}

/// Offer/answer negotiation engine for one session
#[derive(Debug)]
pub struct JsepSession {
    config: JsepConfig,
    state: SignalingState,
    session_id: u64,
    session_version: u64,
    ice: IceParameters,
    fingerprints: Vec<Fingerprint>,
    audio_extensions: Vec<String>,
    video_extensions: Vec<String>,
    codecs: Vec<CodecDescription>,
    local_tracks: Vec<Track>,
    remote_tracks: Vec<Track>,
    /// Levels whose local track went away; offered with port 0 from now on
    removed_levels: BTreeSet<usize>,
    /// Levels rejected by the last completed negotiation
    rejected_levels: BTreeSet<usize>,
    /// Negotiated-so-far codec preference per level
    negotiated_codecs: BTreeMap<usize, Vec<CodecDescription>>,
    local_candidates: BTreeMap<usize, Vec<String>>,
    local_candidates_done: BTreeSet<usize>,
    pending_local: Option<SessionDescription>,
    current_local: Option<SessionDescription>,
    pending_remote: Option<SessionDescription>,
    current_remote: Option<SessionDescription>,
    is_offerer: bool,
    track_pairs: Vec<TrackPair>,
    finalizer: Option<TransportFinalizer>,
    finalizations: Vec<Finalization>,
    liveness: SessionLiveness,
    last_error: Option<String>,
}

impl JsepSession {
    /// Create a session in the stable state
    pub fn new(config: JsepConfig) -> Result<Self> {
        config.validate()?;

        let ice = match (&config.ice_ufrag, &config.ice_pwd) {
            (Some(ufrag), Some(pwd)) => IceParameters::new(ufrag.clone(), pwd.clone()),
            _ => IceParameters::new(random_hex(4), random_hex(16)),
        };
        let codecs = config.codecs.clone().unwrap_or_else(default_codecs);
        // Keep the id well inside the positive range of a signed 64-bit value
        let session_id = random::<u64>() >> 2;

        info!(session = %config.name, session_id, "Created JSEP session");

        Ok(JsepSession {
            config,
            state: SignalingState::Stable,
            session_id,
            session_version: 0,
            ice,
            fingerprints: Vec::new(),
            audio_extensions: Vec::new(),
            video_extensions: Vec::new(),
            codecs,
            local_tracks: Vec::new(),
            remote_tracks: Vec::new(),
            removed_levels: BTreeSet::new(),
            rejected_levels: BTreeSet::new(),
            negotiated_codecs: BTreeMap::new(),
            local_candidates: BTreeMap::new(),
            local_candidates_done: BTreeSet::new(),
            pending_local: None,
            current_local: None,
            pending_remote: None,
            current_remote: None,
            is_offerer: false,
            track_pairs: Vec::new(),
            finalizer: None,
            finalizations: Vec::new(),
            liveness: SessionLiveness::new(),
            last_error: None,
        })
    }

    /// Hand new transports to `finalizer` whenever negotiation completes
    pub fn set_transport_finalizer(&mut self, finalizer: TransportFinalizer) {
        self.finalizer = Some(finalizer);
    }

    // Tracks

    /// Register a sending track; returns its index
    pub fn add_track(&mut self, track: Track) -> Result<usize> {
        let result = self.add_track_inner(track);
        self.record("add_track", result)
    }

    fn add_track_inner(&mut self, mut track: Track) -> Result<usize> {
        self.ensure_open()?;
        if track.direction != TrackDirection::Sending {
            return Err(Error::InvalidArgument("Only sending tracks can be added".to_string()));
        }
        track.unbind();
        self.local_tracks.push(track);
        debug!(session = %self.config.name, "Added local track {}", self.local_tracks.len() - 1);
        Ok(self.local_tracks.len() - 1)
    }

    /// Remove a sending track; its level is offered with port 0 next time
    pub fn remove_track(&mut self, index: usize) -> Result<Track> {
        let result = self.remove_track_inner(index);
        self.record("remove_track", result)
    }

    fn remove_track_inner(&mut self, index: usize) -> Result<Track> {
        self.ensure_open()?;
        self.check_track_index(index)?;
        let track = self.local_tracks.remove(index);
        if let Some(level) = track.level() {
            self.invalidate_level(level);
        }
        Ok(track)
    }

    /// Swap the track at `index`
    ///
    /// The old track's level is retired exactly as for [`Self::remove_track`];
    /// the new track is offered at a fresh level.
    pub fn replace_track(&mut self, index: usize, track: Track) -> Result<Track> {
        let result = self.replace_track_inner(index, track);
        self.record("replace_track", result)
    }

    fn replace_track_inner(&mut self, index: usize, mut track: Track) -> Result<Track> {
        self.ensure_open()?;
        self.check_track_index(index)?;
        if track.direction != TrackDirection::Sending {
            return Err(Error::InvalidArgument("Only sending tracks can be added".to_string()));
        }
        track.unbind();
        let old = std::mem::replace(&mut self.local_tracks[index], track);
        if let Some(level) = old.level() {
            self.invalidate_level(level);
        }
        Ok(old)
    }

    fn check_track_index(&self, index: usize) -> Result<()> {
        if index >= self.local_tracks.len() {
            return Err(Error::InvalidArgument(format!(
                "Track index {} out of range ({} tracks)",
                index,
                self.local_tracks.len()
            )));
        }
        Ok(())
    }

    fn invalidate_level(&mut self, level: usize) {
        debug!(session = %self.config.name, "Invalidating level {}", level);
        self.removed_levels.insert(level);
        self.negotiated_codecs.remove(&level);
        self.track_pairs.retain(|pair| pair.level != level);
    }

    // Offer/answer

    /// Build an offer; does not change the signaling state
    pub fn create_offer(&mut self, options: &OfferOptions) -> Result<String> {
        let result = self.create_offer_inner(options);
        self.record("create_offer", result)
    }

    fn create_offer_inner(&mut self, options: &OfferOptions) -> Result<String> {
        self.ensure_open()?;
        if !matches!(self.state, SignalingState::Stable | SignalingState::HaveLocalOffer) {
            return Err(Error::State(format!("Cannot create offer in state {}", self.state)));
        }

        self.session_version += 1;
        let mut description = self.new_description();
        let prior_levels = self.local_level_count();

        if let Some(previous) = self.pending_local.as_ref().or(self.current_local.as_ref()) {
            for (level, prior) in previous.media_sections.iter().enumerate() {
                let mid = prior.mid().map(str::to_string).unwrap_or_else(|| default_mid(level));
                let section = if self.removed_levels.contains(&level) || self.rejected_levels.contains(&level) {
                    rejected_section(prior, mid)
                } else {
                    let track = self.local_tracks.iter().find(|t| t.level() == Some(level));
                    self.offer_section(level, prior.media_type, track, mid)
                };
                description.add_media_section(section);
            }
        }

        // New tracks go at the end, in registration order
        let mut bindings = Vec::new();
        for (index, track) in self.local_tracks.iter().enumerate() {
            if track.level().is_some_and(|level| level < prior_levels) {
                continue;
            }
            let level = description.media_sections.len();
            let section = self.offer_section(level, track.media_type, Some(track), default_mid(level));
            description.add_media_section(section);
            bindings.push((index, level));
        }

        let wanted = [
            (MediaType::Audio, options.offer_to_receive_audio),
            (MediaType::Video, options.offer_to_receive_video),
        ];
        for (media_type, count) in wanted {
            let Some(count) = count else { continue };
            let have = description
                .media_sections
                .iter()
                .filter(|s| s.media_type == media_type && !s.is_rejected())
                .count();
            for _ in have..count as usize {
                let level = description.media_sections.len();
                let section = self.offer_section(level, media_type, None, default_mid(level));
                description.add_media_section(section);
            }
        }

        for (index, level) in bindings {
            self.local_tracks[index].bind(level);
        }

        debug!(
            session = %self.config.name,
            version = self.session_version,
            "Created offer with {} media sections",
            description.media_sections.len()
        );
        Ok(description.to_string())
    }

    /// Build an answer to the pending remote offer
    pub fn create_answer(&mut self, options: &AnswerOptions) -> Result<String> {
        let result = self.create_answer_inner(options);
        self.record("create_answer", result)
    }

    fn create_answer_inner(&mut self, _options: &AnswerOptions) -> Result<String> {
        self.ensure_open()?;
        if !matches!(self.state, SignalingState::HaveRemoteOffer | SignalingState::HaveLocalPranswer) {
            return Err(Error::State(format!("Cannot create answer in state {}", self.state)));
        }
        let offer = self
            .pending_remote
            .clone()
            .ok_or_else(|| Error::State("No remote offer to answer".to_string()))?;

        self.session_version += 1;
        let mut description = self.new_description();
        let prior_levels = self.local_level_count();
        let mut bindings: Vec<(usize, usize)> = Vec::new();

        for (level, remote) in offer.media_sections.iter().enumerate() {
            let mid = remote.mid().map(str::to_string).unwrap_or_else(|| default_mid(level));
            if remote.is_rejected() {
                description.add_media_section(rejected_section(remote, mid));
                continue;
            }

            // A track already at this level, else the first free one of the same type
            let track_index = self
                .local_tracks
                .iter()
                .position(|t| t.level() == Some(level) && t.media_type == remote.media_type)
                .or_else(|| {
                    self.local_tracks.iter().enumerate().position(|(index, t)| {
                        t.media_type == remote.media_type
                            && !t.level().is_some_and(|bound| bound < prior_levels)
                            && !bindings.iter().any(|(bound, _)| *bound == index)
                    })
                });
            let track = track_index.map(|index| &self.local_tracks[index]);

            let section = self.answer_section(level, remote, &offer, track, mid);
            if let Some(index) = track_index.filter(|_| !section.is_rejected()) {
                bindings.push((index, level));
            }
            description.add_media_section(section);
        }

        for (index, level) in bindings {
            self.local_tracks[index].bind(level);
        }

        debug!(
            session = %self.config.name,
            version = self.session_version,
            "Created answer with {} media sections",
            description.media_sections.len()
        );
        Ok(description.to_string())
    }

    /// Apply a description we authored
    pub fn set_local_description(&mut self, sdp_type: SdpType, sdp: &str) -> Result<()> {
        let result = self.set_description(DescriptionSource::Local, sdp_type, sdp);
        self.record("set_local_description", result)
    }

    /// Apply a description from the remote peer
    pub fn set_remote_description(&mut self, sdp_type: SdpType, sdp: &str) -> Result<()> {
        let result = self.set_description(DescriptionSource::Remote, sdp_type, sdp);
        self.record("set_remote_description", result)
    }

    fn set_description(&mut self, source: DescriptionSource, sdp_type: SdpType, sdp: &str) -> Result<()> {
        self.ensure_open()?;

        let parsed = jsep_sdp_core::parse(sdp);
        for diagnostic in &parsed.diagnostics {
            debug!(session = %self.config.name, "{} {}: {}", source, sdp_type, diagnostic);
        }
        let (description, _) = parsed.into_result()?;

        let next = next_state(source, self.state, sdp_type)?;
        let staged = self.stage(source, sdp_type, description, next)?;
        self.commit(staged);
        Ok(())
    }

    fn stage(
        &self,
        source: DescriptionSource,
        sdp_type: SdpType,
        description: SessionDescription,
        next: SignalingState,
    ) -> Result<Staged> {
        if sdp_type != SdpType::Offer {
            let offer = match source {
                DescriptionSource::Local => self.pending_remote.as_ref(),
                DescriptionSource::Remote => self.pending_local.as_ref(),
            };
            if let Some(offer) = offer {
                check_answer_shape(offer, &description)?;
            }
        }

        let remote_tracks = (source == DescriptionSource::Remote)
            .then(|| pairing::extract_remote_tracks(&self.remote_tracks, &description));

        let mut pending_local = self.pending_local.clone();
        let mut current_local = self.current_local.clone();
        let mut pending_remote = self.pending_remote.clone();
        let mut current_remote = self.current_remote.clone();
        let mut is_offerer = self.is_offerer;

        match (source, sdp_type) {
            (DescriptionSource::Local, SdpType::Offer) => {
                pending_local = Some(description);
                is_offerer = true;
            }
            (DescriptionSource::Remote, SdpType::Offer) => {
                pending_remote = Some(description);
                is_offerer = false;
            }
            (DescriptionSource::Local, SdpType::Pranswer) => pending_local = Some(description),
            (DescriptionSource::Remote, SdpType::Pranswer) => pending_remote = Some(description),
            (DescriptionSource::Local, SdpType::Answer) => {
                current_local = Some(description);
                if let Some(offer) = pending_remote.take() {
                    current_remote = Some(offer);
                }
                pending_local = None;
            }
            (DescriptionSource::Remote, SdpType::Answer) => {
                current_remote = Some(description);
                if let Some(offer) = pending_local.take() {
                    current_local = Some(offer);
                }
                pending_remote = None;
            }
        }

        let negotiation = if next == SignalingState::Stable {
            let (Some(local), Some(remote)) = (current_local.as_ref(), current_remote.as_ref()) else {
                return Err(Error::State("Negotiation needs both descriptions".to_string()));
            };
            let ctx = PairingContext {
                local,
                remote,
                is_offerer,
                codecs: &self.codecs,
                negotiated: &self.negotiated_codecs,
                local_tracks: &self.local_tracks,
                remote_tracks: remote_tracks.as_deref().unwrap_or(&self.remote_tracks),
                existing: &self.track_pairs,
            };
            Some(pairing::negotiate(&ctx)?)
        } else {
            None
        };

        Ok(Staged {
            next,
            pending_local,
            current_local,
            pending_remote,
            current_remote,
            remote_tracks,
            is_offerer,
            negotiation,
        })
    }

    fn commit(&mut self, staged: Staged) {
        let previous = self.state;
        self.state = staged.next;
        self.pending_local = staged.pending_local;
        self.current_local = staged.current_local;
        self.pending_remote = staged.pending_remote;
        self.current_remote = staged.current_remote;
        self.is_offerer = staged.is_offerer;
        if let Some(tracks) = staged.remote_tracks {
            self.remote_tracks = tracks;
        }

        if let Some(negotiation) = staged.negotiation {
            for (descriptor, candidates) in &negotiation.candidate_updates {
                for candidate in candidates {
                    descriptor.add_candidate(candidate);
                }
            }
            self.rejected_levels = negotiation.rejected;
            // A track on a rejected level is offered again at a fresh one
            for track in &mut self.local_tracks {
                if track.level().is_some_and(|level| self.rejected_levels.contains(&level)) {
                    debug!(session = %self.config.name, "Unbinding track {} from rejected level", track.id);
                    track.unbind();
                }
            }
            self.negotiated_codecs = negotiation.codecs;
            self.track_pairs = negotiation.pairs;
            info!(
                session = %self.config.name,
                pairs = self.track_pairs.len(),
                rejected = self.rejected_levels.len(),
                "Negotiation complete"
            );

            let controlling = self.ice_controlling();
            if let Some(finalizer) = &self.finalizer {
                for transport in negotiation.new_transports {
                    let mut layers = vec![
                        TransportLayer::Ice {
                            local: self.ice.clone(),
                            remote: transport.descriptor.ice().clone(),
                            controlling,
                        },
                        TransportLayer::Dtls {
                            role: transport.descriptor.dtls().role,
                            fingerprints: transport.descriptor.dtls().fingerprints.clone(),
                        },
                    ];
                    if transport.srtp {
                        layers.push(TransportLayer::Srtp);
                    }
                    let outcome = finalizer.dispatch(FinalizeRequest {
                        descriptor: transport.descriptor,
                        level: transport.level,
                        rtcp: transport.rtcp,
                        layers,
                        liveness: self.liveness.clone(),
                    });
                    self.finalizations.push(Finalization {
                        level: transport.level,
                        rtcp: transport.rtcp,
                        outcome,
                    });
                }
            }
        }

        info!(session = %self.config.name, "Signaling state {} -> {}", previous, self.state);
    }

    // ICE, DTLS and header extensions

    /// Add a remote candidate, located by mid first and level otherwise
    pub fn add_remote_ice_candidate(&mut self, candidate: &str, mid: Option<&str>, level: usize) -> Result<()> {
        let result = self.add_remote_ice_candidate_inner(candidate, mid, level);
        self.record("add_remote_ice_candidate", result)
    }

    fn add_remote_ice_candidate_inner(&mut self, candidate: &str, mid: Option<&str>, level: usize) -> Result<()> {
        self.ensure_open()?;
        let candidate = parse_candidate(strip_candidate_prefix(candidate))?;

        let remote = self
            .pending_remote
            .as_mut()
            .or(self.current_remote.as_mut())
            .ok_or_else(|| Error::State("No remote description".to_string()))?;
        let level = mid.and_then(|mid| remote.level_for_mid(mid)).unwrap_or(level);
        let section = remote
            .media_section_mut(level)
            .ok_or_else(|| Error::InvalidArgument(format!("No remote media section at level {}", level)))?;
        section.attributes.set_attribute(Attribute::Candidate(candidate.clone()));

        let component = candidate.split_whitespace().nth(1).and_then(|c| c.parse::<u8>().ok());
        if let Some(pair) = self.track_pairs.iter().find(|pair| pair.level == level) {
            let transport = match (&pair.rtcp_transport, component) {
                (Some(rtcp), Some(2)) => rtcp,
                _ => &pair.rtp_transport,
            };
            transport.add_candidate(&candidate);
        }
        debug!(session = %self.config.name, "Added remote candidate at level {}", level);
        Ok(())
    }

    /// Add a gathered local candidate
    pub fn add_local_ice_candidate(&mut self, candidate: &str, mid: Option<&str>, level: usize) -> Result<()> {
        let result = self.add_local_ice_candidate_inner(candidate, mid, level);
        self.record("add_local_ice_candidate", result)
    }

    fn add_local_ice_candidate_inner(&mut self, candidate: &str, mid: Option<&str>, level: usize) -> Result<()> {
        self.ensure_open()?;
        let candidate = parse_candidate(strip_candidate_prefix(candidate))?;

        let mut level = level;
        if let Some(local) = self.pending_local.as_mut().or(self.current_local.as_mut()) {
            level = mid.and_then(|mid| local.level_for_mid(mid)).unwrap_or(level);
            let section = local
                .media_section_mut(level)
                .ok_or_else(|| Error::InvalidArgument(format!("No local media section at level {}", level)))?;
            section.attributes.set_attribute(Attribute::Candidate(candidate.clone()));
        }

        let gathered = self.local_candidates.entry(level).or_default();
        if !gathered.contains(&candidate) {
            gathered.push(candidate);
        }
        Ok(())
    }

    /// Mark local gathering finished for `level`
    pub fn end_of_local_candidates(&mut self, level: usize) -> Result<()> {
        let result = self.end_of_local_candidates_inner(level);
        self.record("end_of_local_candidates", result)
    }

    fn end_of_local_candidates_inner(&mut self, level: usize) -> Result<()> {
        self.ensure_open()?;
        if let Some(local) = self.pending_local.as_mut().or(self.current_local.as_mut()) {
            let section = local
                .media_section_mut(level)
                .ok_or_else(|| Error::InvalidArgument(format!("No local media section at level {}", level)))?;
            section.attributes.set_attribute(Attribute::EndOfCandidates);
        }
        self.local_candidates_done.insert(level);
        Ok(())
    }

    /// Replace the local ICE credentials used in later descriptions
    pub fn set_ice_credentials(&mut self, ufrag: &str, pwd: &str) -> Result<()> {
        let result = self.set_ice_credentials_inner(ufrag, pwd);
        self.record("set_ice_credentials", result)
    }

    fn set_ice_credentials_inner(&mut self, ufrag: &str, pwd: &str) -> Result<()> {
        self.ensure_open()?;
        if !valid_ice_credentials(ufrag, pwd) {
            return Err(Error::InvalidArgument(format!(
                "ICE ufrag/pwd must be at least {}/{} ICE characters",
                MIN_ICE_UFRAG_LEN, MIN_ICE_PWD_LEN
            )));
        }
        self.ice = IceParameters::new(ufrag, pwd);
        Ok(())
    }

    /// Register the fingerprint of our DTLS certificate
    pub fn add_dtls_fingerprint(&mut self, algorithm: &str, digest: &[u8]) -> Result<()> {
        let result = self.add_dtls_fingerprint_inner(algorithm, digest);
        self.record("add_dtls_fingerprint", result)
    }

    fn add_dtls_fingerprint_inner(&mut self, algorithm: &str, digest: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let hash = HashAlgorithm::from_str(algorithm)
            .map_err(|_| Error::InvalidArgument(format!("Unknown fingerprint algorithm: {}", algorithm)))?;
        if digest.is_empty() {
            return Err(Error::InvalidArgument("Empty fingerprint digest".to_string()));
        }
        let fingerprint = Fingerprint::new(hash, digest.to_vec());
        if !self.fingerprints.contains(&fingerprint) {
            self.fingerprints.push(fingerprint);
        }
        Ok(())
    }

    /// Offer an RTP header extension on audio sections
    pub fn add_audio_rtp_extension(&mut self, uri: &str) -> Result<()> {
        let result = self.add_rtp_extension(MediaType::Audio, uri);
        self.record("add_audio_rtp_extension", result)
    }

    /// Offer an RTP header extension on video sections
    pub fn add_video_rtp_extension(&mut self, uri: &str) -> Result<()> {
        let result = self.add_rtp_extension(MediaType::Video, uri);
        self.record("add_video_rtp_extension", result)
    }

    fn add_rtp_extension(&mut self, media_type: MediaType, uri: &str) -> Result<()> {
        self.ensure_open()?;
        if uri.is_empty() || uri.contains(char::is_whitespace) {
            return Err(Error::InvalidArgument(format!("Invalid extension URI: {:?}", uri)));
        }
        let extensions = match media_type {
            MediaType::Audio => &mut self.audio_extensions,
            _ => &mut self.video_extensions,
        };
        if !extensions.iter().any(|existing| existing == uri) {
            extensions.push(uri.to_string());
        }
        Ok(())
    }

    /// Close the session from any state
    pub fn close(&mut self) {
        if self.state != SignalingState::Closed {
            info!(session = %self.config.name, "Signaling state {} -> {}", self.state, SignalingState::Closed);
        }
        self.state = SignalingState::Closed;
        self.liveness.revoke();
        self.track_pairs.clear();
    }

    // Media pipeline

    /// Codec configuration for the media pipeline, per level and direction
    pub fn configure_media(&self, registry: &ExternalCodecRegistry) -> MediaConfiguration {
        configure_pairs(&self.track_pairs, registry)
    }

    /// Take the receivers of finalizations dispatched so far
    pub fn take_finalizations(&mut self) -> Vec<Finalization> {
        std::mem::take(&mut self.finalizations)
    }

    // Accessors

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &JsepConfig {
        &self.config
    }

    pub fn signaling_state(&self) -> SignalingState {
        self.state
    }

    pub fn is_offerer(&self) -> bool {
        self.is_offerer
    }

    /// We control ICE as offerer, unless the remote is ice-lite
    pub fn ice_controlling(&self) -> bool {
        let remote_lite = self
            .pending_remote
            .as_ref()
            .or(self.current_remote.as_ref())
            .is_some_and(|remote| remote.attributes.is_ice_lite());
        self.is_offerer && !remote_lite
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn session_version(&self) -> u64 {
        self.session_version
    }

    pub fn ice_parameters(&self) -> &IceParameters {
        &self.ice
    }

    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.fingerprints
    }

    /// Pending local description if any, else the current one
    pub fn local_description(&self) -> Option<String> {
        self.pending_local
            .as_ref()
            .or(self.current_local.as_ref())
            .map(SessionDescription::to_string)
    }

    /// Pending remote description if any, else the current one
    pub fn remote_description(&self) -> Option<String> {
        self.pending_remote
            .as_ref()
            .or(self.current_remote.as_ref())
            .map(SessionDescription::to_string)
    }

    pub fn current_local_description(&self) -> Option<&SessionDescription> {
        self.current_local.as_ref()
    }

    pub fn pending_local_description(&self) -> Option<&SessionDescription> {
        self.pending_local.as_ref()
    }

    pub fn current_remote_description(&self) -> Option<&SessionDescription> {
        self.current_remote.as_ref()
    }

    pub fn pending_remote_description(&self) -> Option<&SessionDescription> {
        self.pending_remote.as_ref()
    }

    pub fn local_tracks(&self) -> &[Track] {
        &self.local_tracks
    }

    pub fn remote_tracks(&self) -> &[Track] {
        &self.remote_tracks
    }

    pub fn negotiated_track_pairs(&self) -> &[TrackPair] {
        &self.track_pairs
    }

    /// Levels rejected by the last completed negotiation
    pub fn rejected_levels(&self) -> &BTreeSet<usize> {
        &self.rejected_levels
    }

    /// Distinct transport handles of all live pairs
    pub fn transports(&self) -> Vec<Arc<TransportDescriptor>> {
        let mut transports: Vec<Arc<TransportDescriptor>> = Vec::new();
        for pair in &self.track_pairs {
            for transport in std::iter::once(&pair.rtp_transport).chain(pair.rtcp_transport.iter()) {
                if !transports.iter().any(|known| Arc::ptr_eq(known, transport)) {
                    transports.push(transport.clone());
                }
            }
        }
        transports
    }

    pub fn codecs(&self) -> &[CodecDescription] {
        &self.codecs
    }

    pub fn codecs_mut(&mut self) -> &mut Vec<CodecDescription> {
        &mut self.codecs
    }

    /// Message of the most recent failed operation
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn liveness(&self) -> SessionLiveness {
        self.liveness.clone()
    }

    // Helpers

    fn record<T>(&mut self, operation: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!(session = %self.config.name, "{} failed: {}", operation, e);
            self.last_error = Some(e.to_string());
        }
        result
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == SignalingState::Closed {
            return Err(Error::State("Session is closed".to_string()));
        }
        Ok(())
    }

    /// Number of levels in the local description lineage
    fn local_level_count(&self) -> usize {
        self.pending_local
            .as_ref()
            .or(self.current_local.as_ref())
            .map_or(0, |local| local.media_sections.len())
    }

    fn new_description(&self) -> SessionDescription {
        let address_type = if self.config.origin_address.contains(':') {
            AddressType::IP6
        } else {
            AddressType::IP4
        };
        let origin = Origin::new(
            self.config.origin_username.clone(),
            self.session_id,
            self.session_version,
            address_type,
            self.config.origin_address.clone(),
        );
        let mut description = SessionDescription::new(origin);
        description.attributes.set_attribute(Attribute::MsidSemantic(MsidSemantic {
            semantic: "WMS".to_string(),
            msids: vec!["*".to_string()],
        }));
        description
    }

    fn extensions(&self, media_type: MediaType) -> &[String] {
        match media_type {
            MediaType::Audio => &self.audio_extensions,
            MediaType::Video => &self.video_extensions,
            _ => &[],
        }
    }

    /// Codecs offered at `level`: negotiated so far, else the track's, else the session table
    fn offer_codecs(&self, level: usize, media_type: MediaType, track: Option<&Track>) -> Vec<CodecDescription> {
        if let Some(negotiated) = self.negotiated_codecs.get(&level).filter(|codecs| !codecs.is_empty()) {
            return negotiated.clone();
        }
        self.local_codecs(media_type, track)
    }

    fn local_codecs(&self, media_type: MediaType, track: Option<&Track>) -> Vec<CodecDescription> {
        let source = match track {
            Some(track) if !track.codecs.is_empty() => &track.codecs,
            _ => &self.codecs,
        };
        source
            .iter()
            .filter(|codec| codec.enabled && codec.media_type == media_type)
            .cloned()
            .collect()
    }

    fn add_transport_attributes(&self, section: &mut MediaSection, level: usize, setup: SetupRole) {
        let attributes = &mut section.attributes;
        attributes.set_attribute(Attribute::IceUfrag(self.ice.ufrag.clone()));
        attributes.set_attribute(Attribute::IcePwd(self.ice.pwd.clone()));
        for fingerprint in &self.fingerprints {
            attributes.set_attribute(Attribute::Fingerprint(fingerprint.clone()));
        }
        attributes.set_attribute(Attribute::Setup(setup));
        for candidate in self.local_candidates.get(&level).into_iter().flatten() {
            attributes.set_attribute(Attribute::Candidate(candidate.clone()));
        }
        if self.local_candidates_done.contains(&level) {
            attributes.set_attribute(Attribute::EndOfCandidates);
        }
    }

    fn base_section(&self, media_type: MediaType, protocol: Protocol, mid: String) -> MediaSection {
        let mut section = MediaSection::new(media_type, 9, protocol);
        section.connection = Some(Connection::new(AddressType::IP4, "0.0.0.0"));
        section.attributes.set_attribute(Attribute::Mid(mid));
        section
    }

    fn data_section(&self, level: usize, mid: String, setup: SetupRole) -> MediaSection {
        let mut section = self.base_section(MediaType::Application, Protocol::DtlsSctp, mid);
        section.formats.push(SCTP_PORT.to_string());
        section.attributes.set_attribute(Attribute::Sctpmap(Sctpmap {
            port: SCTP_PORT,
            protocol: "webrtc-datachannel".to_string(),
            streams: Some(SCTP_STREAMS),
        }));
        self.add_transport_attributes(&mut section, level, setup);
        section
    }

    fn offer_section(&self, level: usize, media_type: MediaType, track: Option<&Track>, mid: String) -> MediaSection {
        if media_type == MediaType::Application {
            return self.data_section(level, mid, SetupRole::Actpass);
        }

        let mut section = self.base_section(media_type, self.config.media_protocol.clone(), mid);
        let direction = if track.is_some() {
            MediaDirection::SendRecv
        } else {
            MediaDirection::RecvOnly
        };
        section.set_direction(direction);
        if let Some(track) = track {
            add_track_attributes(&mut section, track);
        }

        for (index, uri) in self.extensions(media_type).iter().enumerate() {
            section.attributes.set_attribute(Attribute::Extmap(Extmap {
                id: (index + 1) as u16,
                direction: None,
                uri: uri.clone(),
                extension_attributes: None,
            }));
        }
        if self.config.rtcp_mux {
            section.attributes.set_attribute(Attribute::RtcpMux);
        }
        for codec in self.offer_codecs(level, media_type, track) {
            codec.add_to_section(&mut section);
        }
        self.add_transport_attributes(&mut section, level, SetupRole::Actpass);
        section
    }

    fn answer_section(
        &self,
        level: usize,
        remote: &MediaSection,
        offer: &SessionDescription,
        track: Option<&Track>,
        mid: String,
    ) -> MediaSection {
        let setup = match pairing::setup_at(offer, level) {
            Some(SetupRole::Active) => SetupRole::Passive,
            Some(SetupRole::Passive) => SetupRole::Active,
            _ => self.config.answer_setup,
        };

        if remote.media_type == MediaType::Application {
            if remote.formats.is_empty() {
                return rejected_section(remote, mid);
            }
            let mut section = self.data_section(level, mid, setup);
            section.protocol = remote.protocol.clone();
            return section;
        }

        let local_codecs = self.local_codecs(remote.media_type, track);
        let negotiated = NegotiatedCodecs::negotiate(&local_codecs, remote);
        if negotiated.receive.is_empty() {
            debug!(session = %self.config.name, "Rejecting level {}: no common codec", level);
            return rejected_section(remote, mid);
        }

        let mut section = self.base_section(remote.media_type, remote.protocol.clone(), mid);
        let capability = if track.is_some() {
            MediaDirection::SendRecv
        } else {
            MediaDirection::RecvOnly
        };
        let direction = capability.and(remote.direction().reverse());
        section.set_direction(direction);
        if let Some(track) = track.filter(|_| direction.sends()) {
            add_track_attributes(&mut section, track);
        }

        let supported = self.extensions(remote.media_type);
        for extmap in remote.attributes.extmaps() {
            if supported.iter().any(|uri| uri == &extmap.uri) {
                section.attributes.set_attribute(Attribute::Extmap(Extmap {
                    id: extmap.id,
                    direction: None,
                    uri: extmap.uri.clone(),
                    extension_attributes: None,
                }));
            }
        }
        if self.config.rtcp_mux && remote.attributes.is_rtcp_mux() {
            section.attributes.set_attribute(Attribute::RtcpMux);
        }
        for codec in &negotiated.receive {
            codec.add_to_section(&mut section);
        }
        self.add_transport_attributes(&mut section, level, setup);
        section
    }
}

fn add_track_attributes(section: &mut MediaSection, track: &Track) {
    section.attributes.set_attribute(Attribute::Msid(Msid {
        identifier: track.stream_id.clone(),
        appdata: Some(track.id.clone()),
    }));
    if let Some(kbps) = track.bandwidth {
        section.bandwidths.push(jsep_sdp_core::Bandwidth::new("AS", kbps));
    }
}

/// Port-0 copy of `template` with no formats, keeping only the mid
fn rejected_section(template: &MediaSection, mid: String) -> MediaSection {
    let mut section = MediaSection::new(template.media_type, 0, template.protocol.clone());
    section.attributes.set_attribute(Attribute::Mid(mid));
    section
}

/// An answer must mirror the offer's m-lines
fn check_answer_shape(offer: &SessionDescription, answer: &SessionDescription) -> Result<()> {
    if offer.media_sections.len() != answer.media_sections.len() {
        return Err(Error::Negotiation(format!(
            "Answer has {} media sections, offer has {}",
            answer.media_sections.len(),
            offer.media_sections.len()
        )));
    }
    for (level, (offered, answered)) in offer.media_sections.iter().zip(&answer.media_sections).enumerate() {
        if offered.media_type != answered.media_type {
            return Err(Error::Negotiation(format!(
                "Media type mismatch at level {}: offered {}, answered {}",
                level, offered.media_type, answered.media_type
            )));
        }
    }
    Ok(())
}

fn strip_candidate_prefix(candidate: &str) -> &str {
    let candidate = candidate.trim();
    let candidate = candidate.strip_prefix("a=").unwrap_or(candidate);
    candidate.strip_prefix("candidate:").unwrap_or(candidate)
}

fn random_hex(bytes: usize) -> String {
    (0..bytes).map(|_| format!("{:02x}", random::<u8>())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PWD: &str = "0123456789012345678901";

    fn session() -> JsepSession {
        JsepSession::new(JsepConfig::new("test").with_ice_credentials("ufrag", PWD)).unwrap()
    }

    #[test]
    fn test_generated_credentials() {
        let session = JsepSession::new(JsepConfig::default()).unwrap();
        assert_eq!(session.ice_parameters().ufrag.len(), 8);
        assert_eq!(session.ice_parameters().pwd.len(), 32);
        assert!(session.session_id() <= 1 << 62);
        assert_eq!(session.signaling_state(), SignalingState::Stable);
    }

    #[test]
    fn test_track_index_errors() {
        let mut session = session();
        assert!(matches!(session.remove_track(0), Err(Error::InvalidArgument(_))));
        assert!(session.last_error().is_some());
        let index = session.add_track(Track::new(MediaType::Audio)).unwrap();
        assert_eq!(index, 0);
        assert!(session.replace_track(3, Track::new(MediaType::Audio)).is_err());
    }

    #[test]
    fn test_offer_contains_transport_attributes() {
        let mut session = session();
        session.add_track(Track::new(MediaType::Audio)).unwrap();
        session.add_dtls_fingerprint("sha-256", &[0xAB; 32]).unwrap();
        session.add_audio_rtp_extension("urn:ietf:params:rtp-hdrext:ssrc-audio-level").unwrap();
        session.add_local_ice_candidate("candidate:1 1 UDP 2130706431 10.0.0.1 5000 typ host", None, 0).unwrap();

        let offer = session.create_offer(&OfferOptions::default()).unwrap();
        assert!(offer.starts_with("v=0\r\no=- "));
        assert!(offer.contains("a=ice-ufrag:ufrag\r\n"));
        assert!(offer.contains("a=setup:actpass\r\n"));
        assert!(offer.contains("a=extmap:1 urn:ietf:params:rtp-hdrext:ssrc-audio-level\r\n"));
        assert!(offer.contains("a=candidate:1 1 UDP 2130706431 10.0.0.1 5000 typ host\r\n"));
        assert!(offer.contains("a=mid:sdparta_0\r\n"));
        assert!(offer.contains("a=rtcp-mux\r\n"));
        assert_eq!(session.local_tracks()[0].level(), Some(0));
    }

    #[test]
    fn test_video_extensions_and_end_of_candidates() {
        let mut session = session();
        session.add_track(Track::new(MediaType::Video)).unwrap();
        session.add_video_rtp_extension("urn:ietf:params:rtp-hdrext:toffset").unwrap();
        assert!(session.add_video_rtp_extension("not a uri").is_err());
        session.end_of_local_candidates(0).unwrap();

        let offer = session.create_offer(&OfferOptions::default()).unwrap();
        assert!(offer.contains("a=extmap:1 urn:ietf:params:rtp-hdrext:toffset\r\n"));
        assert!(offer.contains("a=end-of-candidates\r\n"));
    }

    #[test]
    fn test_fingerprint_validation() {
        let mut session = session();
        assert!(session.add_dtls_fingerprint("sha-999", &[1, 2]).is_err());
        assert!(session.add_dtls_fingerprint("sha-1", &[]).is_err());
        assert!(session.set_ice_credentials("ab", PWD).is_err());
    }

    #[test]
    fn test_closed_rejects_everything() {
        let mut session = session();
        let liveness = session.liveness();
        session.close();
        assert!(!liveness.is_alive());
        assert_eq!(session.signaling_state(), SignalingState::Closed);
        assert!(matches!(session.create_offer(&OfferOptions::default()), Err(Error::State(_))));
        assert!(matches!(session.add_track(Track::new(MediaType::Audio)), Err(Error::State(_))));
        session.close();
        assert_eq!(session.signaling_state(), SignalingState::Closed);
    }

    #[test]
    fn test_strip_candidate_prefix() {
        assert_eq!(strip_candidate_prefix("a=candidate:1 1 UDP"), "1 1 UDP");
        assert_eq!(strip_candidate_prefix("candidate:1 1 UDP"), "1 1 UDP");
        assert_eq!(strip_candidate_prefix("1 1 UDP"), "1 1 UDP");
    }
}
