//! Reconciliation of an applied offer/answer pair into track pairs
//!
//! Everything here is computed from borrowed session state and returned as a
//! [`Negotiation`]; the engine commits it only when the whole computation
//! succeeded.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use jsep_sdp_core::{Attribute, AttributeKind, MediaSection, MediaType, SessionDescription, SetupRole};
use tracing::{debug, trace};

use crate::codec::{order_by_formats, receive_codecs, CodecDescription, NegotiatedCodecs};
use crate::error::{Error, Result};
use crate::track::{Track, TrackPair};
use crate::transport::{Component, DtlsParameters, DtlsRole, IceParameters, TransportDescriptor};

/// A transport handle created by this negotiation that still needs finalizing
#[derive(Debug, Clone)]
pub(crate) struct NewTransport {
    pub level: usize,
    pub rtcp: bool,
    pub srtp: bool,
    pub descriptor: Arc<TransportDescriptor>,
}

/// Result of reconciling the current local and remote descriptions
#[derive(Debug, Default)]
pub(crate) struct Negotiation {
    pub pairs: Vec<TrackPair>,
    pub rejected: BTreeSet<usize>,
    /// Preference list per level for the next offer
    pub codecs: BTreeMap<usize, Vec<CodecDescription>>,
    pub new_transports: Vec<NewTransport>,
    /// Candidates to append to reused transport handles
    pub candidate_updates: Vec<(Arc<TransportDescriptor>, Vec<String>)>,
}

/// Inputs for [`negotiate`]
pub(crate) struct PairingContext<'a> {
    pub local: &'a SessionDescription,
    pub remote: &'a SessionDescription,
    pub is_offerer: bool,
    pub codecs: &'a [CodecDescription],
    pub negotiated: &'a BTreeMap<usize, Vec<CodecDescription>>,
    pub local_tracks: &'a [Track],
    pub remote_tracks: &'a [Track],
    pub existing: &'a [TrackPair],
}

/// Walk both descriptions level by level and build a pair wherever both
/// sides accepted the section and something was negotiated
pub(crate) fn negotiate(ctx: &PairingContext<'_>) -> Result<Negotiation> {
    let mut negotiation = Negotiation::default();
    let levels = ctx.local.media_sections.len().max(ctx.remote.media_sections.len());

    for level in 0..levels {
        let (Some(local), Some(remote)) = (ctx.local.media_section(level), ctx.remote.media_section(level)) else {
            negotiation.rejected.insert(level);
            continue;
        };
        if local.is_rejected() || remote.is_rejected() {
            trace!("Level {} rejected", level);
            negotiation.rejected.insert(level);
            continue;
        }

        let sending_track = ctx.local_tracks.iter().find(|t| t.level() == Some(level));
        let receiving_track = ctx.remote_tracks.iter().find(|t| t.level() == Some(level));
        let is_data = local.media_type == MediaType::Application;

        let negotiated = if is_data {
            NegotiatedCodecs::default()
        } else {
            let local_codecs = section_codecs(ctx, level, local, sending_track);
            let negotiated = if ctx.is_offerer {
                negotiation
                    .codecs
                    .insert(level, order_by_formats(&local_codecs, &remote.formats));
                NegotiatedCodecs::negotiate_answered(&local_codecs, remote)
            } else {
                let preference = receive_codecs(&local_codecs, &remote.formats).into_iter().cloned().collect();
                negotiation.codecs.insert(level, preference);
                NegotiatedCodecs::negotiate(&local_codecs, remote)
            };
            if negotiated.is_empty() {
                debug!("Level {}: no common codec", level);
                negotiation.codecs.remove(&level);
                negotiation.rejected.insert(level);
                continue;
            }
            negotiated
        };

        let sending = sending_track
            .filter(|_| local.direction().sends() && (is_data || negotiated.send.is_some()))
            .cloned();
        let receiving = receiving_track
            .filter(|_| local.direction().receives() && remote.direction().sends())
            .cloned();

        let rtp_transport = transport_for(ctx, &mut negotiation, level, Component::Rtp, is_data)?;
        let rtcp_transport = if is_data {
            None
        } else if local.attributes.is_rtcp_mux() && remote.attributes.is_rtcp_mux() {
            Some(rtp_transport.clone())
        } else {
            Some(transport_for(ctx, &mut negotiation, level, Component::Rtcp, is_data)?)
        };

        debug!(
            "Level {}: pair built (send={}, receive={})",
            level,
            sending.is_some(),
            receiving.is_some()
        );
        negotiation.pairs.push(TrackPair {
            level,
            sending,
            receiving,
            negotiated_codecs: negotiated,
            rtp_transport,
            rtcp_transport,
        });
    }

    Ok(negotiation)
}

/// Our codecs for a local section, in that section's format order
fn section_codecs(
    ctx: &PairingContext<'_>,
    level: usize,
    section: &MediaSection,
    track: Option<&Track>,
) -> Vec<CodecDescription> {
    let pool: Vec<&CodecDescription> = track
        .into_iter()
        .flat_map(|t| t.codecs.iter())
        .chain(ctx.negotiated.get(&level).into_iter().flatten())
        .chain(ctx.codecs.iter())
        .filter(|codec| codec.media_type == section.media_type)
        .collect();

    section
        .formats
        .iter()
        .filter_map(|token| pool.iter().find(|codec| codec.matches_format(token)))
        .map(|codec| (*codec).clone())
        .collect()
}

/// Setup role at `level`, inheriting the session value
pub(crate) fn setup_at(description: &SessionDescription, level: usize) -> Option<SetupRole> {
    description
        .attribute_at(level, AttributeKind::Setup)
        .iter()
        .find_map(|attribute| match attribute {
            Attribute::Setup(role) => Some(*role),
            _ => None,
        })
}

/// Our DTLS role for `level`
///
/// As offerer we take the opposite of the answer's setup; as answerer our own
/// answer's setup decides.
pub(crate) fn dtls_role(local: &SessionDescription, remote: &SessionDescription, level: usize, is_offerer: bool) -> DtlsRole {
    if is_offerer {
        match setup_at(remote, level) {
            Some(SetupRole::Passive) => DtlsRole::Client,
            _ => DtlsRole::Server,
        }
    } else {
        match setup_at(local, level) {
            Some(SetupRole::Passive) => DtlsRole::Server,
            _ => DtlsRole::Client,
        }
    }
}

fn string_at(description: &SessionDescription, level: usize, kind: AttributeKind) -> Option<String> {
    description
        .attribute_at(level, kind)
        .iter()
        .find_map(|attribute| match attribute {
            Attribute::IceUfrag(value) | Attribute::IcePwd(value) => Some(value.clone()),
            _ => None,
        })
}

fn candidate_component(candidate: &str) -> Option<u8> {
    candidate.split_whitespace().nth(1).and_then(|c| c.parse().ok())
}

/// Transport handle for one component, reusing the previous handle when the
/// remote identity did not change
fn transport_for(
    ctx: &PairingContext<'_>,
    negotiation: &mut Negotiation,
    level: usize,
    component: Component,
    is_data: bool,
) -> Result<Arc<TransportDescriptor>> {
    let ufrag = string_at(ctx.remote, level, AttributeKind::IceUfrag);
    let pwd = string_at(ctx.remote, level, AttributeKind::IcePwd);
    let (Some(ufrag), Some(pwd)) = (ufrag, pwd) else {
        return Err(Error::Negotiation(format!("Missing ICE credentials for level {}", level)));
    };

    let fingerprints = ctx
        .remote
        .attribute_at(level, AttributeKind::Fingerprint)
        .iter()
        .filter_map(|attribute| match attribute {
            Attribute::Fingerprint(fingerprint) => Some(fingerprint.clone()),
            _ => None,
        })
        .collect();

    let ice = IceParameters::new(ufrag, pwd);
    let dtls = DtlsParameters {
        role: dtls_role(ctx.local, ctx.remote, level, ctx.is_offerer),
        fingerprints,
    };
    let candidates: Vec<String> = ctx
        .remote
        .media_section(level)
        .map(|section| section.attributes.candidates())
        .unwrap_or_default()
        .into_iter()
        .filter(|candidate| candidate_component(candidate) == Some(component.id()))
        .map(str::to_string)
        .collect();

    let previous = ctx.existing.iter().find(|pair| pair.level == level).and_then(|pair| match component {
        Component::Rtp => Some(pair.rtp_transport.clone()),
        Component::Rtcp => pair
            .rtcp_transport
            .clone()
            .filter(|transport| transport.component() == Component::Rtcp),
    });

    if let Some(previous) = previous.filter(|transport| transport.matches(&ice, &dtls)) {
        trace!("Level {} {}: keeping transport", level, component);
        negotiation.candidate_updates.push((previous.clone(), candidates));
        return Ok(previous);
    }

    let descriptor = Arc::new(TransportDescriptor::new(level, component, ice, dtls, candidates));
    negotiation.new_transports.push(NewTransport {
        level,
        rtcp: component == Component::Rtcp,
        srtp: !is_data,
        descriptor: descriptor.clone(),
    });
    Ok(descriptor)
}

/// Remote tracks after applying `description`
///
/// One track per section the remote sends on. An existing entry is kept when
/// its msid matches, otherwise when it sits at the same level.
pub(crate) fn extract_remote_tracks(existing: &[Track], description: &SessionDescription) -> Vec<Track> {
    let mut tracks = existing.to_vec();

    for (level, section) in description.media_sections.iter().enumerate() {
        if section.is_rejected() || section.media_type == MediaType::Application || !section.direction().sends() {
            continue;
        }

        let msid = section.attributes.msids().first().map(|msid| (msid.identifier.clone(), msid.appdata.clone()));
        let stream_id = msid
            .as_ref()
            .map(|(stream, _)| stream.clone())
            .unwrap_or_else(|| "default".to_string());
        let track_id = msid
            .as_ref()
            .and_then(|(_, track)| track.clone())
            .unwrap_or_else(|| format!("{}-{}", section.media_type, level));

        let by_msid = msid.as_ref().and_then(|_| {
            tracks
                .iter()
                .position(|t| t.stream_id == stream_id && t.id == track_id && t.media_type == section.media_type)
        });
        if let Some(index) = by_msid {
            tracks[index].bind(level);
            continue;
        }

        let by_level = tracks
            .iter()
            .any(|t| t.level() == Some(level) && t.media_type == section.media_type);
        if by_level {
            continue;
        }

        debug!("New remote {} track {} at level {}", section.media_type, track_id, level);
        tracks.push(Track::receiving(section.media_type, stream_id, track_id, level));
    }

    tracks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description(text: &str) -> SessionDescription {
        text.parse().unwrap()
    }

    const REMOTE: &str = "v=0\r\n\
        o=- 7 1 IN IP4 0.0.0.0\r\n\
        s=-\r\n\
        t=0 0\r\n\
        a=ice-ufrag:rmte\r\n\
        a=ice-pwd:0123456789012345678901\r\n\
        m=audio 9 UDP/TLS/RTP/SAVPF 0\r\n\
        a=mid:a0\r\n\
        a=msid:stream-1 track-1\r\n\
        a=sendonly\r\n\
        a=setup:active\r\n\
        a=rtpmap:0 PCMU/8000\r\n\
        m=video 9 UDP/TLS/RTP/SAVPF 120\r\n\
        a=mid:v0\r\n\
        a=recvonly\r\n\
        a=rtpmap:120 VP8/90000\r\n";

    #[test]
    fn test_extract_remote_tracks() {
        let remote = description(REMOTE);
        let tracks = extract_remote_tracks(&[], &remote);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].stream_id, "stream-1");
        assert_eq!(tracks[0].id, "track-1");
        assert_eq!(tracks[0].level(), Some(0));

        // Applying again keeps the existing entry
        let again = extract_remote_tracks(&tracks, &remote);
        assert_eq!(again.len(), 1);
    }

    #[test]
    fn test_session_level_fallback_for_setup() {
        let remote = description(REMOTE);
        assert_eq!(setup_at(&remote, 0), Some(SetupRole::Active));
        assert_eq!(setup_at(&remote, 1), None);
        assert_eq!(dtls_role(&remote, &remote, 0, true), DtlsRole::Server);
        assert_eq!(dtls_role(&remote, &remote, 0, false), DtlsRole::Client);
    }

    #[test]
    fn test_candidate_component() {
        assert_eq!(candidate_component("1 2 UDP 2130706431 10.0.0.1 5001 typ host"), Some(2));
        assert_eq!(candidate_component("garbage"), None);
    }
}
