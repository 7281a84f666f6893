//! End-to-end offer/answer exchanges between two sessions

mod common;

use common::{exchange, exchange_with, session, session_with, video_codec};
use jsep_core::codec::default_codecs;
use jsep_core::prelude::*;
use jsep_core::transport::{Component, DtlsRole};
use jsep_core::{CodecConfigKey, ExternalCodecRegistry, PipelineDirection};

fn names(codecs: &[CodecDescription]) -> Vec<&str> {
    codecs.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn test_basic_audio_call() {
    let mut alice = session("alice");
    let mut bob = session("bob");
    alice.add_track(Track::new(MediaType::Audio).with_stream_id("alice-stream")).unwrap();
    bob.add_track(Track::new(MediaType::Audio)).unwrap();

    let (offer, answer) = exchange(&mut alice, &mut bob);
    assert!(offer.contains("a=setup:actpass\r\n"));
    assert!(answer.contains("a=setup:active\r\n"));
    assert!(answer.contains("a=sendrecv\r\n"));

    let pairs = alice.negotiated_track_pairs();
    assert_eq!(pairs.len(), 1);
    let pair = &pairs[0];
    assert_eq!(pair.level, 0);
    assert!(pair.sending.is_some());
    assert!(pair.receiving.is_some());
    assert_eq!(pair.send_codec().map(|c| c.name.as_str()), Some("opus"));
    assert_eq!(pair.rtp_transport.dtls().role, DtlsRole::Server);
    assert_eq!(pair.rtp_transport.ice().ufrag, "bobufrag");
    assert!(pair.is_rtcp_muxed());

    let bob_pair = &bob.negotiated_track_pairs()[0];
    assert_eq!(bob_pair.rtp_transport.dtls().role, DtlsRole::Client);
    assert_eq!(bob_pair.rtp_transport.ice().ufrag, "aliceufrag");
    assert_eq!(bob_pair.send_codec().map(|c| c.name.as_str()), Some("opus"));

    // Bob sees Alice's stream
    let remote = &bob.remote_tracks()[0];
    assert_eq!(remote.stream_id, "alice-stream");
    assert_eq!(remote.id, alice.local_tracks()[0].id);
    assert_eq!(remote.level(), Some(0));

    assert!(alice.ice_controlling());
    assert!(!bob.ice_controlling());
    assert_eq!(alice.transports().len(), 1);
}

#[test]
fn test_offerer_sends_answerer_preference() {
    let mut alice = session("alice");
    let mut bob = session("bob");
    alice
        .add_track(Track::new(MediaType::Video).with_codecs(vec![video_codec(96, "VP8"), video_codec(97, "H264")]))
        .unwrap();
    bob.add_track(Track::new(MediaType::Video).with_codecs(vec![video_codec(97, "H264"), video_codec(96, "VP8")]))
        .unwrap();

    let (offer, answer) = exchange(&mut alice, &mut bob);
    assert!(offer.contains("m=video 9 UDP/TLS/RTP/SAVPF 96 97\r\n"));
    assert!(answer.contains("m=video 9 UDP/TLS/RTP/SAVPF 97 96\r\n"));

    let pair = &alice.negotiated_track_pairs()[0];
    assert_eq!(pair.send_codec().map(|c| c.name.as_str()), Some("H264"));
    assert_eq!(names(pair.receive_codecs()), vec!["VP8", "H264"]);

    let bob_pair = &bob.negotiated_track_pairs()[0];
    assert_eq!(bob_pair.send_codec().map(|c| c.name.as_str()), Some("H264"));
    assert_eq!(names(bob_pair.receive_codecs()), vec!["H264", "VP8"]);

    // The answer's order carries into the next offer
    let reoffer = alice.create_offer(&OfferOptions::default()).unwrap();
    assert!(reoffer.contains("m=video 9 UDP/TLS/RTP/SAVPF 97 96\r\n"));
}

#[test]
fn test_answerer_uses_local_preference() {
    let mut alice = session("alice");
    let pcmu_first = vec![
        CodecDescription::new(MediaType::Audio, 0, "PCMU", 8000, 1),
        CodecDescription::new(MediaType::Audio, 109, "opus", 48000, 2),
    ];
    let mut bob = session_with(
        JsepConfig::new("bob")
            .with_ice_credentials("bobufrag", common::PWD)
            .with_codecs(pcmu_first),
    );
    alice.add_track(Track::new(MediaType::Audio)).unwrap();
    bob.add_track(Track::new(MediaType::Audio)).unwrap();

    let (_, answer) = exchange(&mut alice, &mut bob);
    assert!(answer.contains("m=audio 9 UDP/TLS/RTP/SAVPF 0 109\r\n"));

    let bob_pair = &bob.negotiated_track_pairs()[0];
    assert_eq!(bob_pair.send_codec().map(|c| c.name.as_str()), Some("PCMU"));

    let alice_pair = &alice.negotiated_track_pairs()[0];
    assert_eq!(alice_pair.send_codec().map(|c| c.name.as_str()), Some("PCMU"));
    assert_eq!(names(alice_pair.receive_codecs()), vec!["opus", "PCMU"]);
}

#[test]
fn test_unsupported_codec_rejects_section() {
    let offer = "v=0\r\n\
        o=- 7 1 IN IP4 0.0.0.0\r\n\
        s=-\r\n\
        t=0 0\r\n\
        m=video 9 RTP/SAVPF 120\r\n\
        c=IN IP4 0.0.0.0\r\n\
        a=mid:v\r\n\
        a=ice-ufrag:rmte\r\n\
        a=ice-pwd:abcdefghijklmnopqrstuv\r\n\
        a=sendrecv\r\n\
        a=rtpmap:120 VP8/90000\r\n";

    // Nothing local is mapped to payload type 120
    let codecs: Vec<CodecDescription> = default_codecs().into_iter().filter(|c| c.default_pt != 120).collect();
    let mut bob = session_with(
        JsepConfig::new("bob")
            .with_ice_credentials("bobufrag", common::PWD)
            .with_codecs(codecs),
    );
    bob.add_track(Track::new(MediaType::Video)).unwrap();
    bob.set_remote_description(SdpType::Offer, offer).unwrap();

    let answer = bob.create_answer(&AnswerOptions::default()).unwrap();
    assert!(answer.contains("m=video 0 RTP/SAVPF\r\n"));
    assert!(answer.contains("a=mid:v\r\n"));
    assert!(!answer.contains("a=rtpmap"));
    assert_eq!(bob.local_tracks()[0].level(), None);

    let parsed: SessionDescription = answer.parse().unwrap();
    assert!(parsed.media_sections[0].formats.is_empty());

    bob.set_local_description(SdpType::Answer, &answer).unwrap();
    assert!(bob.negotiated_track_pairs().is_empty());
    assert!(bob.rejected_levels().contains(&0));
}

#[test]
fn test_remove_track_retires_level() {
    let mut alice = session("alice");
    let mut bob = session("bob");
    alice.add_track(Track::new(MediaType::Audio)).unwrap();
    alice.add_track(Track::new(MediaType::Video)).unwrap();
    bob.add_track(Track::new(MediaType::Audio)).unwrap();
    bob.add_track(Track::new(MediaType::Video)).unwrap();
    exchange(&mut alice, &mut bob);
    assert_eq!(alice.negotiated_track_pairs().len(), 2);

    let removed = alice.remove_track(1).unwrap();
    assert_eq!(removed.media_type, MediaType::Video);
    let levels: Vec<usize> = alice.negotiated_track_pairs().iter().map(|p| p.level).collect();
    assert_eq!(levels, vec![0]);

    let (offer, answer) = exchange(&mut alice, &mut bob);
    assert!(offer.contains("m=video 0 UDP/TLS/RTP/SAVPF\r\n"));
    assert!(answer.contains("m=video 0 UDP/TLS/RTP/SAVPF\r\n"));
    assert_eq!(alice.negotiated_track_pairs().len(), 1);
    assert!(alice.rejected_levels().contains(&1));

    // Retired levels stay retired
    let again = alice.create_offer(&OfferOptions::default()).unwrap();
    assert!(again.contains("m=video 0 UDP/TLS/RTP/SAVPF\r\n"));
}

#[test]
fn test_track_on_rejected_level_is_offered_again() {
    let mut alice = session("alice");
    let mut bob = session("bob");
    alice.add_track(Track::new(MediaType::Video).with_codecs(vec![video_codec(96, "VP8")])).unwrap();
    bob.add_track(Track::new(MediaType::Video)).unwrap();

    // Bob only knows VP8 as 120, so the level is rejected
    let (_, answer) = exchange(&mut alice, &mut bob);
    assert!(answer.contains("m=video 0 UDP/TLS/RTP/SAVPF\r\n"));
    assert!(alice.rejected_levels().contains(&0));
    assert!(alice.negotiated_track_pairs().is_empty());
    assert_eq!(alice.local_tracks()[0].level(), None);
    assert_eq!(bob.local_tracks()[0].level(), None);

    let offer = alice.create_offer(&OfferOptions::default()).unwrap();
    assert!(offer.contains("m=video 0 UDP/TLS/RTP/SAVPF\r\n"));
    assert!(offer.contains("m=video 9 UDP/TLS/RTP/SAVPF 96\r\n"));
    assert!(offer.contains("a=mid:sdparta_1\r\n"));
    assert_eq!(alice.local_tracks()[0].level(), Some(1));
    alice.set_local_description(SdpType::Offer, &offer).unwrap();
}

#[test]
fn test_replace_track_moves_to_new_level() {
    let mut alice = session("alice");
    let mut bob = session("bob");
    alice.add_track(Track::new(MediaType::Audio)).unwrap();
    bob.add_track(Track::new(MediaType::Audio)).unwrap();
    exchange(&mut alice, &mut bob);

    let replacement = Track::new(MediaType::Audio).with_id("replacement");
    let old = alice.replace_track(0, replacement).unwrap();
    assert_eq!(old.level(), Some(0));
    assert_eq!(alice.local_tracks()[0].level(), None);

    let offer = alice.create_offer(&OfferOptions::default()).unwrap();
    assert!(offer.contains("m=audio 0 UDP/TLS/RTP/SAVPF\r\n"));
    assert!(offer.contains("a=mid:sdparta_1\r\n"));
    assert_eq!(alice.local_tracks()[0].level(), Some(1));

    alice.set_local_description(SdpType::Offer, &offer).unwrap();
    bob.set_remote_description(SdpType::Offer, &offer).unwrap();
    assert!(bob.remote_tracks().iter().any(|t| t.id == "replacement" && t.level() == Some(1)));
    let answer = bob.create_answer(&AnswerOptions::default()).unwrap();
    bob.set_local_description(SdpType::Answer, &answer).unwrap();
    alice.set_remote_description(SdpType::Answer, &answer).unwrap();

    let pairs = alice.negotiated_track_pairs();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].level, 1);
    assert_eq!(pairs[0].sending.as_ref().map(|t| t.id.as_str()), Some("replacement"));
    assert!(alice.rejected_levels().contains(&0));
}

#[test]
fn test_remote_candidate_by_mid() {
    let mut alice = session("alice");
    let mut bob = session("bob");
    alice.add_track(Track::new(MediaType::Audio)).unwrap();
    bob.add_track(Track::new(MediaType::Audio)).unwrap();
    exchange(&mut alice, &mut bob);

    // The mid wins over a bogus level
    alice
        .add_remote_ice_candidate("candidate:1 1 UDP 2130706431 192.0.2.7 5000 typ host", Some("sdparta_0"), 7)
        .unwrap();
    let candidates = alice.negotiated_track_pairs()[0].rtp_transport.candidates();
    assert!(candidates.iter().any(|c| c.contains("192.0.2.7")));
    assert!(alice.remote_description().unwrap().contains("192.0.2.7 5000 typ host"));

    // Unknown mid falls back to the level
    alice
        .add_remote_ice_candidate("a=candidate:2 1 UDP 2130706431 192.0.2.8 5000 typ host", Some("nope"), 0)
        .unwrap();
    assert_eq!(alice.negotiated_track_pairs()[0].rtp_transport.candidates().len(), 2);

    let err = alice
        .add_remote_ice_candidate("candidate:3 1 UDP 2130706431 192.0.2.9 5000 typ host", Some("nope"), 7)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(alice.add_remote_ice_candidate("garbage", None, 0).is_err());
}

#[test]
fn test_rtcp_mux_shares_transport() {
    let mut alice = session("alice");
    let mut bob = session("bob");
    alice.add_track(Track::new(MediaType::Audio)).unwrap();
    bob.add_track(Track::new(MediaType::Audio)).unwrap();
    exchange(&mut alice, &mut bob);

    let pair = &alice.negotiated_track_pairs()[0];
    assert!(pair.is_rtcp_muxed());
    assert_eq!(pair.rtp_transport.component(), Component::Rtp);
}

#[test]
fn test_without_rtcp_mux_gets_separate_transport() {
    let mut alice = session_with(
        JsepConfig::new("alice")
            .with_ice_credentials("aliceufrag", common::PWD)
            .with_rtcp_mux(false),
    );
    let mut bob = session("bob");
    alice.add_track(Track::new(MediaType::Audio)).unwrap();
    bob.add_track(Track::new(MediaType::Audio)).unwrap();
    let (offer, answer) = exchange(&mut alice, &mut bob);
    assert!(!offer.contains("a=rtcp-mux"));
    assert!(!answer.contains("a=rtcp-mux"));

    for session in [&alice, &bob] {
        let pair = &session.negotiated_track_pairs()[0];
        assert!(!pair.is_rtcp_muxed());
        let rtcp = pair.rtcp_transport.as_ref().unwrap();
        assert_eq!(rtcp.component(), Component::Rtcp);
        assert_eq!(rtcp.level(), 0);
        assert_eq!(session.transports().len(), 2);
    }
}

#[test]
fn test_offer_to_receive_adds_recvonly_sections() {
    let mut alice = session("alice");
    let mut bob = session("bob");
    alice.add_track(Track::new(MediaType::Audio)).unwrap();

    let options = OfferOptions::default().receive_audio(1).receive_video(2);
    let (offer, answer) = exchange_with(&mut alice, &mut bob, &options);
    assert_eq!(offer.matches("m=audio ").count(), 1);
    assert_eq!(offer.matches("m=video ").count(), 2);
    assert_eq!(offer.matches("a=recvonly\r\n").count(), 2);
    assert!(offer.contains("a=mid:sdparta_2\r\n"));

    // Bob has nothing to send, so he only receives audio
    assert!(answer.contains("a=recvonly\r\n"));
    assert!(bob.remote_tracks().iter().all(|t| t.media_type == MediaType::Audio));
    let alice_pair = &alice.negotiated_track_pairs()[0];
    assert!(alice_pair.sending.is_some());
    assert!(alice_pair.receiving.is_none());
}

#[test]
fn test_data_channel_section() {
    let mut alice = session("alice");
    let mut bob = session("bob");
    alice.add_track(Track::new(MediaType::Application)).unwrap();

    let (offer, answer) = exchange(&mut alice, &mut bob);
    assert!(offer.contains("m=application 9 DTLS/SCTP 5000\r\n"));
    assert!(offer.contains("a=sctpmap:5000 webrtc-datachannel 256\r\n"));
    assert!(answer.contains("m=application 9 DTLS/SCTP 5000\r\n"));

    let pair = &alice.negotiated_track_pairs()[0];
    assert!(pair.rtcp_transport.is_none());
    assert!(pair.negotiated_codecs.is_empty());
    assert!(bob.remote_tracks().is_empty());
}

#[test]
fn test_configure_media_with_external_codecs() {
    let mut alice = session("alice");
    let mut video_first: Vec<CodecDescription> =
        default_codecs().into_iter().filter(|c| c.media_type == MediaType::Video).collect();
    video_first.reverse();
    let mut bob = session_with(
        JsepConfig::new("bob")
            .with_ice_credentials("bobufrag", common::PWD)
            .with_codecs(video_first),
    );
    alice.add_track(Track::new(MediaType::Video)).unwrap();
    bob.add_track(Track::new(MediaType::Video)).unwrap();
    exchange(&mut alice, &mut bob);

    // Both sides follow Bob's preference and send H264, which needs an external encoder
    let send = CodecConfigKey::new(0, PipelineDirection::Send);
    let receive = CodecConfigKey::new(0, PipelineDirection::Receive);
    for session in [&alice, &bob] {
        let config = session.configure_media(&ExternalCodecRegistry::new());
        assert!(matches!(config.failure(&send), Some(Error::Negotiation(_))));
        assert!(config.get(&send).is_none());
        assert_eq!(names(config.get(&receive).unwrap()), vec!["VP8"]);
    }

    // Encoder only: Alice can send H264 but receives VP8 alone
    let mut encode_only = ExternalCodecRegistry::new();
    encode_only.register_encoder("H264");
    let config = alice.configure_media(&encode_only);
    assert!(config.is_complete());
    assert_eq!(names(config.get(&send).unwrap()), vec!["H264"]);
    assert_eq!(names(config.get(&receive).unwrap()), vec!["VP8"]);

    let mut registry = ExternalCodecRegistry::new();
    registry.register("H264");
    let config = bob.configure_media(&registry);
    assert!(config.is_complete());
    assert_eq!(names(config.get(&send).unwrap()), vec!["H264"]);
    assert_eq!(names(config.get(&receive).unwrap()), vec!["H264", "VP8"]);
}

#[test]
fn test_missing_encoder_leaves_other_levels_configured() {
    let mut alice = session("alice");
    let mut preferred: Vec<CodecDescription> = default_codecs();
    preferred.sort_by_key(|c| c.name != "H264");
    let mut bob = session_with(
        JsepConfig::new("bob")
            .with_ice_credentials("bobufrag", common::PWD)
            .with_codecs(preferred),
    );
    alice.add_track(Track::new(MediaType::Audio)).unwrap();
    alice.add_track(Track::new(MediaType::Video)).unwrap();
    bob.add_track(Track::new(MediaType::Audio)).unwrap();
    bob.add_track(Track::new(MediaType::Video)).unwrap();
    exchange(&mut alice, &mut bob);

    let config = alice.configure_media(&ExternalCodecRegistry::new());
    assert!(!config.is_complete());
    assert_eq!(config.failures.len(), 1);
    assert!(config.failure(&CodecConfigKey::new(1, PipelineDirection::Send)).is_some());

    assert_eq!(names(config.get(&CodecConfigKey::new(0, PipelineDirection::Send)).unwrap()), vec!["opus"]);
    assert!(config.get(&CodecConfigKey::new(0, PipelineDirection::Receive)).is_some());
    assert_eq!(names(config.get(&CodecConfigKey::new(1, PipelineDirection::Receive)).unwrap()), vec!["VP8"]);
}
