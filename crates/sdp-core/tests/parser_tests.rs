// Tests for the document parser through the public API

use bytes::Bytes;
use jsep_sdp_core::prelude::*;
use jsep_sdp_core::{parse_bytes, AddressType, HashAlgorithm};

const PCMU_OFFER: &str =
    "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\nm=audio 9 RTP/AVP 0\r\na=rtpmap:0 PCMU/8000\r\n";

const BROWSER_OFFER: &str = "v=0\r\n\
o=mozilla...THIS_IS_SDPARTA-99.0 6206186223460127072 0 IN IP4 0.0.0.0\r\n\
s=-\r\n\
t=0 0\r\n\
a=fingerprint:sha-256 0D:2B:94:6F:6D:1A:3F:8E:0C:45:C7:45:1E:F4:4B:0B:8C:0F:3E:1D:42:1A:98:1E:60:D1:A4:F4:A3:58:2C:7A\r\n\
a=group:BUNDLE 0 1\r\n\
a=ice-options:trickle\r\n\
a=msid-semantic:WMS *\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 109 9 0 8 101\r\n\
c=IN IP4 0.0.0.0\r\n\
a=sendrecv\r\n\
a=extmap:1 urn:ietf:params:rtp-hdrext:ssrc-audio-level\r\n\
a=extmap:2/recvonly urn:ietf:params:rtp-hdrext:csrc-audio-level\r\n\
a=fmtp:109 maxplaybackrate=48000;stereo=1;useinbandfec=1\r\n\
a=fmtp:101 0-15\r\n\
a=ice-pwd:5f4c5b33a8e7b2b8bb4d6b1f1c4a0f77\r\n\
a=ice-ufrag:8a1a3d58\r\n\
a=mid:0\r\n\
a=msid:{7f4d7a1e-0c1b-4d3e-9a0a-5e3b7c2f1d00} {a1b2c3d4-0000-1111-2222-333344445555}\r\n\
a=rtcp-mux\r\n\
a=rtpmap:109 opus/48000/2\r\n\
a=rtpmap:9 G722/8000/1\r\n\
a=rtpmap:0 PCMU/8000\r\n\
a=rtpmap:8 PCMA/8000\r\n\
a=rtpmap:101 telephone-event/8000\r\n\
a=setup:actpass\r\n\
a=ssrc:3421736290 cname:{0d1e9b2a-4a4f-4a51-9c0b-57b3c3a9a7d2}\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 120 126\r\n\
c=IN IP4 0.0.0.0\r\n\
a=recvonly\r\n\
a=fmtp:126 profile-level-id=42e01f;level-asymmetry-allowed=1;packetization-mode=1\r\n\
a=ice-pwd:5f4c5b33a8e7b2b8bb4d6b1f1c4a0f77\r\n\
a=ice-ufrag:8a1a3d58\r\n\
a=mid:1\r\n\
a=rtcp-fb:120 nack\r\n\
a=rtcp-fb:120 nack pli\r\n\
a=rtcp-fb:120 ccm fir\r\n\
a=rtcp-fb:126 nack\r\n\
a=rtcp-mux\r\n\
a=rtpmap:120 VP8/90000\r\n\
a=rtpmap:126 H264/90000\r\n\
a=setup:actpass\r\n\
a=candidate:0 1 UDP 2122252543 192.168.1.10 50123 typ host\r\n\
a=candidate:1 1 UDP 1686052863 203.0.113.7 50123 typ srflx raddr 192.168.1.10 rport 50123\r\n\
a=end-of-candidates\r\n";

#[test]
fn test_pcmu_offer_yields_single_audio_section() {
    let result = parse(PCMU_OFFER);
    assert!(result.diagnostics.is_empty());

    let sdp = result.description.unwrap();
    assert_eq!(sdp.media_sections.len(), 1);

    let audio = &sdp.media_sections[0];
    assert_eq!(audio.media_type, MediaType::Audio);
    assert_eq!(audio.formats, vec!["0"]);

    let rtpmap = audio.attributes.get_rtpmap("0").unwrap();
    assert_eq!(rtpmap.encoding_name, "PCMU");
    assert_eq!(rtpmap.clock_rate, 8000);
    assert_eq!(rtpmap.channels, 1);
}

#[test]
fn test_empty_and_garbage_input_have_stable_diagnostics() {
    for input in ["", "this is not sdp at all", "\r\n\r\n", "x=1\r\ny=2\r\n"] {
        let first = parse(input);
        let second = parse(input);

        assert!(first.description.is_none(), "input {:?} produced a document", input);
        assert!(!first.diagnostics.is_empty(), "input {:?} produced no diagnostics", input);
        assert_eq!(first.diagnostics.len(), second.diagnostics.len());
        assert_eq!(first.diagnostics, second.diagnostics);
    }
}

#[test]
fn test_from_str_error_carries_diagnostics() {
    let err = "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\n".parse::<SessionDescription>().unwrap_err();
    match &err {
        Error::Parse { diagnostics, .. } => assert!(diagnostics.iter().any(|d| d.severity == Severity::Error)),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_browser_offer() {
    let result = parse(BROWSER_OFFER);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let sdp = result.description.unwrap();

    assert_eq!(sdp.origin.session_id, 6206186223460127072);
    assert_eq!(sdp.origin.address_type, AddressType::IP4);
    assert_eq!(sdp.attributes.ice_options(), ["trickle".to_string()]);

    let fingerprint = sdp.attributes.get_fingerprint().unwrap();
    assert_eq!(fingerprint.hash, HashAlgorithm::Sha256);
    assert_eq!(fingerprint.digest.len(), 32);

    let group = &sdp.attributes.groups()[0];
    assert_eq!(group.semantics, "BUNDLE");
    assert_eq!(group.tags, vec!["0", "1"]);

    let audio = &sdp.media_sections[0];
    assert_eq!(audio.formats, vec!["109", "9", "0", "8", "101"]);
    assert_eq!(audio.attributes.extmaps().len(), 2);
    assert_eq!(audio.attributes.extmaps()[1].direction, Some(MediaDirection::RecvOnly));
    assert_eq!(audio.attributes.get_rtpmap("109").map(|r| r.channels), Some(2));
    assert_eq!(
        audio.attributes.get_fmtp("109").and_then(|f| f.parameter("useinbandfec")),
        Some("1")
    );
    assert_eq!(audio.attributes.msids().len(), 1);
    assert_eq!(audio.attributes.get_setup(), Some(SetupRole::Actpass));

    let video = &sdp.media_sections[1];
    assert_eq!(video.direction(), MediaDirection::RecvOnly);
    assert_eq!(video.attributes.rtcp_fbs("120").len(), 3);
    assert_eq!(video.attributes.rtcp_fbs("126").len(), 1);
    assert_eq!(video.attributes.candidates().len(), 2);
    assert!(video.attributes.is_end_of_candidates());

    assert_eq!(sdp.level_for_mid("1"), Some(1));
}

#[test]
fn test_invalid_attribute_values_are_dropped_with_diagnostics() {
    let text = format!(
        "{}a=rtpmap:8 PCMA\r\na=fingerprint:sha-999 AA:BB\r\na=setup:sideways\r\na=ptime:20\r\n",
        PCMU_OFFER
    );
    let result = parse(&text);
    let sdp = result.description.clone().unwrap();
    let audio = &sdp.media_sections[0];

    assert!(audio.attributes.get_rtpmap("8").is_none());
    assert!(audio.attributes.fingerprints().is_empty());
    assert_eq!(audio.attributes.get_setup(), None);
    assert_eq!(audio.attributes.ptime(), Some(20));

    let errors: Vec<usize> = result.errors().map(|d| d.line).collect();
    assert_eq!(errors, vec![7, 8, 9]);
}

#[test]
fn test_misplaced_attributes() {
    let text = "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\na=mid:0\r\na=rtpmap:0 PCMU/8000\r\n\
                m=audio 9 RTP/AVP 0\r\na=ice-lite\r\n";
    let result = parse(text);
    let sdp = result.description.clone().unwrap();

    assert!(sdp.attributes.is_empty());
    assert!(!sdp.media_sections[0].attributes.is_ice_lite());
    let errors: Vec<usize> = result.errors().map(|d| d.line).collect();
    assert_eq!(errors, vec![5, 6, 8]);
}

#[test]
fn test_parse_bytes() {
    let result = parse_bytes(&Bytes::from_static(PCMU_OFFER.as_bytes()));
    assert!(result.description.is_some());
}

#[test]
fn test_missing_connection_is_not_fatal() {
    let sdp: SessionDescription = PCMU_OFFER.parse().unwrap();
    assert!(sdp.connection.is_none());
    assert!(sdp.connection_for(0).is_none());
}

#[test]
fn test_description_serializes_to_json() {
    let sdp: SessionDescription = PCMU_OFFER.parse().unwrap();
    let json = serde_json::to_string(&sdp).unwrap();
    let back: SessionDescription = serde_json::from_str(&json).unwrap();
    assert_eq!(back, sdp);
}
