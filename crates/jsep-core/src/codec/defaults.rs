//! Built-in codec table

use jsep_sdp_core::MediaType;

use super::description::{CodecDescription, H264Parameters};

/// Feedback every default video codec asks for
const VIDEO_RTCP_FB: &[&str] = &["nack", "nack pli", "ccm fir"];

/// The codec table a session starts with, in preference order
///
/// Each session gets its own copy; changing one session's table never affects
/// another.
pub fn default_codecs() -> Vec<CodecDescription> {
    vec![
        // Supported audio codecs
        CodecDescription::new(MediaType::Audio, 109, "opus", 48000, 2),
        CodecDescription::new(MediaType::Audio, 9, "G722", 8000, 1),
        CodecDescription::new(MediaType::Audio, 0, "PCMU", 8000, 1),
        CodecDescription::new(MediaType::Audio, 8, "PCMA", 8000, 1),
        // Supported video codecs
        CodecDescription::new(MediaType::Video, 120, "VP8", 90000, 1).with_rtcp_fb(VIDEO_RTCP_FB),
        CodecDescription::new(MediaType::Video, 126, "H264", 90000, 1)
            .with_rtcp_fb(VIDEO_RTCP_FB)
            .with_h264(H264Parameters::default())
            .external(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let codecs = default_codecs();
        let names: Vec<(&str, u8)> = codecs.iter().map(|c| (c.name.as_str(), c.default_pt)).collect();
        assert_eq!(
            names,
            vec![("opus", 109), ("G722", 9), ("PCMU", 0), ("PCMA", 8), ("VP8", 120), ("H264", 126)]
        );
        assert!(codecs.iter().all(|c| c.enabled));
        assert_eq!(codecs[0].channels, 2);
        assert_eq!(codecs[4].clock_rate, 90000);
        assert!(codecs[5].requires_external);
        assert_eq!(
            codecs[5].to_fmtp().map(|f| f.parameters),
            Some("profile-level-id=42e01f;packetization-mode=1".to_string())
        );
    }
}
