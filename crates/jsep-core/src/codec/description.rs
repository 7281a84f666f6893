//! Codec descriptions
//!
//! A [`CodecDescription`] is one entry of a session's codec table: what we can
//! send or receive, which payload type we offer it under, and the extra
//! parameters (RTCP feedback, H.264 fmtp) that travel with it.

use std::fmt;

use jsep_sdp_core::{Attribute, Fmtp, MediaSection, MediaType, RtcpFb, Rtpmap};
use serde::{Deserialize, Serialize};

/// H.264 format parameters (RFC 6184 Section 8.1)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct H264Parameters {
    pub profile_level_id: u32,
    pub packetization_mode: u8,
    pub level_asymmetry_allowed: bool,
    pub max_mbps: Option<u32>,
    pub max_fs: Option<u32>,
    pub max_cpb: Option<u32>,
    pub max_dpb: Option<u32>,
    pub max_br: Option<u32>,
    pub sprop_parameter_sets: Option<String>,
}

impl Default for H264Parameters {
    fn default() -> Self {
        H264Parameters {
            // Constrained baseline, level 3.1
            profile_level_id: 0x42e01f,
            packetization_mode: 1,
            level_asymmetry_allowed: false,
            max_mbps: None,
            max_fs: None,
            max_cpb: None,
            max_dpb: None,
            max_br: None,
            sprop_parameter_sets: None,
        }
    }
}

impl H264Parameters {
    /// Read parameters from an fmtp value, keeping defaults for anything absent or unreadable
    pub fn from_fmtp(fmtp: &Fmtp) -> Self {
        let mut params = H264Parameters::default();
        let number = |name: &str| fmtp.parameter(name).and_then(|v| v.parse::<u32>().ok());

        if let Some(id) = fmtp
            .parameter("profile-level-id")
            .and_then(|v| u32::from_str_radix(v, 16).ok())
        {
            params.profile_level_id = id;
        }
        if let Some(mode) = fmtp.parameter("packetization-mode").and_then(|v| v.parse::<u8>().ok()) {
            params.packetization_mode = mode;
        }
        params.level_asymmetry_allowed = fmtp.parameter("level-asymmetry-allowed") == Some("1");
        params.max_mbps = number("max-mbps");
        params.max_fs = number("max-fs");
        params.max_cpb = number("max-cpb");
        params.max_dpb = number("max-dpb");
        params.max_br = number("max-br");
        params.sprop_parameter_sets = fmtp.parameter("sprop-parameter-sets").map(str::to_string);
        params
    }
}

impl fmt::Display for H264Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "profile-level-id={:06x};packetization-mode={}",
            self.profile_level_id, self.packetization_mode
        )?;
        if self.level_asymmetry_allowed {
            write!(f, ";level-asymmetry-allowed=1")?;
        }
        let optional = [
            ("max-mbps", self.max_mbps),
            ("max-fs", self.max_fs),
            ("max-cpb", self.max_cpb),
            ("max-dpb", self.max_dpb),
            ("max-br", self.max_br),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                write!(f, ";{}={}", name, value)?;
            }
        }
        if let Some(sets) = &self.sprop_parameter_sets {
            write!(f, ";sprop-parameter-sets={}", sets)?;
        }
        Ok(())
    }
}

/// One codec a session can negotiate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecDescription {
    pub media_type: MediaType,
    /// Payload type offered for this codec
    pub default_pt: u8,
    pub name: String,
    pub clock_rate: u32,
    pub channels: u16,
    pub enabled: bool,
    /// RTCP feedback values, e.g. `nack`, `nack pli`, `ccm fir`
    #[serde(default)]
    pub rtcp_fb: Vec<String>,
    #[serde(default)]
    pub h264: Option<H264Parameters>,
    /// Encoder and decoder come from the external codec registry
    #[serde(default)]
    pub requires_external: bool,
}

impl CodecDescription {
    pub fn new(media_type: MediaType, default_pt: u8, name: impl Into<String>, clock_rate: u32, channels: u16) -> Self {
        CodecDescription {
            media_type,
            default_pt,
            name: name.into(),
            clock_rate,
            channels: channels.max(1),
            enabled: true,
            rtcp_fb: Vec::new(),
            h264: None,
            requires_external: false,
        }
    }

    pub fn with_rtcp_fb(mut self, feedback: &[&str]) -> Self {
        self.rtcp_fb = feedback.iter().map(|fb| fb.to_string()).collect();
        self
    }

    pub fn with_h264(mut self, params: H264Parameters) -> Self {
        self.h264 = Some(params);
        self
    }

    pub fn external(mut self) -> Self {
        self.requires_external = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The format token this codec is offered under
    pub fn pt_token(&self) -> String {
        self.default_pt.to_string()
    }

    pub fn matches_format(&self, token: &str) -> bool {
        token.parse::<u8>().is_ok_and(|pt| pt == self.default_pt)
    }

    pub fn to_rtpmap(&self) -> Rtpmap {
        Rtpmap {
            payload_type: self.default_pt,
            encoding_name: self.name.clone(),
            clock_rate: self.clock_rate,
            channels: self.channels,
        }
    }

    pub fn to_fmtp(&self) -> Option<Fmtp> {
        self.h264.as_ref().map(|params| Fmtp {
            format: self.pt_token(),
            parameters: params.to_string(),
        })
    }

    pub fn to_rtcp_fbs(&self) -> Vec<RtcpFb> {
        let pt = self.pt_token();
        self.rtcp_fb
            .iter()
            .map(|fb| match fb.split_once(' ') {
                Some((kind, param)) => RtcpFb::new(pt.as_str(), kind, Some(param)),
                None => RtcpFb::new(pt.as_str(), fb.as_str(), None),
            })
            .collect()
    }

    /// Append format, rtpmap, fmtp and rtcp-fb lines for this codec to `section`
    pub fn add_to_section(&self, section: &mut MediaSection) {
        section.formats.push(self.pt_token());
        section.attributes.set_attribute(Attribute::Rtpmap(self.to_rtpmap()));
        if let Some(fmtp) = self.to_fmtp() {
            section.attributes.set_attribute(Attribute::Fmtp(fmtp));
        }
        for fb in self.to_rtcp_fbs() {
            section.attributes.set_attribute(Attribute::RtcpFb(fb));
        }
    }

    /// This codec as agreed with a remote section that lists its payload type
    ///
    /// Remote H.264 fmtp parameters replace ours; RTCP feedback is cut down to
    /// what both sides listed.
    pub fn negotiate_with(&self, remote: &MediaSection) -> CodecDescription {
        let mut negotiated = self.clone();
        let pt = self.pt_token();

        if self.h264.is_some() {
            if let Some(fmtp) = remote.attributes.get_fmtp(&pt) {
                negotiated.h264 = Some(H264Parameters::from_fmtp(fmtp));
            }
        }

        let remote_fb: Vec<String> = remote
            .attributes
            .rtcp_fbs(&pt)
            .into_iter()
            .map(|fb| fb.feedback())
            .collect();
        negotiated.rtcp_fb.retain(|fb| remote_fb.contains(fb));
        negotiated
    }
}

impl fmt::Display for CodecDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.clock_rate)?;
        if self.channels != 1 {
            write!(f, "/{}", self.channels)?;
        }
        write!(f, " (pt {})", self.default_pt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsep_sdp_core::Protocol;

    fn vp8() -> CodecDescription {
        CodecDescription::new(MediaType::Video, 120, "VP8", 90000, 1).with_rtcp_fb(&["nack", "nack pli", "ccm fir"])
    }

    #[test]
    fn test_matches_format() {
        let codec = vp8();
        assert!(codec.matches_format("120"));
        assert!(!codec.matches_format("12"));
        assert!(!codec.matches_format("VP8"));
    }

    #[test]
    fn test_add_to_section() {
        let mut section = MediaSection::new(MediaType::Video, 9, Protocol::UdpTlsRtpSavpf);
        let h264 = CodecDescription::new(MediaType::Video, 126, "H264", 90000, 1).with_h264(H264Parameters::default());
        vp8().add_to_section(&mut section);
        h264.add_to_section(&mut section);

        assert_eq!(section.formats, vec!["120", "126"]);
        assert_eq!(section.attributes.rtcp_fbs("120").len(), 3);
        let fmtp = section.attributes.get_fmtp("126").unwrap();
        assert_eq!(fmtp.parameters, "profile-level-id=42e01f;packetization-mode=1");
    }

    #[test]
    fn test_negotiate_with_intersects_feedback() {
        let mut remote = MediaSection::new(MediaType::Video, 9, Protocol::UdpTlsRtpSavpf);
        remote.formats.push("120".to_string());
        remote
            .attributes
            .set_attribute(Attribute::RtcpFb(RtcpFb::new("120", "nack", Some("pli"))));
        remote.attributes.set_attribute(Attribute::RtcpFb(RtcpFb::new("*", "ccm", Some("fir"))));

        let negotiated = vp8().negotiate_with(&remote);
        assert_eq!(negotiated.rtcp_fb, vec!["nack pli", "ccm fir"]);
    }

    #[test]
    fn test_h264_parameters_from_fmtp() {
        let fmtp = Fmtp {
            format: "97".to_string(),
            parameters: "profile-level-id=640c1f;packetization-mode=0;level-asymmetry-allowed=1;max-fs=3600".to_string(),
        };
        let params = H264Parameters::from_fmtp(&fmtp);
        assert_eq!(params.profile_level_id, 0x640c1f);
        assert_eq!(params.packetization_mode, 0);
        assert!(params.level_asymmetry_allowed);
        assert_eq!(params.max_fs, Some(3600));
        assert_eq!(
            params.to_string(),
            "profile-level-id=640c1f;packetization-mode=0;level-asymmetry-allowed=1;max-fs=3600"
        );
    }
}
