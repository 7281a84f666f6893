//! Session configuration
//!
//! [`JsepConfig`] is plain serde data so it can be loaded from JSON or built in
//! code with the `with_*` methods. Call [`JsepConfig::validate`] before use;
//! [`crate::JsepSession::new`] does this for you.

use jsep_sdp_core::attributes::common::is_ice_char;
use jsep_sdp_core::{Protocol, SetupRole};
use serde::{Deserialize, Serialize};

use crate::codec::CodecDescription;
use crate::error::{Error, Result};

/// Minimum ICE ufrag length (RFC 5245 Section 15.4)
pub const MIN_ICE_UFRAG_LEN: usize = 4;
/// Minimum ICE password length (RFC 5245 Section 15.4)
pub const MIN_ICE_PWD_LEN: usize = 22;

/// Configuration for one [`crate::JsepSession`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsepConfig {
    /// Name used in logs
    pub name: String,
    /// Fixed ICE ufrag; generated when absent
    pub ice_ufrag: Option<String>,
    /// Fixed ICE password; generated when absent
    pub ice_pwd: Option<String>,
    /// Protocol token for offered RTP sections
    pub media_protocol: Protocol,
    /// Offer and accept rtcp-mux
    pub rtcp_mux: bool,
    /// Setup role we answer with when the offer says actpass
    pub answer_setup: SetupRole,
    /// o= username
    pub origin_username: String,
    /// o= unicast address
    pub origin_address: String,
    /// Replaces the default codec table
    pub codecs: Option<Vec<CodecDescription>>,
}

impl Default for JsepConfig {
    fn default() -> Self {
        JsepConfig {
            name: "jsep".to_string(),
            ice_ufrag: None,
            ice_pwd: None,
            media_protocol: Protocol::UdpTlsRtpSavpf,
            rtcp_mux: true,
            answer_setup: SetupRole::Active,
            origin_username: "-".to_string(),
            origin_address: "0.0.0.0".to_string(),
            codecs: None,
        }
    }
}

impl JsepConfig {
    pub fn new(name: impl Into<String>) -> Self {
        JsepConfig {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_ice_credentials(mut self, ufrag: impl Into<String>, pwd: impl Into<String>) -> Self {
        self.ice_ufrag = Some(ufrag.into());
        self.ice_pwd = Some(pwd.into());
        self
    }

    pub fn with_media_protocol(mut self, protocol: Protocol) -> Self {
        self.media_protocol = protocol;
        self
    }

    pub fn with_rtcp_mux(mut self, enabled: bool) -> Self {
        self.rtcp_mux = enabled;
        self
    }

    pub fn with_answer_setup(mut self, role: SetupRole) -> Self {
        self.answer_setup = role;
        self
    }

    pub fn with_codecs(mut self, codecs: Vec<CodecDescription>) -> Self {
        self.codecs = Some(codecs);
        self
    }

    /// Load from a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: JsepConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        match (&self.ice_ufrag, &self.ice_pwd) {
            (Some(ufrag), Some(pwd)) => {
                if ufrag.len() < MIN_ICE_UFRAG_LEN {
                    return Err(Error::Config(format!(
                        "ICE ufrag must be at least {} characters",
                        MIN_ICE_UFRAG_LEN
                    )));
                }
                if pwd.len() < MIN_ICE_PWD_LEN {
                    return Err(Error::Config(format!(
                        "ICE password must be at least {} characters",
                        MIN_ICE_PWD_LEN
                    )));
                }
                if !valid_ice_credentials(ufrag, pwd) {
                    return Err(Error::Config("ICE credentials may only use ALPHA, DIGIT, '+' and '/'".to_string()));
                }
            }
            (None, None) => {}
            _ => {
                return Err(Error::Config(
                    "ICE ufrag and password must be configured together".to_string(),
                ));
            }
        }

        if !matches!(self.answer_setup, SetupRole::Active | SetupRole::Passive) {
            return Err(Error::Config(format!(
                "Answer setup role must be active or passive, got {}",
                self.answer_setup
            )));
        }

        if self.origin_username.is_empty() || self.origin_username.contains(char::is_whitespace) {
            return Err(Error::Config("Origin username must be a single non-empty token".to_string()));
        }

        if let Some(codecs) = &self.codecs {
            if let Some(codec) = codecs.iter().find(|codec| codec.default_pt > 127) {
                return Err(Error::Config(format!("Payload type out of range for {}", codec)));
            }
        }
        Ok(())
    }
}

/// Length and character checks for an ICE ufrag/password pair
pub fn valid_ice_credentials(ufrag: &str, pwd: &str) -> bool {
    ufrag.len() >= MIN_ICE_UFRAG_LEN
        && pwd.len() >= MIN_ICE_PWD_LEN
        && ufrag.chars().chain(pwd.chars()).all(is_ice_char)
}

/// Options for [`crate::JsepSession::create_offer`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferOptions {
    /// Total audio sections wanted for receiving, including sending ones
    pub offer_to_receive_audio: Option<u32>,
    /// Total video sections wanted for receiving, including sending ones
    pub offer_to_receive_video: Option<u32>,
}

impl OfferOptions {
    pub fn receive_audio(mut self, count: u32) -> Self {
        self.offer_to_receive_audio = Some(count);
        self
    }

    pub fn receive_video(mut self, count: u32) -> Self {
        self.offer_to_receive_video = Some(count);
        self
    }
}

/// Options for [`crate::JsepSession::create_answer`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOptions {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = JsepConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.rtcp_mux);
        assert_eq!(config.media_protocol, Protocol::UdpTlsRtpSavpf);
    }

    #[test]
    fn test_ice_credential_lengths() {
        let short = JsepConfig::default().with_ice_credentials("abc", "0123456789012345678901");
        assert!(matches!(short.validate(), Err(Error::Config(_))));

        let ok = JsepConfig::default().with_ice_credentials("abcd", "0123456789012345678901");
        assert!(ok.validate().is_ok());

        let dashed = JsepConfig::default().with_ice_credentials("ab-cd", "0123456789012345678901");
        assert!(dashed.validate().is_err());

        let half = JsepConfig {
            ice_ufrag: Some("abcd".to_string()),
            ..Default::default()
        };
        assert!(half.validate().is_err());
    }

    #[test]
    fn test_answer_setup_must_be_concrete() {
        let config = JsepConfig::default().with_answer_setup(SetupRole::Actpass);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = JsepConfig::new("caller").with_rtcp_mux(false);
        let json = config.to_json().unwrap();
        assert_eq!(JsepConfig::from_json(&json).unwrap(), config);

        let partial = JsepConfig::from_json(r#"{"name": "callee"}"#).unwrap();
        assert_eq!(partial.name, "callee");
        assert_eq!(partial.origin_address, "0.0.0.0");

        assert!(matches!(JsepConfig::from_json("{"), Err(Error::Config(_))));
    }

    #[test]
    fn test_offer_options() {
        let options = OfferOptions::default().receive_audio(1).receive_video(2);
        assert_eq!(options.offer_to_receive_audio, Some(1));
        assert_eq!(options.offer_to_receive_video, Some(2));
    }
}
