//! Attribute multimap
//!
//! [`AttributeList`] maps each [`AttributeKind`] to the values present for it.
//! Iteration (and therefore serialization) follows the canonical kind order,
//! so two lists holding the same attributes render identically no matter in
//! which order they were filled. Within a repeatable kind insertion order is
//! kept.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::attribute::{
    Attribute, AttributeKind, Extmap, Fingerprint, Fmtp, Group, MediaDirection, Msid, RtcpFb, Rtpmap,
    SetupRole, Ssrc,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeList {
    entries: BTreeMap<AttributeKind, Vec<Attribute>>,
}

impl AttributeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of attribute values
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the value of a singleton kind, or append to a repeatable kind
    pub fn set_attribute(&mut self, attribute: Attribute) {
        let kind = attribute.kind();
        let values = self.entries.entry(kind).or_default();
        if !kind.is_repeatable() {
            values.clear();
        }
        values.push(attribute);
    }

    /// Remove every value of `kind`, returning what was removed
    pub fn remove_attribute(&mut self, kind: AttributeKind) -> Vec<Attribute> {
        self.entries.remove(&kind).unwrap_or_default()
    }

    /// Keep only the values of `kind` for which `keep` returns true
    pub fn retain(&mut self, kind: AttributeKind, mut keep: impl FnMut(&Attribute) -> bool) {
        if let Some(values) = self.entries.get_mut(&kind) {
            values.retain(|attr| keep(attr));
            if values.is_empty() {
                self.entries.remove(&kind);
            }
        }
    }

    pub fn has_attribute(&self, kind: AttributeKind) -> bool {
        self.entries.get(&kind).is_some_and(|values| !values.is_empty())
    }

    /// Presence check that falls back to `session` for kinds legal at session level
    pub fn has_attribute_with_fallback(&self, kind: AttributeKind, session: &AttributeList) -> bool {
        self.has_attribute(kind) || (kind.allowed_at_session_level() && session.has_attribute(kind))
    }

    pub fn get(&self, kind: AttributeKind) -> &[Attribute] {
        self.entries.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All values in canonical order
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.values().flatten()
    }

    pub fn rtpmaps(&self) -> impl Iterator<Item = &Rtpmap> {
        self.get(AttributeKind::Rtpmap).iter().filter_map(|attr| match attr {
            Attribute::Rtpmap(rtpmap) => Some(rtpmap),
            _ => None,
        })
    }

    pub fn get_rtpmap(&self, payload_type: &str) -> Option<&Rtpmap> {
        self.rtpmaps().find(|rtpmap| rtpmap.payload_type.to_string() == payload_type)
    }

    pub fn fmtps(&self) -> impl Iterator<Item = &Fmtp> {
        self.get(AttributeKind::Fmtp).iter().filter_map(|attr| match attr {
            Attribute::Fmtp(fmtp) => Some(fmtp),
            _ => None,
        })
    }

    pub fn get_fmtp(&self, format: &str) -> Option<&Fmtp> {
        self.fmtps().find(|fmtp| fmtp.format == format)
    }

    pub fn fingerprints(&self) -> Vec<&Fingerprint> {
        self.get(AttributeKind::Fingerprint)
            .iter()
            .filter_map(|attr| match attr {
                Attribute::Fingerprint(fp) => Some(fp),
                _ => None,
            })
            .collect()
    }

    pub fn get_fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprints().into_iter().next()
    }

    pub fn get_setup(&self) -> Option<SetupRole> {
        self.get(AttributeKind::Setup).iter().find_map(|attr| match attr {
            Attribute::Setup(role) => Some(*role),
            _ => None,
        })
    }

    pub fn direction(&self) -> Option<MediaDirection> {
        self.get(AttributeKind::Direction).iter().find_map(|attr| match attr {
            Attribute::Direction(direction) => Some(*direction),
            _ => None,
        })
    }

    pub fn mid(&self) -> Option<&str> {
        self.string_value(AttributeKind::Mid)
    }

    pub fn ice_ufrag(&self) -> Option<&str> {
        self.string_value(AttributeKind::IceUfrag)
    }

    pub fn ice_pwd(&self) -> Option<&str> {
        self.string_value(AttributeKind::IcePwd)
    }

    pub fn identity(&self) -> Option<&str> {
        self.string_value(AttributeKind::Identity)
    }

    pub fn label(&self) -> Option<&str> {
        self.string_value(AttributeKind::Label)
    }

    pub fn ice_options(&self) -> &[String] {
        self.get(AttributeKind::IceOptions)
            .iter()
            .find_map(|attr| match attr {
                Attribute::IceOptions(options) => Some(options.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn candidates(&self) -> Vec<&str> {
        self.get(AttributeKind::Candidate)
            .iter()
            .filter_map(|attr| match attr {
                Attribute::Candidate(candidate) => Some(candidate.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Feedback entries applying to `payload_type`, including wildcard entries
    pub fn rtcp_fbs(&self, payload_type: &str) -> Vec<&RtcpFb> {
        self.get(AttributeKind::RtcpFb)
            .iter()
            .filter_map(|attr| match attr {
                Attribute::RtcpFb(fb) if fb.applies_to(payload_type) => Some(fb),
                _ => None,
            })
            .collect()
    }

    pub fn extmaps(&self) -> Vec<&Extmap> {
        self.get(AttributeKind::Extmap)
            .iter()
            .filter_map(|attr| match attr {
                Attribute::Extmap(extmap) => Some(extmap),
                _ => None,
            })
            .collect()
    }

    pub fn msids(&self) -> Vec<&Msid> {
        self.get(AttributeKind::Msid)
            .iter()
            .filter_map(|attr| match attr {
                Attribute::Msid(msid) => Some(msid),
                _ => None,
            })
            .collect()
    }

    pub fn groups(&self) -> Vec<&Group> {
        self.get(AttributeKind::Group)
            .iter()
            .filter_map(|attr| match attr {
                Attribute::Group(group) => Some(group),
                _ => None,
            })
            .collect()
    }

    pub fn ssrcs(&self) -> Vec<&Ssrc> {
        self.get(AttributeKind::Ssrc)
            .iter()
            .filter_map(|attr| match attr {
                Attribute::Ssrc(ssrc) => Some(ssrc),
                _ => None,
            })
            .collect()
    }

    pub fn ptime(&self) -> Option<u32> {
        self.get(AttributeKind::Ptime).iter().find_map(|attr| match attr {
            Attribute::Ptime(ptime) => Some(*ptime),
            _ => None,
        })
    }

    pub fn max_ptime(&self) -> Option<u32> {
        self.get(AttributeKind::MaxPtime).iter().find_map(|attr| match attr {
            Attribute::MaxPtime(ptime) => Some(*ptime),
            _ => None,
        })
    }

    pub fn is_rtcp_mux(&self) -> bool {
        self.has_attribute(AttributeKind::RtcpMux)
    }

    pub fn is_ice_lite(&self) -> bool {
        self.has_attribute(AttributeKind::IceLite)
    }

    pub fn is_end_of_candidates(&self) -> bool {
        self.has_attribute(AttributeKind::EndOfCandidates)
    }

    /// Opaque attribute lookup by name
    pub fn other(&self, name: &str) -> Option<Option<&str>> {
        self.get(AttributeKind::Other).iter().find_map(|attr| match attr {
            Attribute::Other { name: n, value } if n.eq_ignore_ascii_case(name) => Some(value.as_deref()),
            _ => None,
        })
    }

    fn string_value(&self, kind: AttributeKind) -> Option<&str> {
        self.get(kind).iter().find_map(|attr| match attr {
            Attribute::Mid(s)
            | Attribute::IceUfrag(s)
            | Attribute::IcePwd(s)
            | Attribute::Identity(s)
            | Attribute::Label(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for AttributeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for attribute in self.iter() {
            write!(f, "{}\r\n", attribute)?;
        }
        Ok(())
    }
}

impl FromIterator<Attribute> for AttributeList {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut list = AttributeList::new();
        for attribute in iter {
            list.set_attribute(attribute);
        }
        list
    }
}
