//! The voice registry.

use std::collections::BTreeMap;

use serde::Serialize;

/// How a voice came to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceKind {
    /// Shipped with the service and addressed by speaker label.
    Preset,
    /// Cloned from a customer sample.
    Custom { customer_id: Option<String> },
}

impl VoiceKind {
    /// Classifies a manifest entry: a non-empty customer id means custom.
    pub fn from_customer_id(customer_id: &str) -> Self {
        if customer_id.is_empty() {
            VoiceKind::Preset
        } else {
            VoiceKind::Custom {
                customer_id: Some(customer_id.to_string()),
            }
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, VoiceKind::Custom { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceKind::Preset => "preset",
            VoiceKind::Custom { .. } => "custom",
        }
    }
}

/// A registered voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub speaker_label: String,
    pub kind: VoiceKind,
}

/// A voice as presented in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub voice_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub language: &'static str,
}

/// Voice ids known to the service, with their preset/custom tag.
#[derive(Debug, Clone, Default)]
pub struct VoiceRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `voice_id`, replacing any previous entry.
    pub fn insert(&mut self, voice_id: impl Into<String>, speaker_label: impl Into<String>, kind: VoiceKind) {
        self.entries.insert(
            voice_id.into(),
            RegistryEntry {
                speaker_label: speaker_label.into(),
                kind,
            },
        );
    }

    /// Removes `voice_id`. Returns false if it was not registered.
    pub fn remove(&mut self, voice_id: &str) -> bool {
        self.entries.remove(voice_id).is_some()
    }

    pub fn get(&self, voice_id: &str) -> Option<&RegistryEntry> {
        self.entries.get(voice_id)
    }

    pub fn contains(&self, voice_id: &str) -> bool {
        self.entries.contains_key(voice_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lists every voice, ordered by voice id.
    pub fn list(&self) -> Vec<VoiceInfo> {
        self.entries
            .iter()
            .map(|(id, e)| VoiceInfo {
                id: id.clone(),
                name: e.speaker_label.clone(),
                voice_type: e.kind.as_str(),
                customer_id: match &e.kind {
                    VoiceKind::Custom { customer_id } => customer_id.clone(),
                    VoiceKind::Preset => None,
                },
                language: language_hint(&e.speaker_label),
            })
            .collect()
    }
}

/// Guesses the language of a voice from its speaker label.
pub fn language_hint(speaker_label: &str) -> &'static str {
    const HINTS: &[(&[&str], &str)] = &[
        (&["中文", "中国"], "zh"),
        (&["英文", "English"], "en"),
        (&["日文", "日本"], "ja"),
        (&["韩文", "한국"], "ko"),
    ];
    HINTS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| speaker_label.contains(n)))
        .map(|(_, lang)| *lang)
        .unwrap_or("auto")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_customer_id() {
        assert_eq!(VoiceKind::from_customer_id(""), VoiceKind::Preset);
        assert!(VoiceKind::from_customer_id("c1").is_custom());
    }

    #[test]
    fn test_insert_remove() {
        let mut r = VoiceRegistry::new();
        r.insert("v1", "S", VoiceKind::from_customer_id("c1"));
        assert!(r.contains("v1"));
        assert_eq!(r.get("v1").unwrap().speaker_label, "S");

        assert!(r.remove("v1"));
        assert!(!r.remove("v1"));
        assert!(r.is_empty());
    }

    #[test]
    fn test_list() {
        let mut r = VoiceRegistry::new();
        r.insert("b", "英文男", VoiceKind::Preset);
        r.insert("a", "Alice", VoiceKind::from_customer_id("c9"));

        let voices = r.list();
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].id, "a");
        assert_eq!(voices[0].voice_type, "custom");
        assert_eq!(voices[0].customer_id.as_deref(), Some("c9"));
        assert_eq!(voices[0].language, "auto");
        assert_eq!(voices[1].voice_type, "preset");
        assert_eq!(voices[1].language, "en");
    }

    #[test]
    fn test_language_hint() {
        assert_eq!(language_hint("中文女"), "zh");
        assert_eq!(language_hint("English speaker"), "en");
        assert_eq!(language_hint("日本語"), "ja");
        assert_eq!(language_hint("韩文男"), "ko");
        assert_eq!(language_hint("baiyansong"), "auto");
    }
}
