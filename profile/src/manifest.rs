//! The voice manifest.
//!
//! The manifest is the durable record of every cloned sample. It lives next
//! to the samples as `config.json`:
//!
//! ```json
//! {
//!   "sample_rate": 16000,
//!   "wav_files": {
//!     "a.wav": {
//!       "id": "v1",
//!       "customer_id": "c1",
//!       "speaker": "S",
//!       "spk2info_path": "S_bundle",
//!       "prompt_text": "hello"
//!     }
//!   }
//! }
//! ```
//!
//! Entries are keyed by sample filename. The manifest says what should
//! exist; cache bundles are derived from it.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};

/// File name of the manifest inside the voices directory.
pub const MANIFEST_FILE: &str = "config.json";

/// Cloning metadata for one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Voice id.
    pub id: String,
    /// Owning customer. Empty for shipped voices.
    #[serde(default)]
    pub customer_id: String,
    /// Speaker label.
    pub speaker: String,
    /// Cache bundle file, relative to the bundle directory.
    pub spk2info_path: String,
    /// Transcript of the sample.
    #[serde(default)]
    pub prompt_text: String,
}

/// The persisted voice manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub sample_rate: u32,
    #[serde(default)]
    pub wav_files: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// Creates an empty manifest.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            wav_files: BTreeMap::new(),
        }
    }

    /// Reads the manifest at `path`.
    ///
    /// A missing file yields an empty manifest with `default_sample_rate`.
    pub fn load(path: &Path, default_sample_rate: u32) -> Result<Self> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::new(default_sample_rate)),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data)
            .map_err(|e| ProfileError::Manifest(format!("{}: {}", path.display(), e)))
    }

    /// Writes the manifest to `path`, replacing it atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)
            .map_err(|e| ProfileError::Manifest(e.to_string()))?;
        write_atomic(path, &data)
    }

    /// Finds the entry for `voice_id`, returning its filename and entry.
    pub fn find(&self, voice_id: &str) -> Option<(&str, &ManifestEntry)> {
        self.wav_files
            .iter()
            .find(|(_, e)| e.id == voice_id)
            .map(|(f, e)| (f.as_str(), e))
    }

    /// Returns true if any entry has `voice_id`.
    pub fn contains_id(&self, voice_id: &str) -> bool {
        self.find(voice_id).is_some()
    }

    /// Removes the entry for `voice_id`.
    pub fn remove(&mut self, voice_id: &str) -> Option<(String, ManifestEntry)> {
        let filename = self.find(voice_id)?.0.to_string();
        let entry = self.wav_files.remove(&filename)?;
        Some((filename, entry))
    }

    /// Returns true if any entry references the bundle `spk2info_path`.
    pub fn references_bundle(&self, spk2info_path: &str) -> bool {
        self.wav_files
            .values()
            .any(|e| e.spk2info_path == spk2info_path)
    }

    pub fn len(&self) -> usize {
        self.wav_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wav_files.is_empty()
    }
}

/// Writes `data` to a sibling temporary file and renames it over `path`.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    if let Err(e) = fs::write(tmp, data).and_then(|_| fs::rename(tmp, path)) {
        let _ = fs::remove_file(tmp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_ENTRY: &str = r#"{"sample_rate":16000,"wav_files":{"a.wav":{"id":"v1","customer_id":"c1","speaker":"S","spk2info_path":"S_bundle","prompt_text":"hello"}}}"#;

    #[test]
    fn test_parse() {
        let m: Manifest = serde_json::from_str(ONE_ENTRY).unwrap();
        assert_eq!(m.sample_rate, 16000);
        let (filename, entry) = m.find("v1").unwrap();
        assert_eq!(filename, "a.wav");
        assert_eq!(entry.customer_id, "c1");
        assert_eq!(entry.speaker, "S");
        assert_eq!(entry.spk2info_path, "S_bundle");
        assert_eq!(entry.prompt_text, "hello");
    }

    #[test]
    fn test_optional_fields() {
        let m: Manifest = serde_json::from_str(
            r#"{"sample_rate":16000,"wav_files":{"b.wav":{"id":"p","speaker":"中文女","spk2info_path":"p.bin"}}}"#,
        )
        .unwrap();
        let (_, entry) = m.find("p").unwrap();
        assert!(entry.customer_id.is_empty());
        assert!(entry.prompt_text.is_empty());
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let m = Manifest::load(&dir.path().join(MANIFEST_FILE), 16000).unwrap();
        assert!(m.is_empty());
        assert_eq!(m.sample_rate, 16000);
    }

    #[test]
    fn test_load_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        fs::write(&path, b"{not json").unwrap();
        assert!(matches!(
            Manifest::load(&path, 16000),
            Err(ProfileError::Manifest(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(MANIFEST_FILE);
        let m: Manifest = serde_json::from_str(ONE_ENTRY).unwrap();
        m.save(&path).unwrap();

        assert_eq!(Manifest::load(&path, 22050).unwrap(), m);
        assert!(!dir.path().join("nested").join("config.json.tmp").exists());
    }

    #[test]
    fn test_remove_and_references() {
        let mut m: Manifest = serde_json::from_str(ONE_ENTRY).unwrap();
        assert!(m.references_bundle("S_bundle"));
        assert!(m.remove("missing").is_none());

        let (filename, entry) = m.remove("v1").unwrap();
        assert_eq!(filename, "a.wav");
        assert_eq!(entry.id, "v1");
        assert!(m.is_empty());
        assert!(!m.references_bundle("S_bundle"));
    }
}
