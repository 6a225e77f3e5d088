//! Cached tensor bundles.
//!
//! A bundle file holds a msgpack map from speaker label to its
//! [`VoiceTensors`]. Bundles are derived data: anything unreadable or
//! incomplete is reported as absent so the caller recomputes it.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::warn;
use vocalis_engine::VoiceTensors;

use crate::error::{ProfileError, Result};
use crate::manifest::write_atomic;

type BundleFile = BTreeMap<String, VoiceTensors>;

/// Returns the default bundle file name for a cloned voice.
pub fn bundle_name(voice_id: &str) -> String {
    format!("{}_voice.msgpack", voice_id)
}

/// Loads the tensors of `speaker` from the bundle at `path`.
///
/// Returns `Ok(None)` if the file is missing, unreadable as a bundle, has no
/// entry for `speaker`, or holds an incomplete triple.
pub fn load(path: &Path, speaker: &str) -> Result<Option<VoiceTensors>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut bundle: BundleFile = match rmp_serde::from_slice(&data) {
        Ok(bundle) => bundle,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "bundle: unreadable, treating as absent");
            return Ok(None);
        }
    };

    match bundle.remove(speaker) {
        Some(tensors) if tensors.is_complete() => Ok(Some(tensors)),
        Some(_) => {
            warn!(path = %path.display(), speaker = %speaker, "bundle: incomplete tensors, treating as absent");
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Stores the tensors of `speaker` into the bundle at `path`.
///
/// Other speakers already in a readable bundle are kept.
pub fn save(path: &Path, speaker: &str, tensors: &VoiceTensors) -> Result<()> {
    let mut bundle: BundleFile = fs::read(path)
        .ok()
        .and_then(|data| rmp_serde::from_slice(&data).ok())
        .unwrap_or_default();
    bundle.insert(speaker.to_string(), tensors.clone());

    let data = rmp_serde::to_vec_named(&bundle).map_err(|e| ProfileError::Bundle(e.to_string()))?;
    write_atomic(path, &data)
}
