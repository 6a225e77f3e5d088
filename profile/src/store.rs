//! The profile store.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, error, info, warn};
use vocalis_audio::RawAudio;
use vocalis_audio::codec::wav;
use vocalis_audio::resampler::resample;
use vocalis_engine::{ModelGateway, SpeakerProfile, extract_tensors};

use crate::bundle;
use crate::error::{ProfileError, Result};
use crate::manifest::{MANIFEST_FILE, Manifest, ManifestEntry};
use crate::registry::{RegistryEntry, VoiceInfo, VoiceKind, VoiceRegistry};

/// Outcome of [`ProfileStore::load_all`].
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Voice ids registered by this load.
    pub loaded: Vec<String>,
    /// Number of bundles computed through the gateway.
    pub extracted: usize,
    /// One [`ProfileError::ProfileLoad`] per entry that could not be loaded.
    pub failures: Vec<ProfileError>,
}

/// A request to clone and persist a voice.
#[derive(Debug, Clone)]
pub struct CloneRequest {
    pub voice_id: String,
    pub speaker_label: String,
    pub customer_id: String,
    /// The sample as a WAV file.
    pub sample: Vec<u8>,
    pub prompt_text: String,
}

/// Owns every speaker profile and the durable state behind them.
///
/// Samples and the manifest live in `voices_dir`; bundles live in
/// `bundle_dir`. The store is not synchronized; callers guard it together
/// with the gateway.
#[derive(Debug)]
pub struct ProfileStore {
    voices_dir: PathBuf,
    bundle_dir: PathBuf,
    prompt_sample_rate: u32,
    manifest: Manifest,
    registry: VoiceRegistry,
    profiles: HashMap<String, SpeakerProfile>,
}

impl ProfileStore {
    /// Creates an empty store. Nothing is read until [`ProfileStore::load_all`].
    pub fn new(
        voices_dir: impl Into<PathBuf>,
        bundle_dir: impl Into<PathBuf>,
        prompt_sample_rate: u32,
    ) -> Self {
        Self {
            voices_dir: voices_dir.into(),
            bundle_dir: bundle_dir.into(),
            prompt_sample_rate,
            manifest: Manifest::new(prompt_sample_rate),
            registry: VoiceRegistry::new(),
            profiles: HashMap::new(),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.voices_dir.join(MANIFEST_FILE)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn registry(&self) -> &VoiceRegistry {
        &self.registry
    }

    /// Replays the manifest, loading cached bundles and computing missing ones.
    ///
    /// An entry that cannot be loaded is logged and reported in
    /// [`LoadReport::failures`]; the remaining entries still load. Only an
    /// unreadable manifest fails the whole call.
    pub fn load_all(&mut self, gateway: &dyn ModelGateway) -> Result<LoadReport> {
        let start = Instant::now();
        let manifest = Manifest::load(&self.manifest_path(), self.prompt_sample_rate)?;

        for entry in self.manifest.wav_files.values() {
            self.registry.remove(&entry.id);
            self.profiles.remove(&entry.id);
        }

        let mut report = LoadReport::default();
        for (filename, entry) in &manifest.wav_files {
            match self.load_entry(gateway, filename, entry) {
                Ok((profile, extracted)) => {
                    if extracted {
                        report.extracted += 1;
                    }
                    self.insert(profile, VoiceKind::from_customer_id(&entry.customer_id));
                    report.loaded.push(entry.id.clone());
                }
                Err(e) => {
                    error!(voice_id = %entry.id, file = %filename, error = %e, "profile: load failed");
                    report.failures.push(e);
                }
            }
        }
        self.manifest = manifest;

        info!(
            loaded = report.loaded.len(),
            extracted = report.extracted,
            failed = report.failures.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "profile: manifest loaded"
        );
        Ok(report)
    }

    fn load_entry(
        &self,
        gateway: &dyn ModelGateway,
        filename: &str,
        entry: &ManifestEntry,
    ) -> Result<(SpeakerProfile, bool)> {
        self.materialize(gateway, filename, entry).map_err(|e| match e {
            ProfileError::ProfileLoad { .. } => e,
            other => ProfileError::load(&entry.id, other),
        })
    }

    fn materialize(
        &self,
        gateway: &dyn ModelGateway,
        filename: &str,
        entry: &ManifestEntry,
    ) -> Result<(SpeakerProfile, bool)> {
        let bundle_path = self.bundle_dir.join(&entry.spk2info_path);
        if let Some(tensors) = bundle::load(&bundle_path, &entry.speaker)? {
            let profile = SpeakerProfile::new(&entry.id, &entry.speaker, &entry.prompt_text, tensors)?;
            return Ok((profile, false));
        }

        let sample_path = self.voices_dir.join(filename);
        if !sample_path.is_file() {
            return Err(ProfileError::load(
                &entry.id,
                format!(
                    "sample {} is missing and bundle {} is not cached",
                    sample_path.display(),
                    bundle_path.display()
                ),
            ));
        }

        info!(voice_id = %entry.id, speaker = %entry.speaker, "profile: computing bundle");
        let prompt = self.prepare_sample(wav::decode_file(&sample_path)?)?;
        let tensors = extract_tensors(gateway, &prompt)?;
        let profile = SpeakerProfile::new(&entry.id, &entry.speaker, &entry.prompt_text, tensors)?;
        bundle::save(&bundle_path, &entry.speaker, &profile.tensors)?;
        Ok((profile, true))
    }

    /// Decodes a WAV sample and converts it to the prompt sample rate.
    pub fn decode_sample(&self, wav_bytes: &[u8]) -> Result<RawAudio> {
        self.prepare_sample(wav::decode(wav_bytes)?)
    }

    fn prepare_sample(&self, audio: RawAudio) -> Result<RawAudio> {
        if audio.is_empty() {
            return Err(ProfileError::EmptySample);
        }
        if audio.sample_rate == self.prompt_sample_rate {
            return Ok(audio);
        }
        let samples = resample(&audio.samples, audio.sample_rate, self.prompt_sample_rate)?;
        Ok(RawAudio::new(samples, self.prompt_sample_rate))
    }

    fn insert(&mut self, profile: SpeakerProfile, kind: VoiceKind) {
        self.registry
            .insert(profile.voice_id.clone(), profile.speaker_label.clone(), kind);
        self.profiles.insert(profile.voice_id.clone(), profile);
    }

    /// Returns the profile registered under `voice_id`.
    pub fn get(&self, voice_id: &str) -> Result<&SpeakerProfile> {
        self.profiles
            .get(voice_id)
            .ok_or_else(|| ProfileError::VoiceNotFound(voice_id.to_string()))
    }

    /// Returns the profile together with its registry entry.
    pub fn resolve(&self, voice_id: &str) -> Result<(&SpeakerProfile, &RegistryEntry)> {
        match (self.profiles.get(voice_id), self.registry.get(voice_id)) {
            (Some(p), Some(e)) => Ok((p, e)),
            _ => Err(ProfileError::VoiceNotFound(voice_id.to_string())),
        }
    }

    /// Lists every registered voice.
    pub fn list(&self) -> Vec<VoiceInfo> {
        self.registry.list()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Clones a voice from a sample and persists it.
    ///
    /// Fails with [`ProfileError::InvalidVoiceId`] if `voice_id` is not a
    /// plain file name, and with [`ProfileError::DuplicateSpeaker`] if the
    /// manifest already has `voice_id` or its sample file exists. Any later
    /// failure undoes the sample, manifest and bundle writes before returning.
    pub fn register_clone(
        &mut self,
        gateway: &dyn ModelGateway,
        req: CloneRequest,
    ) -> Result<SpeakerProfile> {
        validate_voice_id(&req.voice_id)?;
        let filename = format!("{}.wav", req.voice_id);
        let sample_path = self.voices_dir.join(&filename);
        if self.manifest.contains_id(&req.voice_id)
            || self.manifest.wav_files.contains_key(&filename)
            || sample_path.exists()
        {
            return Err(ProfileError::DuplicateSpeaker(req.voice_id));
        }

        let entry = ManifestEntry {
            id: req.voice_id.clone(),
            customer_id: req.customer_id.clone(),
            speaker: req.speaker_label.clone(),
            spk2info_path: bundle::bundle_name(&req.voice_id),
            prompt_text: req.prompt_text.clone(),
        };
        let bundle_path = self.bundle_dir.join(&entry.spk2info_path);
        let snapshot = Snapshot {
            manifest: self.manifest.clone(),
            manifest_existed: self.manifest_path().exists(),
            bundle: read_optional(&bundle_path)?,
        };

        match self.persist_clone(gateway, &req, &filename, entry) {
            Ok(profile) => {
                info!(voice_id = %req.voice_id, speaker = %req.speaker_label, "profile: voice cloned");
                Ok(profile)
            }
            Err(e) => {
                warn!(voice_id = %req.voice_id, error = %e, "profile: clone failed, rolling back");
                self.rollback(snapshot, &sample_path, &bundle_path);
                Err(e)
            }
        }
    }

    fn persist_clone(
        &mut self,
        gateway: &dyn ModelGateway,
        req: &CloneRequest,
        filename: &str,
        entry: ManifestEntry,
    ) -> Result<SpeakerProfile> {
        fs::create_dir_all(&self.voices_dir)?;
        fs::write(self.voices_dir.join(filename), &req.sample)?;

        let kind = VoiceKind::from_customer_id(&entry.customer_id);
        let bundle_path = self.bundle_dir.join(&entry.spk2info_path);
        self.manifest
            .wav_files
            .insert(filename.to_string(), entry);
        self.manifest.save(&self.manifest_path())?;

        let prompt = self.decode_sample(&req.sample)?;
        let tensors = extract_tensors(gateway, &prompt)?;
        let profile = SpeakerProfile::new(&req.voice_id, &req.speaker_label, &req.prompt_text, tensors)?;
        bundle::save(&bundle_path, &req.speaker_label, &profile.tensors)?;

        self.insert(profile.clone(), kind);
        Ok(profile)
    }

    fn rollback(&mut self, snapshot: Snapshot, sample_path: &Path, bundle_path: &Path) {
        remove_quietly(sample_path);

        self.manifest = snapshot.manifest;
        let manifest_path = self.manifest_path();
        let restored = if snapshot.manifest_existed {
            self.manifest.save(&manifest_path)
        } else {
            remove_file_if_exists(&manifest_path).map_err(ProfileError::from)
        };
        if let Err(e) = restored {
            error!(path = %manifest_path.display(), error = %e, "profile: manifest rollback failed");
        }

        let restored = match snapshot.bundle {
            Some(data) => fs::write(bundle_path, data),
            None => remove_file_if_exists(bundle_path),
        };
        if let Err(e) = restored {
            error!(path = %bundle_path.display(), error = %e, "profile: bundle rollback failed");
        }
    }

    /// Registers an in-memory custom profile, replacing any previous one.
    ///
    /// Nothing is persisted.
    pub fn register_ephemeral(&mut self, profile: SpeakerProfile) {
        debug!(voice_id = %profile.voice_id, "profile: ephemeral voice registered");
        self.insert(profile, VoiceKind::Custom { customer_id: None });
    }

    /// Deletes a voice.
    ///
    /// Removes the registry entry, the profile and the manifest entry along
    /// with its sample and any bundle no other entry references. Returns
    /// false if the voice was unknown.
    pub fn delete(&mut self, voice_id: &str) -> Result<bool> {
        let registered = self.registry.remove(voice_id);
        self.profiles.remove(voice_id);

        let Some((filename, entry)) = self.manifest.remove(voice_id) else {
            return Ok(registered);
        };
        self.manifest.save(&self.manifest_path())?;

        remove_quietly(&self.voices_dir.join(&filename));
        if !self.manifest.references_bundle(&entry.spk2info_path) {
            remove_quietly(&self.bundle_dir.join(&entry.spk2info_path));
        }
        info!(voice_id = %voice_id, "profile: voice deleted");
        Ok(true)
    }
}

struct Snapshot {
    manifest: Manifest,
    manifest_existed: bool,
    bundle: Option<Vec<u8>>,
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_file_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = remove_file_if_exists(path) {
        warn!(path = %path.display(), error = %e, "profile: failed to remove file");
    }
}

/// Rejects ids that would escape `voices_dir` or `bundle_dir` when used as
/// a file name stem.
fn validate_voice_id(voice_id: &str) -> Result<()> {
    let invalid = voice_id.trim().is_empty()
        || voice_id.contains(['/', '\\', '\0'])
        || voice_id.contains("..");
    if invalid {
        return Err(ProfileError::InvalidVoiceId(voice_id.to_string()));
    }
    Ok(())
}
