//! The synthesis orchestrator.
//!
//! [`Orchestrator`] is the context object of the service. It owns the single
//! engine instance, the profile store and the worker pool, and is shared by
//! reference between request handlers.
//!
//! The engine and the store sit behind one mutex, the engine-wide critical
//! section. Every gateway call and every registry or manifest access happens
//! while holding it, so at most one request talks to the engine at a time.
//! Work runs on the worker pool: a request first waits for a pool slot, then
//! for the critical section inside that slot. tokio's mutex is fair, so
//! requests enter the section in the order they asked for it.
//!
//! A batch request leaves the section once the raw audio is complete and
//! encodes outside it. A streaming request holds the section for the whole
//! run, encoding each chunk before handing it to the consumer.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, info, warn};
use vocalis_audio::{AudioPostProcessor, RawAudio};
use vocalis_engine::{ModelGateway, SpeakerProfile, extract_tensors};
use vocalis_profile::{CloneRequest, LoadReport, ProfileStore, VoiceInfo};

use crate::config::Config;
use crate::error::{Result, SynthError};
use crate::pool::WorkerPool;
use crate::request::{Health, SynthesisOutput, SynthesisRequest};
use crate::stream::SynthesisStream;

/// State guarded by the critical section.
struct EngineState {
    gateway: Arc<dyn ModelGateway>,
    store: ProfileStore,
}

impl EngineState {
    fn ensure_ready(&self) -> Result<()> {
        if self.gateway.is_ready() {
            Ok(())
        } else {
            Err(SynthError::ModelNotReady)
        }
    }

    /// Checks readiness and resolves the requested voice.
    fn resolve(&self, voice_id: &str) -> Result<&SpeakerProfile> {
        self.ensure_ready()?;
        let (profile, entry) = self.store.resolve(voice_id)?;
        let path = if entry.kind.is_custom() {
            "zero_shot"
        } else {
            "preset"
        };
        debug!(voice_id = %voice_id, speaker = %entry.speaker_label, path, "synth: voice resolved");
        Ok(profile)
    }

    /// Normalizes `text` into segments.
    fn segments(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.gateway.normalize(text)?.collect())
    }

    /// Synthesizes a whole request without streaming.
    fn synthesize_batch(&self, req: &SynthesisRequest, text: &str) -> Result<RawAudio> {
        let profile = self.resolve(&req.voice_id)?;
        let mut out: Option<RawAudio> = None;
        for segment in self.segments(text)? {
            for audio in self.gateway.synthesize(&segment, profile, false)? {
                let audio = audio?;
                match out.as_mut() {
                    Some(buf) => buf.append(&audio)?,
                    None => out = Some(audio),
                }
            }
        }
        Ok(out.unwrap_or_else(|| RawAudio::empty(self.gateway.sample_rate())))
    }
}

/// Truncates `text` to at most `max_chars` characters.
fn truncate_text<'a>(text: &'a str, max_chars: usize, voice_id: &str) -> &'a str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => {
            warn!(
                voice_id = %voice_id,
                chars = text.chars().count(),
                max_chars,
                "synth: text too long, truncated"
            );
            &text[..end]
        }
        None => text,
    }
}

/// Synthesis service context.
pub struct Orchestrator {
    config: Config,
    gateway: Arc<dyn ModelGateway>,
    state: Arc<Mutex<EngineState>>,
    pool: WorkerPool,
    post: AudioPostProcessor,
}

impl Orchestrator {
    /// Creates an orchestrator with the MP3 encoder chosen by `config`.
    pub fn new(config: Config, gateway: Arc<dyn ModelGateway>) -> Result<Self> {
        config.validate()?;
        let post = AudioPostProcessor::new(config.mp3.build());
        Ok(Self::with_post_processor(config, gateway, post))
    }

    /// Creates an orchestrator with an explicit post-processor.
    pub fn with_post_processor(
        config: Config,
        gateway: Arc<dyn ModelGateway>,
        post: AudioPostProcessor,
    ) -> Self {
        let store = ProfileStore::new(
            &config.voices_dir,
            &config.bundle_dir,
            config.prompt_sample_rate,
        );
        info!(
            workers = config.concurrent_requests,
            cache_size = config.cache_size,
            streaming = config.streaming_enabled,
            "synth: orchestrator created (cache_size is not enforced)"
        );
        Self {
            pool: WorkerPool::new(config.concurrent_requests),
            state: Arc::new(Mutex::new(EngineState {
                gateway: gateway.clone(),
                store,
            })),
            gateway,
            post,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns true once the engine finished initialization.
    pub fn is_ready(&self) -> bool {
        self.gateway.is_ready()
    }

    /// Loads every voice in the manifest.
    ///
    /// Missing bundles are computed through the engine inside the critical
    /// section.
    pub async fn initialize(&self) -> Result<LoadReport> {
        let state = self.state.clone();
        self.pool
            .run(move || -> Result<LoadReport> {
                let mut guard = state.blocking_lock();
                let st = &mut *guard;
                Ok(st.store.load_all(st.gateway.as_ref())?)
            })
            .await?
    }

    /// Synthesizes `req` and returns the encoded audio.
    pub async fn synthesize(&self, req: SynthesisRequest) -> Result<SynthesisOutput> {
        let state = self.state.clone();
        let post = self.post.clone();
        let max_chars = self.config.max_text_length;

        self.pool
            .run(move || -> Result<SynthesisOutput> {
                let raw = {
                    let guard = state.blocking_lock();
                    let text = truncate_text(&req.text, max_chars, &req.voice_id);
                    guard.synthesize_batch(&req, text)?
                };
                let encoded = post.process(raw, req.speed, req.response_format)?;
                Ok(SynthesisOutput::from(encoded))
            })
            .await?
    }

    /// Starts a streaming synthesis of `req`.
    ///
    /// Resolution failures are returned directly. Once the stream is
    /// returned, a failure ends it with an error item after the chunks
    /// already delivered.
    pub async fn synthesize_stream(&self, req: SynthesisRequest) -> Result<SynthesisStream> {
        if !self.config.streaming_enabled {
            return Err(SynthError::StreamingDisabled);
        }

        let state = self.state.clone();
        let post = self.post.clone();
        let max_chars = self.config.max_text_length;
        let (tx, rx) = mpsc::channel(self.config.stream_buffer.max(1));
        let (started_tx, started_rx) = oneshot::channel();
        let failure_tx = tx.clone();

        let producer = self
            .pool
            .spawn(move || {
                let guard = state.blocking_lock();
                produce(&guard, &post, &req, max_chars, started_tx, tx);
            })
            .await?;

        // A panicking producer drops its sender; end the stream with an error
        // item instead of a silent end.
        tokio::spawn(async move {
            if let Err(e) = producer.await {
                warn!(error = %e, "synth: stream producer failed");
                let _ = failure_tx
                    .send(Err(SynthError::Worker(e.to_string())))
                    .await;
            }
        });

        match started_rx.await {
            Ok(Ok(())) => Ok(SynthesisStream::new(rx)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SynthError::Worker("stream producer exited".to_string())),
        }
    }

    /// Lists every registered voice.
    pub async fn list_voices(&self) -> Vec<VoiceInfo> {
        self.state.lock().await.store.list()
    }

    /// Clones a voice for this process only.
    ///
    /// The voice is registered under `speaker_label`, replacing any voice of
    /// that id, and announced to the engine. Returns the new voice id.
    pub async fn clone_voice(
        &self,
        sample: Vec<u8>,
        speaker_label: String,
        prompt_text: String,
    ) -> Result<String> {
        let state = self.state.clone();
        self.pool
            .run(move || -> Result<String> {
                let mut guard = state.blocking_lock();
                let st = &mut *guard;
                st.ensure_ready()?;

                let prompt = st.store.decode_sample(&sample)?;
                let tensors = extract_tensors(st.gateway.as_ref(), &prompt)?;
                let profile =
                    SpeakerProfile::new(&speaker_label, &speaker_label, &prompt_text, tensors)?;
                st.gateway.register_speaker(&profile)?;
                st.store.register_ephemeral(profile);
                info!(voice_id = %speaker_label, "synth: voice cloned for this session");
                Ok(speaker_label)
            })
            .await?
    }

    /// Clones a voice and persists it. Returns the voice id.
    pub async fn clone_and_persist(&self, req: CloneRequest) -> Result<String> {
        let state = self.state.clone();
        self.pool
            .run(move || -> Result<String> {
                let mut guard = state.blocking_lock();
                let st = &mut *guard;
                st.ensure_ready()?;
                let profile = st.store.register_clone(st.gateway.as_ref(), req)?;
                Ok(profile.voice_id)
            })
            .await?
    }

    /// Deletes a voice. Returns false if it was unknown.
    pub async fn delete_voice(&self, voice_id: &str) -> Result<bool> {
        let state = self.state.clone();
        let voice_id = voice_id.to_string();
        self.pool
            .run(move || -> Result<bool> { Ok(state.blocking_lock().store.delete(&voice_id)?) })
            .await?
    }

    pub async fn health(&self) -> Health {
        let voices = self.state.lock().await.store.len();
        Health {
            model_ready: self.is_ready(),
            voices,
            streaming_enabled: self.config.streaming_enabled,
            workers: self.pool.size(),
        }
    }
}

/// Runs one streaming synthesis inside the critical section.
///
/// Reports the outcome of resolution through `started`, then pushes one
/// encoded chunk per engine segment. Returns as soon as the consumer is gone.
fn produce(
    st: &EngineState,
    post: &AudioPostProcessor,
    req: &SynthesisRequest,
    max_chars: usize,
    started: oneshot::Sender<Result<()>>,
    tx: mpsc::Sender<Result<SynthesisOutput>>,
) {
    let text = truncate_text(&req.text, max_chars, &req.voice_id);
    let prepared = st
        .resolve(&req.voice_id)
        .and_then(|profile| Ok((profile, st.segments(text)?)));
    let (profile, segments) = match prepared {
        Ok(p) => p,
        Err(e) => {
            let _ = started.send(Err(e));
            return;
        }
    };
    if started.send(Ok(())).is_err() {
        debug!(voice_id = %req.voice_id, "synth: caller gone before stream start");
        return;
    }

    let mut sent = 0usize;
    for segment in segments {
        let audio = match st.gateway.synthesize(&segment, profile, true) {
            Ok(audio) => audio,
            Err(e) => {
                let _ = tx.blocking_send(Err(e.into()));
                return;
            }
        };
        for raw in audio {
            let item: Result<SynthesisOutput> = match raw {
                Ok(raw) => post
                    .process(raw, req.speed, req.response_format)
                    .map(SynthesisOutput::from)
                    .map_err(SynthError::from),
                Err(e) => Err(SynthError::from(e)),
            };
            let failed = item.is_err();
            if tx.blocking_send(item).is_err() {
                debug!(voice_id = %req.voice_id, sent, "synth: stream abandoned by consumer");
                return;
            }
            if failed {
                return;
            }
            sent += 1;
        }
    }
    debug!(voice_id = %req.voice_id, chunks = sent, "synth: stream finished");
}
