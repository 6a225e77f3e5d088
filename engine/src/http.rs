//! HTTP adapter to an engine sidecar process.
//!
//! The sidecar hosts the neural model and exposes its capabilities as JSON
//! endpoints:
//!
//! | method | path | request | response |
//! |---|---|---|---|
//! | GET | `/health` | | `{ready, sample_rate}` |
//! | POST | `/normalize` | `{text}` | `{segments}` |
//! | POST | `/extract/embedding` | `{audio, sample_rate}` | `{embedding}` |
//! | POST | `/extract/features` | `{audio, sample_rate}` | `{rows, cols, data}` |
//! | POST | `/extract/tokens` | `{audio, sample_rate}` | `{tokens}` |
//! | POST | `/speakers` | speaker | `{}` |
//! | POST | `/synthesize` | `{text, stream, ..speaker}` | NDJSON segments |
//!
//! Audio travels as base64 of little-endian `f32` samples. Each NDJSON line
//! of `/synthesize` is `{"audio": .., "sample_rate": ..}` or
//! `{"error": ".."}`.

use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ureq::Agent;
use vocalis_audio::RawAudio;

use crate::error::{EngineError, Result};
use crate::gateway::{AudioSegments, ModelGateway, TextSegments};
use crate::profile::{FeatureMatrix, SpeakerProfile};

/// Default engine sidecar address.
pub const DEFAULT_URL: &str = "http://127.0.0.1:50000";

/// Default timeout for one engine request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// A [`ModelGateway`] backed by an engine sidecar reachable over HTTP.
pub struct HttpGateway {
    agent: Agent,
    base_url: String,
    ready: AtomicBool,
    sample_rate: AtomicU32,
}

impl HttpGateway {
    /// Creates a gateway for the sidecar at `base_url`.
    ///
    /// The gateway reports not ready until [`HttpGateway::initialize`]
    /// succeeds.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            agent,
            base_url,
            ready: AtomicBool::new(false),
            sample_rate: AtomicU32::new(0),
        }
    }

    /// Returns the sidecar base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks the sidecar and records its readiness and sample rate.
    pub fn initialize(&self) -> Result<()> {
        let mut resp = self.agent.get(&self.url("/health")).call()?;
        let health: HealthResponse = resp.body_mut().read_json()?;

        self.sample_rate.store(health.sample_rate, Ordering::SeqCst);
        self.ready
            .store(health.ready && health.sample_rate > 0, Ordering::SeqCst);
        info!(
            url = %self.base_url,
            ready = health.ready,
            sample_rate = health.sample_rate,
            "engine: initialized"
        );
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post_json<T, R>(&self, path: &str, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut resp = self.agent.post(&self.url(path)).send_json(body)?;
        Ok(resp.body_mut().read_json::<R>()?)
    }
}

impl ModelGateway for HttpGateway {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::SeqCst)
    }

    fn normalize(&self, text: &str) -> Result<TextSegments<'_>> {
        let resp: NormalizeResponse = self.post_json("/normalize", &NormalizeRequest { text })?;
        Ok(Box::new(resp.segments.into_iter()))
    }

    fn extract_embedding(&self, sample: &RawAudio) -> Result<Vec<f32>> {
        let resp: EmbeddingResponse =
            self.post_json("/extract/embedding", &AudioRequest::new(sample))?;
        Ok(resp.embedding)
    }

    fn extract_features(&self, sample: &RawAudio) -> Result<FeatureMatrix> {
        let m: FeatureMatrix = self.post_json("/extract/features", &AudioRequest::new(sample))?;
        FeatureMatrix::new(m.rows, m.cols, m.data)
    }

    fn extract_tokens(&self, sample: &RawAudio) -> Result<Vec<i32>> {
        let resp: TokensResponse = self.post_json("/extract/tokens", &AudioRequest::new(sample))?;
        Ok(resp.tokens)
    }

    fn synthesize<'a>(
        &'a self,
        text: &str,
        profile: &SpeakerProfile,
        stream: bool,
    ) -> Result<AudioSegments<'a>> {
        let req = SynthesizeRequest {
            text,
            stream,
            speaker: SpeakerPayload::new(profile),
        };
        debug!(speaker = %profile.speaker_label, stream, "engine: synthesize");

        let resp = self.agent.post(&self.url("/synthesize")).send_json(&req)?;
        let lines = BufReader::new(resp.into_body().into_reader()).lines();
        let segments = lines.filter_map(|line| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(parse_segment(&line)),
            Err(e) => Some(Err(EngineError::Io(e))),
        });

        if stream {
            return Ok(Box::new(segments));
        }
        let all = segments.collect::<Result<Vec<_>>>()?;
        Ok(Box::new(all.into_iter().map(Ok)))
    }

    fn register_speaker(&self, profile: &SpeakerProfile) -> Result<()> {
        let _: serde_json::Value = self.post_json("/speakers", &SpeakerPayload::new(profile))?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct HealthResponse {
    ready: bool,
    #[serde(default)]
    sample_rate: u32,
}

#[derive(Serialize)]
struct NormalizeRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct NormalizeResponse {
    segments: Vec<String>,
}

#[derive(Serialize)]
struct AudioRequest {
    audio: String,
    sample_rate: u32,
}

impl AudioRequest {
    fn new(sample: &RawAudio) -> Self {
        Self {
            audio: encode_samples(&sample.samples),
            sample_rate: sample.sample_rate,
        }
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct TokensResponse {
    tokens: Vec<i32>,
}

#[derive(Serialize)]
struct SpeakerPayload<'a> {
    speaker: &'a str,
    prompt_text: &'a str,
    embedding: &'a [f32],
    features: &'a FeatureMatrix,
    tokens: &'a [i32],
}

impl<'a> SpeakerPayload<'a> {
    fn new(profile: &'a SpeakerProfile) -> Self {
        Self {
            speaker: &profile.speaker_label,
            prompt_text: &profile.prompt_text,
            embedding: &profile.tensors.embedding,
            features: &profile.tensors.features,
            tokens: &profile.tensors.tokens,
        }
    }
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    stream: bool,
    #[serde(flatten)]
    speaker: SpeakerPayload<'a>,
}

#[derive(Deserialize)]
struct SegmentLine {
    #[serde(default)]
    audio: Option<String>,
    #[serde(default)]
    sample_rate: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

fn parse_segment(line: &str) -> Result<RawAudio> {
    let seg: SegmentLine = serde_json::from_str(line)?;
    if let Some(err) = seg.error {
        return Err(EngineError::Engine(err));
    }
    match (seg.audio, seg.sample_rate) {
        (Some(audio), Some(rate)) => Ok(RawAudio::new(decode_samples(&audio)?, rate)),
        _ => Err(EngineError::engine("segment without audio")),
    }
}

/// Encodes samples as base64 of little-endian `f32`.
pub fn encode_samples(samples: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    STANDARD.encode(bytes)
}

/// Decodes base64 of little-endian `f32` into samples.
pub fn decode_samples(data: &str) -> Result<Vec<f32>> {
    let bytes = STANDARD.decode(data)?;
    if bytes.len() % 4 != 0 {
        return Err(EngineError::engine(format!(
            "audio payload of {} bytes is not a whole number of samples",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
