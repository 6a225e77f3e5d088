use serde::{Deserialize, Serialize};
use vocalis_audio::{Degraded, Encoded, ResponseFormat};

fn default_speed() -> f32 {
    1.0
}

/// One synthesis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    #[serde(default)]
    pub response_format: ResponseFormat,
    /// Playback speed multiplier.
    #[serde(default = "default_speed")]
    pub speed: f32,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            response_format: ResponseFormat::Wav,
            speed: 1.0,
        }
    }

    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// Encoded audio: a whole batch result or one streamed chunk.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    pub audio: Vec<u8>,
    /// The format actually produced.
    pub format: ResponseFormat,
    /// Fallbacks taken while post-processing.
    pub degraded: Vec<Degraded>,
}

impl SynthesisOutput {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

impl From<Encoded> for SynthesisOutput {
    fn from(e: Encoded) -> Self {
        Self {
            audio: e.bytes,
            format: e.format,
            degraded: e.degraded,
        }
    }
}

/// Service status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub model_ready: bool,
    pub voices: usize,
    pub streaming_enabled: bool,
    pub workers: usize,
}
