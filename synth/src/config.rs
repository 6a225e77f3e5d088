//! Service configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration:
//!
//! ```yaml
//! voices_dir: ./voices
//! bundle_dir: ./pretrained_models/CosyVoice2-0.5B
//! max_text_length: 1000
//! concurrent_requests: 4
//! streaming_enabled: true
//! engine:
//!   url: http://127.0.0.1:50000
//!   timeout_secs: 300
//! mp3:
//!   encoder: ffmpeg
//!   bitrate: 128k
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vocalis_audio::codec::{DisabledEncoder, FfmpegEncoder, Mp3Encoder};

use crate::error::{Result, SynthError};

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding sample audio and the voice manifest.
    pub voices_dir: PathBuf,
    /// Directory holding cached tensor bundles.
    pub bundle_dir: PathBuf,
    /// Input text longer than this many characters is truncated.
    pub max_text_length: usize,
    /// Worker pool size.
    pub concurrent_requests: usize,
    pub streaming_enabled: bool,
    /// Encoded chunks buffered between a stream's producer and consumer.
    pub stream_buffer: usize,
    /// Accepted for compatibility; no cache is bounded by it.
    pub cache_size: usize,
    /// Rate prompt samples are converted to before extraction.
    pub prompt_sample_rate: u32,
    pub engine: EngineConfig,
    pub mp3: Mp3Config,
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            voices_dir: PathBuf::from("./voices"),
            bundle_dir: PathBuf::from("./pretrained_models/CosyVoice2-0.5B"),
            max_text_length: 1000,
            concurrent_requests: 4,
            streaming_enabled: true,
            stream_buffer: 1,
            cache_size: 100,
            prompt_sample_rate: 16000,
            engine: EngineConfig::default(),
            mp3: Mp3Config::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parses a YAML document and validates it.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(data).map_err(|e| SynthError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates the YAML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| SynthError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&data)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_text_length == 0 {
            return Err(SynthError::Config("max_text_length must be positive".into()));
        }
        if self.concurrent_requests == 0 {
            return Err(SynthError::Config(
                "concurrent_requests must be positive".into(),
            ));
        }
        if self.stream_buffer == 0 {
            return Err(SynthError::Config("stream_buffer must be positive".into()));
        }
        if self.prompt_sample_rate == 0 {
            return Err(SynthError::Config(
                "prompt_sample_rate must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Engine sidecar settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:50000".to_string(),
            timeout_secs: 300,
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which MP3 encoder to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mp3EncoderKind {
    /// Run an external ffmpeg process.
    #[default]
    Ffmpeg,
    /// Never encode MP3; requests get WAV.
    Disabled,
}

/// MP3 encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mp3Config {
    pub encoder: Mp3EncoderKind,
    pub program: PathBuf,
    pub bitrate: String,
}

impl Default for Mp3Config {
    fn default() -> Self {
        Self {
            encoder: Mp3EncoderKind::Ffmpeg,
            program: PathBuf::from("ffmpeg"),
            bitrate: "128k".to_string(),
        }
    }
}

impl Mp3Config {
    /// Builds the configured encoder.
    pub fn build(&self) -> Arc<dyn Mp3Encoder> {
        match self.encoder {
            Mp3EncoderKind::Ffmpeg => {
                Arc::new(FfmpegEncoder::new(self.program.clone(), self.bitrate.clone()))
            }
            Mp3EncoderKind::Disabled => Arc::new(DisabledEncoder),
        }
    }
}
