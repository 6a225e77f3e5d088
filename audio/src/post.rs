//! Post-processing of raw engine output.
//!
//! [`AudioPostProcessor`] applies speed adjustment and encodes to the
//! requested [`ResponseFormat`]. Both steps have a safe fallback: a failed
//! speed change keeps the original audio and a failed MP3 encode returns
//! WAV. Fallbacks are reported as [`Degraded`] values and logged; they never
//! fail the call.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::codec::{Mp3Encoder, flac, wav};
use crate::error::Result;
use crate::format::ResponseFormat;
use crate::pcm::RawAudio;
use crate::speed::change_speed;

/// A recoverable fallback taken during post-processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degraded {
    /// Speed adjustment failed; the audio kept its original speed.
    SpeedUnchanged { reason: String },
    /// MP3 encoding failed; WAV bytes were returned instead.
    WavFallback { reason: String },
}

impl fmt::Display for Degraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degraded::SpeedUnchanged { reason } => {
                write!(f, "speed adjustment skipped: {}", reason)
            }
            Degraded::WavFallback { reason } => write!(f, "mp3 replaced by wav: {}", reason),
        }
    }
}

/// Audio after speed adjustment.
#[derive(Debug, Clone)]
pub struct Adjusted {
    pub audio: RawAudio,
    pub degraded: Option<Degraded>,
}

/// Encoded audio bytes.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    /// The format actually produced, which differs from the requested one
    /// after a fallback.
    pub format: ResponseFormat,
    pub degraded: Vec<Degraded>,
}

impl Encoded {
    /// Returns true if any fallback was taken.
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Speed adjustment and encoding for synthesized audio.
#[derive(Clone)]
pub struct AudioPostProcessor {
    mp3: Arc<dyn Mp3Encoder>,
}

impl fmt::Debug for AudioPostProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPostProcessor")
            .field("mp3", &self.mp3.name())
            .finish()
    }
}

impl AudioPostProcessor {
    /// Creates a post-processor using `mp3` for MP3 output.
    pub fn new(mp3: Arc<dyn Mp3Encoder>) -> Self {
        Self { mp3 }
    }

    /// Changes the playback speed of `audio`.
    ///
    /// `speed == 1.0` returns the input as is. On failure the input is
    /// returned unmodified together with [`Degraded::SpeedUnchanged`].
    pub fn adjust_speed(&self, audio: RawAudio, speed: f32) -> Adjusted {
        if speed == 1.0 {
            return Adjusted {
                audio,
                degraded: None,
            };
        }
        match change_speed(&audio, speed) {
            Ok(audio) => Adjusted {
                audio,
                degraded: None,
            },
            Err(e) => {
                warn!(speed, error = %e, "post: speed adjustment failed, using original audio");
                Adjusted {
                    audio,
                    degraded: Some(Degraded::SpeedUnchanged {
                        reason: e.to_string(),
                    }),
                }
            }
        }
    }

    /// Encodes `audio` to `format`.
    ///
    /// MP3 falls back to WAV when the encoder fails.
    pub fn encode(&self, audio: &RawAudio, format: ResponseFormat) -> Result<Encoded> {
        match format {
            ResponseFormat::Wav => Ok(Encoded {
                bytes: wav::encode(audio)?,
                format,
                degraded: Vec::new(),
            }),
            ResponseFormat::Flac => Ok(Encoded {
                bytes: flac::encode(audio)?,
                format,
                degraded: Vec::new(),
            }),
            ResponseFormat::Mp3 => {
                let wav_bytes = wav::encode(audio)?;
                match self.mp3.encode(&wav_bytes) {
                    Ok(bytes) => Ok(Encoded {
                        bytes,
                        format,
                        degraded: Vec::new(),
                    }),
                    Err(e) => {
                        warn!(encoder = self.mp3.name(), error = %e, "post: mp3 conversion failed, returning wav");
                        Ok(Encoded {
                            bytes: wav_bytes,
                            format: ResponseFormat::Wav,
                            degraded: vec![Degraded::WavFallback {
                                reason: e.to_string(),
                            }],
                        })
                    }
                }
            }
        }
    }

    /// Adjusts speed then encodes.
    pub fn process(&self, audio: RawAudio, speed: f32, format: ResponseFormat) -> Result<Encoded> {
        let adjusted = self.adjust_speed(audio, speed);
        let mut encoded = self.encode(&adjusted.audio, format)?;
        if let Some(d) = adjusted.degraded {
            encoded.degraded.insert(0, d);
        }
        Ok(encoded)
    }
}
