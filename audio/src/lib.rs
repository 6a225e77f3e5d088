//! Audio post-processing for synthesized speech.
//!
//! This crate provides:
//!
//! - `pcm`: [`RawAudio`], mono `f32` samples as emitted by the engine
//! - `resampler`: whole-buffer sample rate conversion with rubato
//! - `speed`: playback speed change by resampling
//! - `codec`: WAV, FLAC and external MP3 encoding
//! - `post`: [`AudioPostProcessor`], speed + encoding with fallbacks
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vocalis_audio::codec::DisabledEncoder;
//! use vocalis_audio::{AudioPostProcessor, RawAudio, ResponseFormat};
//!
//! let post = AudioPostProcessor::new(Arc::new(DisabledEncoder));
//! let audio = RawAudio::new(vec![0.0; 2205], 22050);
//!
//! // MP3 is disabled, so this degrades to WAV.
//! let encoded = post.process(audio, 1.0, ResponseFormat::Mp3).unwrap();
//! assert_eq!(encoded.format, ResponseFormat::Wav);
//! ```

pub mod codec;
mod error;
mod format;
pub mod pcm;
mod post;
pub mod resampler;
pub mod speed;

pub use error::{AudioError, Result};
pub use format::ResponseFormat;
pub use pcm::RawAudio;
pub use post::{Adjusted, AudioPostProcessor, Degraded, Encoded};
