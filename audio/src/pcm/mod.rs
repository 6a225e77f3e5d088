//! Raw PCM audio as produced by the synthesis engine.
//!
//! The engine emits mono floating point samples in `[-1.0, 1.0]` at its own
//! sample rate. [`RawAudio`] carries those samples together with the rate so
//! post-processing never has to guess it.

use crate::error::{AudioError, Result};

/// A mono buffer of `f32` samples at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAudio {
    /// Samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl RawAudio {
    /// Creates a buffer from samples at the given rate.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Creates an empty buffer at the given rate.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Appends another buffer recorded at the same sample rate.
    pub fn append(&mut self, other: &RawAudio) -> Result<()> {
        if other.sample_rate != self.sample_rate {
            return Err(AudioError::RateMismatch {
                expected: self.sample_rate,
                got: other.sample_rate,
            });
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Converts the samples to 16-bit signed PCM, clamping out-of-range values.
    pub fn to_i16(&self) -> Vec<i16> {
        self.samples.iter().map(|&s| f32_to_i16(s)).collect()
    }
}

/// Converts one float sample to 16-bit PCM.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}
