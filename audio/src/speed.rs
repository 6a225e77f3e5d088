//! Playback speed adjustment.
//!
//! Speed is changed by resampling, not by time stretching: the buffer is
//! converted to `sample_rate / speed` and then tagged with the original
//! `sample_rate` again. Played back at `sample_rate`, the result lasts about
//! `1 / speed` of the original, with pitch shifted by the same factor. For
//! `speed > 1.0` the first leg is a downsample and for `speed < 1.0` an
//! upsample, so the two directions run the round trip in opposite order.

use crate::error::AudioError;
use crate::pcm::RawAudio;
use crate::resampler::resample;

/// Granularity, in Hz, of the intermediate rate.
///
/// Rounding keeps the rate pair's common divisor large, which keeps the FFT
/// resampler's block sizes small. The applied speed factor is therefore
/// approximate: 2.0 at 22050 Hz becomes 22050 / 11050, about 1.9955.
const RATE_STEP: u32 = 50;

/// Returns the intermediate sample rate used for `speed`.
///
/// Speeds that are not positive, or whose rate rounds to zero or overflows
/// `u32`, are rejected with [`AudioError::InvalidSpeed`].
pub fn intermediate_rate(sample_rate: u32, speed: f32) -> Result<u32, AudioError> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(AudioError::InvalidSpeed(speed));
    }
    let exact = sample_rate as f64 / speed as f64;
    let steps = (exact / RATE_STEP as f64).round() as u64;
    steps
        .checked_mul(RATE_STEP as u64)
        .and_then(|rate| u32::try_from(rate).ok())
        .filter(|&rate| rate > 0)
        .ok_or(AudioError::InvalidSpeed(speed))
}

/// Changes playback speed of `audio` by approximately `speed`.
///
/// Returns an identical copy when `speed == 1.0`.
pub fn change_speed(audio: &RawAudio, speed: f32) -> Result<RawAudio, AudioError> {
    if speed == 1.0 {
        return Ok(audio.clone());
    }
    let target = intermediate_rate(audio.sample_rate, speed)?;
    let samples = resample(&audio.samples, audio.sample_rate, target)?;
    Ok(RawAudio::new(samples, audio.sample_rate))
}
