//! Rubato-based resampler implementation.
//!
//! Resamples whole mono buffers in one call. The FFT resampler works on fixed
//! chunks, so the input is fed chunk by chunk with the tail zero padded, the
//! resampler's delay is dropped from the front and the result is trimmed to
//! the exact expected length.

use rubato::{FftFixedInOut, Resampler as RubatoResampler};

use crate::error::AudioError;

/// Frames per processing block requested from rubato.
const CHUNK_FRAMES: usize = 1024;

impl From<rubato::ResamplerConstructionError> for AudioError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        AudioError::Resample(e.to_string())
    }
}

impl From<rubato::ResampleError> for AudioError {
    fn from(e: rubato::ResampleError) -> Self {
        AudioError::Resample(e.to_string())
    }
}

/// Returns the number of output frames for `input_len` frames converted
/// from `from_rate` to `to_rate`.
pub fn output_len(input_len: usize, from_rate: u32, to_rate: u32) -> usize {
    if from_rate == 0 {
        return 0;
    }
    ((input_len as u64 * to_rate as u64 + from_rate as u64 / 2) / from_rate as u64) as usize
}

/// Resamples mono samples from `from_rate` to `to_rate`.
///
/// Returns the input unchanged when both rates are equal.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(AudioError::Resample(format!(
            "invalid sample rates: {} -> {}",
            from_rate, to_rate
        )));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_FRAMES, 1)?;

    let delay = resampler.output_delay();
    let expected = output_len(samples.len(), from_rate, to_rate);
    let wanted = expected + delay;

    let mut input_buf: Vec<Vec<f32>> = vec![Vec::with_capacity(resampler.input_frames_max())];
    let mut output_buf: Vec<Vec<f32>> = vec![vec![0.0; resampler.output_frames_max()]];
    let mut output = Vec::with_capacity(wanted + resampler.output_frames_max());
    let mut pos = 0;

    while output.len() < wanted {
        let frames_needed = resampler.input_frames_next();
        let end = (pos + frames_needed).min(samples.len());

        input_buf[0].clear();
        input_buf[0].extend_from_slice(&samples[pos..end]);
        // Pad the tail (and flush the delay line) with silence.
        input_buf[0].resize(frames_needed, 0.0);
        pos = end;

        let (_, written) = resampler.process_into_buffer(&input_buf, &mut output_buf, None)?;
        if written == 0 {
            return Err(AudioError::Resample("resampler produced no output".to_string()));
        }
        output.extend_from_slice(&output_buf[0][..written]);
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected);
    Ok(output)
}
