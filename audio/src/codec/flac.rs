//! FLAC encoding.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::error::Verify;

use crate::error::{AudioError, Result};
use crate::pcm::RawAudio;

/// Encodes `audio` as a 16-bit mono FLAC stream.
pub fn encode(audio: &RawAudio) -> Result<Vec<u8>> {
    let samples: Vec<i32> = audio.to_i16().into_iter().map(i32::from).collect();

    let config = flacenc::config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| AudioError::Flac(format!("invalid encoder config: {:?}", e)))?;

    let source =
        flacenc::source::MemSource::from_samples(&samples, 1, 16, audio.sample_rate as usize);
    let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| AudioError::Flac(format!("{:?}", e)))?;

    let mut sink = ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|_| AudioError::Flac("failed to write bitstream".to_string()))?;
    Ok(sink.as_slice().to_vec())
}
