//! WAV encoding and decoding.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::Result;
use crate::pcm::RawAudio;

/// Encodes `audio` as a 16-bit mono PCM WAV file.
pub fn encode(audio: &RawAudio) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + audio.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in audio.to_i16() {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Decodes a WAV file into mono samples.
///
/// Integer and float encodings of any depth hound supports are accepted.
/// Multi-channel audio is down-mixed by averaging each frame.
pub fn decode(bytes: &[u8]) -> Result<RawAudio> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    read_all(reader)
}

/// Decodes the WAV file at `path`.
pub fn decode_file(path: impl AsRef<Path>) -> Result<RawAudio> {
    let reader = WavReader::open(path)?;
    read_all(reader)
}

fn read_all<R: std::io::Read>(mut reader: WavReader<R>) -> Result<RawAudio> {
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok(RawAudio::new(samples, spec.sample_rate))
}

/// Returns true if `data` starts with a RIFF/WAVE header.
pub fn is_wav(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE"
}
