//! The capability interface of the TTS engine.

use vocalis_audio::RawAudio;
use vocalis_audio::resampler::resample;

use crate::error::Result;
use crate::profile::{FeatureMatrix, SpeakerProfile, VoiceTensors};

/// Normalized text segments, in synthesis order.
pub type TextSegments<'a> = Box<dyn Iterator<Item = String> + Send + 'a>;

/// Raw audio segments, in emission order.
pub type AudioSegments<'a> = Box<dyn Iterator<Item = Result<RawAudio>> + Send + 'a>;

/// A single, stateful TTS engine instance.
///
/// Implementations are not reentrant: callers must never have two calls in
/// flight on the same instance. All methods are blocking and are meant to
/// run on worker threads.
pub trait ModelGateway: Send + Sync {
    /// Returns true once the engine finished initialization.
    fn is_ready(&self) -> bool;

    /// Returns the rate of audio produced by [`ModelGateway::synthesize`].
    fn sample_rate(&self) -> u32;

    /// Splits and normalizes input text into synthesis-sized segments.
    fn normalize(&self, text: &str) -> Result<TextSegments<'_>>;

    /// Extracts the speaker embedding from a prompt sample.
    fn extract_embedding(&self, sample: &RawAudio) -> Result<Vec<f32>>;

    /// Extracts prompt speech features from a prompt sample.
    fn extract_features(&self, sample: &RawAudio) -> Result<FeatureMatrix>;

    /// Extracts prompt speech tokens from a prompt sample.
    fn extract_tokens(&self, sample: &RawAudio) -> Result<Vec<i32>>;

    /// Synthesizes one text segment as `profile`.
    ///
    /// With `stream == false` the returned sequence is fully materialized
    /// before this call returns. With `stream == true` segments are produced
    /// as the engine emits them.
    fn synthesize<'a>(
        &'a self,
        text: &str,
        profile: &SpeakerProfile,
        stream: bool,
    ) -> Result<AudioSegments<'a>>;

    /// Registers a zero-shot speaker with the engine's own speaker table.
    fn register_speaker(&self, _profile: &SpeakerProfile) -> Result<()> {
        Ok(())
    }
}

/// Runs all three extractions on a prompt sample.
///
/// Embedding and tokens are extracted from `prompt` as given; features are
/// extracted from `prompt` resampled to the engine's output rate.
pub fn extract_tensors(gateway: &dyn ModelGateway, prompt: &RawAudio) -> Result<VoiceTensors> {
    let embedding = gateway.extract_embedding(prompt)?;

    let engine_rate = gateway.sample_rate();
    let features = if engine_rate == 0 || engine_rate == prompt.sample_rate {
        gateway.extract_features(prompt)?
    } else {
        let samples = resample(&prompt.samples, prompt.sample_rate, engine_rate)?;
        gateway.extract_features(&RawAudio::new(samples, engine_rate))?
    };

    let tokens = gateway.extract_tokens(prompt)?;
    Ok(VoiceTensors {
        embedding,
        features,
        tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGateway {
        feature_rates: Mutex<Vec<u32>>,
    }

    impl ModelGateway for RecordingGateway {
        fn is_ready(&self) -> bool {
            true
        }

        fn sample_rate(&self) -> u32 {
            24000
        }

        fn normalize(&self, text: &str) -> Result<TextSegments<'_>> {
            Ok(Box::new(std::iter::once(text.to_string())))
        }

        fn extract_embedding(&self, sample: &RawAudio) -> Result<Vec<f32>> {
            assert_eq!(sample.sample_rate, 16000);
            Ok(vec![1.0; 8])
        }

        fn extract_features(&self, sample: &RawAudio) -> Result<FeatureMatrix> {
            self.feature_rates.lock().unwrap().push(sample.sample_rate);
            FeatureMatrix::new(1, 1, vec![sample.len() as f32])
        }

        fn extract_tokens(&self, sample: &RawAudio) -> Result<Vec<i32>> {
            assert_eq!(sample.sample_rate, 16000);
            Ok(vec![1, 2])
        }

        fn synthesize<'a>(
            &'a self,
            _text: &str,
            _profile: &SpeakerProfile,
            _stream: bool,
        ) -> Result<AudioSegments<'a>> {
            Ok(Box::new(std::iter::empty()))
        }
    }

    #[test]
    fn test_extract_tensors_resamples_features() {
        let gw = RecordingGateway::default();
        let prompt = RawAudio::new(vec![0.0; 16000], 16000);
        let tensors = extract_tensors(&gw, &prompt).unwrap();

        assert!(tensors.is_complete());
        assert_eq!(*gw.feature_rates.lock().unwrap(), vec![24000]);
        assert_eq!(tensors.features.data, vec![24000.0]);
    }

    #[test]
    fn test_default_register_speaker() {
        let gw = RecordingGateway::default();
        let tensors = VoiceTensors {
            embedding: vec![1.0],
            features: FeatureMatrix::new(1, 1, vec![0.0]).unwrap(),
            tokens: vec![1],
        };
        let profile = SpeakerProfile::new("v", "S", "", tensors).unwrap();
        assert!(gw.register_speaker(&profile).is_ok());
    }
}
