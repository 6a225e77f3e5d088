//! Speaker tensors and profiles.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A row-major 2-D feature matrix.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl FeatureMatrix {
    /// Creates a matrix, checking that `data` holds `rows * cols` values.
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        let m = Self { rows, cols, data };
        if !m.is_consistent() {
            return Err(EngineError::InvalidTensors(format!(
                "feature matrix {}x{} has {} values",
                rows,
                cols,
                m.data.len()
            )));
        }
        Ok(m)
    }

    fn is_consistent(&self) -> bool {
        self.rows.checked_mul(self.cols) == Some(self.data.len())
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The precomputed triple that lets the engine speak as a voice.
///
/// A triple is either complete or unusable: [`VoiceTensors::is_complete`]
/// returns false for any empty or inconsistent member, and callers must
/// treat such a value as not yet computed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VoiceTensors {
    /// Fixed-length speaker embedding.
    pub embedding: Vec<f32>,
    /// Prompt speech features.
    pub features: FeatureMatrix,
    /// Prompt speech tokens.
    pub tokens: Vec<i32>,
}

impl VoiceTensors {
    /// Returns true if all three members are present and well formed.
    pub fn is_complete(&self) -> bool {
        !self.embedding.is_empty()
            && !self.tokens.is_empty()
            && !self.features.is_empty()
            && self.features.is_consistent()
    }
}

/// One synthesizable voice identity.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerProfile {
    /// Unique, stable key.
    pub voice_id: String,
    /// Engine-facing speaker name. Several voice ids may share one label.
    pub speaker_label: String,
    /// Transcript of the reference sample.
    pub prompt_text: String,
    pub tensors: VoiceTensors,
}

impl SpeakerProfile {
    /// Creates a profile. Fails if `tensors` is not a complete triple.
    pub fn new(
        voice_id: impl Into<String>,
        speaker_label: impl Into<String>,
        prompt_text: impl Into<String>,
        tensors: VoiceTensors,
    ) -> Result<Self> {
        let voice_id = voice_id.into();
        if !tensors.is_complete() {
            return Err(EngineError::InvalidTensors(format!(
                "incomplete tensors for voice {}",
                voice_id
            )));
        }
        Ok(Self {
            voice_id,
            speaker_label: speaker_label.into(),
            prompt_text: prompt_text.into(),
            tensors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tensors() -> VoiceTensors {
        VoiceTensors {
            embedding: vec![0.1; 192],
            features: FeatureMatrix::new(2, 3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(),
            tokens: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_feature_matrix_shape() {
        assert!(FeatureMatrix::new(2, 2, vec![0.0; 3]).is_err());
        assert!(FeatureMatrix::new(usize::MAX, 2, Vec::new()).is_err());
        let m = FeatureMatrix::new(2, 3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!((m.rows, m.cols), (2, 3));
    }

    #[test]
    fn test_complete_triple() {
        assert!(sample_tensors().is_complete());
        assert!(!VoiceTensors::default().is_complete());

        let mut partial = sample_tensors();
        partial.tokens.clear();
        assert!(!partial.is_complete());

        let mut skewed = sample_tensors();
        skewed.features.rows = 5;
        assert!(!skewed.is_complete());
    }

    #[test]
    fn test_profile_rejects_partial() {
        let mut partial = sample_tensors();
        partial.embedding.clear();
        let err = SpeakerProfile::new("v1", "S", "hello", partial).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTensors(_)));

        let p = SpeakerProfile::new("v1", "S", "hello", sample_tensors()).unwrap();
        assert_eq!(p.voice_id, "v1");
        assert_eq!(p.speaker_label, "S");
    }
}
