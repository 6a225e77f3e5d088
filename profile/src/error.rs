use thiserror::Error;
use vocalis_audio::AudioError;
use vocalis_engine::EngineError;

/// Errors returned by profile store operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("voice not found: {0}")]
    VoiceNotFound(String),

    #[error("speaker already exists: {0}")]
    DuplicateSpeaker(String),

    /// The id cannot be used as a file name.
    #[error("invalid voice id: {0:?}")]
    InvalidVoiceId(String),

    /// A manifest entry could not be turned into a profile.
    #[error("failed to load profile {voice_id}: {reason}")]
    ProfileLoad { voice_id: String, reason: String },

    #[error("extraction failed: {0}")]
    Extraction(#[from] EngineError),

    #[error("invalid sample audio: {0}")]
    Sample(#[from] AudioError),

    #[error("sample audio is empty")]
    EmptySample,

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("bundle error: {0}")]
    Bundle(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProfileError {
    pub(crate) fn load(voice_id: &str, reason: impl ToString) -> Self {
        ProfileError::ProfileLoad {
            voice_id: voice_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for profile operations.
pub type Result<T> = std::result::Result<T, ProfileError>;
