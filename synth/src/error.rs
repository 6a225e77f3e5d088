use thiserror::Error;
use vocalis_audio::AudioError;
use vocalis_engine::EngineError;
use vocalis_profile::ProfileError;

/// Failure categories an API layer maps to transport responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ModelNotReady,
    VoiceNotFound,
    DuplicateSpeaker,
    ProfileLoad,
    SynthesisFailure,
    StreamingDisabled,
    InvalidInput,
    Internal,
}

/// Errors returned by the orchestrator.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("model not ready")]
    ModelNotReady,

    #[error("streaming is disabled")]
    StreamingDisabled,

    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// The engine failed during synthesis.
    #[error("synthesis failed: {0}")]
    Synthesis(#[from] EngineError),

    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A worker thread panicked or the pool shut down.
    #[error("worker error: {0}")]
    Worker(String),
}

impl SynthError {
    /// Returns the failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SynthError::ModelNotReady => ErrorKind::ModelNotReady,
            SynthError::StreamingDisabled => ErrorKind::StreamingDisabled,
            SynthError::Profile(e) => match e {
                ProfileError::VoiceNotFound(_) => ErrorKind::VoiceNotFound,
                ProfileError::DuplicateSpeaker(_) => ErrorKind::DuplicateSpeaker,
                ProfileError::ProfileLoad { .. } => ErrorKind::ProfileLoad,
                ProfileError::Extraction(EngineError::NotReady) => ErrorKind::ModelNotReady,
                ProfileError::Extraction(_) => ErrorKind::SynthesisFailure,
                ProfileError::InvalidVoiceId(_)
                | ProfileError::Sample(_)
                | ProfileError::EmptySample => ErrorKind::InvalidInput,
                ProfileError::Manifest(_) | ProfileError::Bundle(_) | ProfileError::Io(_) => {
                    ErrorKind::Internal
                }
            },
            SynthError::Synthesis(EngineError::NotReady) => ErrorKind::ModelNotReady,
            SynthError::Synthesis(_) => ErrorKind::SynthesisFailure,
            SynthError::Audio(_) | SynthError::Config(_) | SynthError::Worker(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, SynthError>;
