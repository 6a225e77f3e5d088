use thiserror::Error;

/// Errors returned by audio processing operations.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("resample error: {0}")]
    Resample(String),

    #[error("invalid speed: {0}")]
    InvalidSpeed(f32),

    #[error("sample rate mismatch: expected {expected}, got {got}")]
    RateMismatch { expected: u32, got: u32 },

    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),

    #[error("flac error: {0}")]
    Flac(String),

    #[error("encoder unavailable: {0}")]
    EncoderUnavailable(String),

    #[error("encoder exited with {status}: {stderr}")]
    EncoderFailed { status: String, stderr: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for audio operations.
pub type Result<T> = std::result::Result<T, AudioError>;
