use thiserror::Error;

/// Errors raised at the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine has not finished initialization.
    #[error("engine not ready")]
    NotReady,

    /// The engine rejected or failed a request.
    #[error("engine: {0}")]
    Engine(String),

    /// Transport failure talking to the engine.
    #[error("http error: {0}")]
    Http(#[from] ureq::Error),

    /// Malformed payload from the engine.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed base64 audio payload.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Inconsistent tensor shapes.
    #[error("invalid tensors: {0}")]
    InvalidTensors(String),

    /// Audio preparation failed before reaching the engine.
    #[error("audio error: {0}")]
    Audio(#[from] vocalis_audio::AudioError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates an engine-side error.
    pub fn engine(msg: impl Into<String>) -> Self {
        EngineError::Engine(msg.into())
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
