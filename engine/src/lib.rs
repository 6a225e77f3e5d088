//! Boundary to the external neural TTS engine.
//!
//! The engine is an opaque, stateful and non-reentrant collaborator. This
//! crate describes what the rest of the system may ask of it
//! ([`ModelGateway`]), the speaker data it consumes ([`SpeakerProfile`],
//! [`VoiceTensors`]), and one concrete adapter ([`HttpGateway`]) that talks
//! to the engine running as a sidecar process.

mod error;
mod gateway;
pub mod http;
mod profile;

pub use error::{EngineError, Result};
pub use gateway::{AudioSegments, ModelGateway, TextSegments, extract_tensors};
pub use http::HttpGateway;
pub use profile::{FeatureMatrix, SpeakerProfile, VoiceTensors};
