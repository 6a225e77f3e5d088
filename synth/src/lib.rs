//! Synthesis orchestration.
//!
//! [`Orchestrator`] turns text into encoded speech using one shared,
//! non-reentrant engine:
//!
//! - [`Orchestrator::synthesize`] returns the whole utterance at once.
//! - [`Orchestrator::synthesize_stream`] returns a [`SynthesisStream`] of
//!   encoded chunks as the engine produces them.
//! - [`Orchestrator::clone_and_persist`], [`Orchestrator::clone_voice`],
//!   [`Orchestrator::delete_voice`] and [`Orchestrator::list_voices`] manage
//!   voices.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vocalis_engine::HttpGateway;
//! use vocalis_synth::{Config, Orchestrator, SynthesisRequest};
//!
//! let config = Config::default();
//! let gateway = HttpGateway::new(&config.engine.url, config.engine.timeout());
//! gateway.initialize()?;
//!
//! let orch = Orchestrator::new(config, Arc::new(gateway))?;
//! orch.initialize().await?;
//! let out = orch.synthesize(SynthesisRequest::new("你好", "v1")).await?;
//! ```

mod config;
mod error;
mod orchestrator;
mod pool;
mod request;
mod stream;

pub use config::{Config, EngineConfig, Mp3Config, Mp3EncoderKind};
pub use error::{ErrorKind, Result, SynthError};
pub use orchestrator::Orchestrator;
pub use pool::WorkerPool;
pub use request::{Health, SynthesisOutput, SynthesisRequest};
pub use stream::SynthesisStream;

#[cfg(test)]
mod tests;
