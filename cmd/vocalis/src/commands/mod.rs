//! CLI commands module.

mod config;
mod health;
mod say;
mod util;
mod voice;

pub use config::ConfigCommand;
pub use health::HealthCommand;
pub use say::{SayCommand, StreamCommand};
pub use voice::VoiceCommand;

pub(crate) use util::*;
