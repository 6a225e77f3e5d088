//! Audio codecs.
//!
//! - `wav`: RIFF/WAVE encode and decode via hound
//! - `flac`: native FLAC encoding via flacenc
//! - `external`: MP3 encoding through a pluggable [`Mp3Encoder`]

pub mod external;
pub mod flac;
pub mod wav;

pub use external::{DisabledEncoder, FfmpegEncoder, Mp3Encoder};
