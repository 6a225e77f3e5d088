//! MP3 encoding through an external encoder.
//!
//! MP3 is never encoded in-process. [`FfmpegEncoder`] hands a WAV file to an
//! `ffmpeg` process and reads the result back; [`DisabledEncoder`] refuses
//! every request so callers take their WAV fallback immediately.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{AudioError, Result};

/// Encodes WAV bytes into MP3 bytes.
pub trait Mp3Encoder: Send + Sync {
    /// Returns a short name for logging.
    fn name(&self) -> &str;

    /// Encodes a complete WAV file into an MP3 file.
    fn encode(&self, wav: &[u8]) -> Result<Vec<u8>>;
}

/// Runs `ffmpeg` (or a compatible program) as a subprocess.
///
/// Input and output live in a private temporary directory that is removed
/// when the call returns, on success and failure alike.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    bitrate: String,
    temp_root: Option<PathBuf>,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg", "128k")
    }
}

impl FfmpegEncoder {
    /// Creates an encoder running `program` at `bitrate` (e.g. "128k").
    pub fn new(program: impl Into<PathBuf>, bitrate: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            bitrate: bitrate.into(),
            temp_root: None,
        }
    }

    /// Places temporary directories under `root` instead of the system default.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    fn temp_dir(&self) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("vocalis-mp3-");
        match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }
}

impl Mp3Encoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn encode(&self, wav: &[u8]) -> Result<Vec<u8>> {
        let dir = self.temp_dir()?;
        let input = dir.path().join("input.wav");
        let output = dir.path().join("output.mp3");
        std::fs::write(&input, wav)?;

        debug!(program = %self.program.display(), bitrate = %self.bitrate, "mp3: encoding");

        let result = Command::new(&self.program)
            .args(["-hide_banner", "-loglevel", "error", "-i"])
            .arg(&input)
            .args(["-codec:a", "libmp3lame", "-b:a", self.bitrate.as_str()])
            .arg(&output)
            .arg("-y")
            .stdin(Stdio::null())
            .output();

        let out = match result {
            Ok(out) => out,
            Err(e) => {
                return Err(AudioError::EncoderUnavailable(format!(
                    "{}: {}",
                    self.program.display(),
                    e
                )));
            }
        };

        if !out.status.success() {
            return Err(AudioError::EncoderFailed {
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }

        Ok(std::fs::read(&output)?)
    }
}

/// An encoder that is switched off by configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEncoder;

impl Mp3Encoder for DisabledEncoder {
    fn name(&self) -> &str {
        "disabled"
    }

    fn encode(&self, _wav: &[u8]) -> Result<Vec<u8>> {
        Err(AudioError::EncoderUnavailable(
            "mp3 encoding is disabled".to_string(),
        ))
    }
}
