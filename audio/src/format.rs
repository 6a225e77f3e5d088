//! Output container formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Encoded output format of synthesized speech.
///
/// Deserializes leniently through [`ResponseFormat::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ResponseFormat {
    #[default]
    Wav,
    Flac,
    Mp3,
}

impl ResponseFormat {
    /// Parses a requested format name.
    ///
    /// Unknown names fall back to [`ResponseFormat::Wav`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "flac" => ResponseFormat::Flac,
            "mp3" => ResponseFormat::Mp3,
            _ => ResponseFormat::Wav,
        }
    }

    /// Returns the canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Wav => "wav",
            ResponseFormat::Flac => "flac",
            ResponseFormat::Mp3 => "mp3",
        }
    }

    /// Returns the MIME type of the encoded bytes.
    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseFormat::Wav => "audio/wav",
            ResponseFormat::Flac => "audio/flac",
            ResponseFormat::Mp3 => "audio/mpeg",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl From<String> for ResponseFormat {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}
