use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TtsError};

/// Encoded audio container produced by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Opus,
}

impl AudioFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Opus => "opus",
        }
    }
}

/// Request to synthesize one piece of text
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
    pub format: AudioFormat,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            format: AudioFormat::default(),
        }
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }
}

/// Synthesized audio returned by a provider
#[derive(Debug, Clone)]
pub struct SpeechResponse {
    pub audio: Vec<u8>,
    pub format: AudioFormat,
}

/// Trait for speech synthesis providers
#[async_trait]
pub trait TtsProvider: Send + Sync {
    /// Synthesize the request text into encoded audio bytes
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Check if the provider is usable (API key set, CLI installed, etc.)
    fn is_available(&self) -> Result<()>;

    /// Whether the provider can produce audio in `format`
    fn supports_format(&self, _format: AudioFormat) -> bool {
        true
    }

    /// Fail early when `format` cannot be produced
    fn ensure_format(&self, format: AudioFormat) -> Result<()> {
        if self.supports_format(format) {
            Ok(())
        } else {
            Err(TtsError::ConfigError(format!(
                "{} cannot produce {} audio",
                self.name(),
                format.extension()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_format_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: AudioFormat,
        }
        let parsed: Wrapper = toml::from_str("format = \"opus\"").unwrap();
        assert_eq!(parsed.format, AudioFormat::Opus);
        assert!(toml::from_str::<Wrapper>("format = \"flac\"").is_err());
    }

    #[test]
    fn test_speech_request_defaults_to_mp3() {
        let request = SpeechRequest::new("Hello", "en-US-JennyNeural");
        assert_eq!(request.format, AudioFormat::Mp3);
        assert_eq!(request.format.extension(), "mp3");

        let request = request.with_format(AudioFormat::Wav);
        assert_eq!(request.format.extension(), "wav");
    }
}
