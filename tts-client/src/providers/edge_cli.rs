//! edge-tts CLI provider
//!
//! Uses the installed `edge-tts` command as a subprocess. The CLI talks to the
//! Microsoft Edge read-aloud service and always produces MP3.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

use crate::error::{Result, TtsError};
use crate::provider::{AudioFormat, SpeechRequest, SpeechResponse, TtsProvider};

/// Provider that uses the edge-tts CLI (subprocess)
pub struct EdgeTtsProvider {
    cli_path: PathBuf,
}

impl EdgeTtsProvider {
    /// Create a new edge-tts provider
    ///
    /// Returns an error if the edge-tts CLI is not found.
    pub fn new(cli_path: Option<PathBuf>) -> Result<Self> {
        let cli_path = match cli_path {
            Some(path) => {
                if !path.exists() {
                    return Err(TtsError::ProviderUnavailable(format!(
                        "edge-tts not found at specified path: {}",
                        path.display()
                    )));
                }
                path
            }
            None => which::which("edge-tts").map_err(|_| {
                TtsError::ProviderUnavailable(
                    "edge-tts not found. Install it with: pip install edge-tts".into(),
                )
            })?,
        };

        Ok(Self { cli_path })
    }
}

#[async_trait]
impl TtsProvider for EdgeTtsProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse> {
        self.ensure_format(request.format)?;

        // Text goes through a file so long chunks don't hit argv limits
        let text_file = tempfile::Builder::new()
            .prefix("edge-tts-")
            .suffix(".txt")
            .tempfile()?;
        tokio::fs::write(text_file.path(), request.text.as_bytes()).await?;

        let media_file = tempfile::Builder::new()
            .prefix("edge-tts-")
            .suffix(".mp3")
            .tempfile()?;

        let output = Command::new(&self.cli_path)
            .args(["--voice", &request.voice])
            .arg("--file")
            .arg(text_file.path())
            .arg("--write-media")
            .arg(media_file.path())
            .output()
            .await
            .map_err(|e| TtsError::CliError(format!("Failed to execute: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TtsError::CliError(format!(
                "Command failed: {}",
                stderr.trim()
            )));
        }

        let audio = tokio::fs::read(media_file.path()).await?;
        if audio.is_empty() {
            return Err(TtsError::EmptyAudio {
                voice: request.voice,
            });
        }

        log::debug!(
            "edge-tts produced {} bytes for {} chars",
            audio.len(),
            request.text.chars().count()
        );

        Ok(SpeechResponse {
            audio,
            format: AudioFormat::Mp3,
        })
    }

    fn name(&self) -> &'static str {
        "edge-tts"
    }

    fn is_available(&self) -> Result<()> {
        // Availability was checked in constructor
        Ok(())
    }

    fn supports_format(&self, format: AudioFormat) -> bool {
        format == AudioFormat::Mp3
    }
}
