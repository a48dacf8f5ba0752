//! Sequential, paced speech synthesis of text chunks.

pub mod pacer;

use crate::error::PipelineError;
use crate::text::TextChunk;
use pacer::Pacer;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tts_client::{AudioFormat, SpeechRequest, TtsError, TtsProvider};

/// Synthesized audio for one chunk, written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    /// Index of the source chunk (1-based)
    pub index: usize,
    pub path: PathBuf,
}

/// File name for a chunk's audio: part_NNN.<ext>
pub fn part_file_name(index: usize, format: AudioFormat) -> String {
    format!("part_{:03}.{}", index, format.extension())
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Delay before retry number `retry` (1 = first retry).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_factor.powi(retry.saturating_sub(1) as i32);
        let secs = (self.initial_delay.as_secs_f32() * factor).min(self.max_delay.as_secs_f32());
        Duration::from_secs_f32(secs)
    }
}

/// Wraps a TTS provider with a voice, call pacing and retries.
pub struct Synthesizer {
    provider: Box<dyn TtsProvider>,
    voice: String,
    format: AudioFormat,
    pacer: Pacer,
    retry: RetryPolicy,
}

impl Synthesizer {
    pub fn new(
        provider: Box<dyn TtsProvider>,
        voice: impl Into<String>,
        format: AudioFormat,
        pause: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            voice: voice.into(),
            format,
            pacer: Pacer::new(pause),
            retry,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Reject an output format the provider cannot produce.
    pub fn ensure_format_supported(&self) -> Result<(), PipelineError> {
        self.provider
            .ensure_format(self.format)
            .map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Synthesize one chunk into `output_dir/part_NNN.<ext>`.
    ///
    /// Returns once the file is completely written. The pacer is marked
    /// after every provider call, so the next call (retry or next chunk)
    /// starts no sooner than the configured pause.
    pub async fn synthesize_chunk(
        &mut self,
        chunk: &TextChunk,
        output_dir: &Path,
    ) -> Result<AudioArtifact, PipelineError> {
        let request = SpeechRequest::new(chunk.content.as_str(), self.voice.as_str())
            .with_format(self.format);
        let path = output_dir.join(part_file_name(chunk.index, self.format));
        log::debug!(
            "Chunk {}: {} chars (limit {}), {} words",
            chunk.index,
            chunk.char_len(),
            chunk.approx_size,
            chunk.words().count()
        );

        let audio = self.request_with_retry(chunk.index, request).await?;

        tokio::fs::write(&path, &audio).await?;
        self.pacer.mark();

        Ok(AudioArtifact {
            index: chunk.index,
            path,
        })
    }

    async fn request_with_retry(
        &mut self,
        index: usize,
        request: SpeechRequest,
    ) -> Result<Vec<u8>, PipelineError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.pacer.wait().await;

            let result = self.provider.synthesize(request.clone()).await;
            match result {
                Ok(response) if response.format == self.format => return Ok(response.audio),
                Ok(response) => {
                    self.pacer.mark();
                    let source = TtsError::ConfigError(format!(
                        "{} returned {} audio, expected {}",
                        self.provider.name(),
                        response.format.extension(),
                        self.format.extension()
                    ));
                    return Err(PipelineError::Synthesis { index, source });
                }
                Err(e) => {
                    self.pacer.mark();

                    if !e.is_retryable() || attempt >= self.retry.max_attempts {
                        return Err(PipelineError::Synthesis { index, source: e });
                    }

                    let delay = retry_delay(&self.retry, attempt, &e);
                    log::warn!(
                        "Chunk {} failed (attempt {}/{}): {}. Retrying in {:?}",
                        index,
                        attempt,
                        self.retry.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Backoff delay, stretched to honour a server-requested wait.
fn retry_delay(policy: &RetryPolicy, attempt: u32, error: &TtsError) -> Duration {
    let backoff = policy.delay_for(attempt);
    match error.retry_after_secs() {
        Some(secs) => backoff.max(Duration::from_secs(secs)),
        None => backoff,
    }
}
