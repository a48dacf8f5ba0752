//! pdf2mp3 configuration management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use tts_client::AudioFormat;

use crate::error::PipelineError;
use crate::text::chunker::DEFAULT_CHUNK_SIZE;

const DEFAULT_VOICE: &str = "en-US-JennyNeural";
const DEFAULT_MERGE_COUNT: usize = 7;
const DEFAULT_PAUSE_SECS: f64 = 2.0;
/// Longest accepted pause between synthesis calls (one hour)
const MAX_PAUSE_SECS: f64 = 3600.0;
const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_BITRATE: &str = "128k";

/// What to do with a chunk whose synthesis keeps failing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run at the first chunk that cannot be synthesized
    #[default]
    Abort,
    /// Leave the chunk out of the merge and report it at the end
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Character threshold per text chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Directory receiving part_NNN and final_part_NNN files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Voice identifier passed to the TTS provider
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Desired number of merged files (approximate)
    #[serde(default = "default_merge_count")]
    pub merge_count: usize,

    /// Minimum seconds between consecutive synthesis calls
    #[serde(default = "default_pause_secs")]
    pub pause_secs: f64,

    /// Attempts per chunk for transient provider failures
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default)]
    pub on_failure: FailurePolicy,

    /// Bitrate for merged files (ffmpeg syntax, e.g. "128k")
    #[serde(default = "default_bitrate")]
    pub bitrate: String,

    #[serde(default)]
    pub format: AudioFormat,

    /// TTS provider name. None means the default from tts.toml.
    #[serde(default)]
    pub provider: Option<String>,

    /// FFmpeg binary. None means `ffmpeg` on PATH.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output_mp3s")
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_merge_count() -> usize {
    DEFAULT_MERGE_COUNT
}

fn default_pause_secs() -> f64 {
    DEFAULT_PAUSE_SECS
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_bitrate() -> String {
    DEFAULT_BITRATE.to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            output_dir: default_output_dir(),
            voice: default_voice(),
            merge_count: default_merge_count(),
            pause_secs: default_pause_secs(),
            retries: default_retries(),
            on_failure: FailurePolicy::default(),
            bitrate: default_bitrate(),
            format: AudioFormat::default(),
            provider: None,
            ffmpeg_path: None,
        }
    }
}

impl PipelineConfig {
    /// Get the config file path: ~/.config/cli-programs/pdf2mp3.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("pdf2mp3.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: PipelineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Reject values the pipeline has no rule for.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.chunk_size == 0 {
            return Err(PipelineError::Config("chunk_size must be > 0".into()));
        }
        if self.merge_count == 0 {
            return Err(PipelineError::Config("merge_count must be > 0".into()));
        }
        let pause_in_range = Duration::try_from_secs_f64(self.pause_secs).is_ok()
            && self.pause_secs <= MAX_PAUSE_SECS;
        if !pause_in_range {
            return Err(PipelineError::Config(format!(
                "pause_secs must be between 0 and {} seconds",
                MAX_PAUSE_SECS
            )));
        }
        if self.retries == 0 {
            return Err(PipelineError::Config("retries must be at least 1".into()));
        }
        Ok(())
    }

    /// Chunk threshold as the non-zero value the chunker requires
    pub fn chunk_limit(&self) -> Result<NonZeroUsize, PipelineError> {
        NonZeroUsize::new(self.chunk_size)
            .ok_or_else(|| PipelineError::Config("chunk_size must be > 0".into()))
    }

    pub fn pause(&self) -> Duration {
        Duration::try_from_secs_f64(self.pause_secs.min(MAX_PAUSE_SECS)).unwrap_or(Duration::ZERO)
    }
}
