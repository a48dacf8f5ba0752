//! Merging per-chunk audio into a handful of final files.

pub mod ffmpeg;
pub mod merger;

pub use ffmpeg::FfmpegJoiner;
pub use merger::{MergedArtifact, Merger, plan_groups};

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error(
        "FFmpeg not found. Install it (e.g. 'brew install ffmpeg' or 'apt install ffmpeg') \
         or set ffmpeg_path in pdf2mp3.toml"
    )]
    FfmpegMissing,

    #[error("ffmpeg failed writing {}: {stderr}", output.display())]
    Ffmpeg { output: PathBuf, stderr: String },

    #[error("No audio files provided")]
    NothingToJoin,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Concatenates encoded audio files into one encoded file.
///
/// Inputs are joined back to back in the given order, with no gap,
/// cross-fade or trimming.
pub trait AudioJoiner: Send + Sync {
    fn join(&self, inputs: &[&Path], output: &Path) -> Result<(), MergeError>;

    /// Fail early if the joiner's external tooling is missing.
    fn ensure_available(&self) -> Result<(), MergeError> {
        Ok(())
    }
}

/// Byte-level concatenation, standing in for an encoder in tests
#[cfg(test)]
pub(crate) struct CatJoiner;

#[cfg(test)]
impl AudioJoiner for CatJoiner {
    fn join(&self, inputs: &[&Path], output: &Path) -> Result<(), MergeError> {
        use std::io::Write;

        if inputs.is_empty() {
            return Err(MergeError::NothingToJoin);
        }
        let mut file = std::fs::File::create(output)?;
        for input in inputs {
            file.write_all(&std::fs::read(input)?)?;
        }
        Ok(())
    }
}
