//! Audio concatenation using FFmpeg.

use super::{AudioJoiner, MergeError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tts_client::AudioFormat;

/// Joins files with FFmpeg's concat demuxer and re-encodes the result.
#[derive(Debug, Clone)]
pub struct FfmpegJoiner {
    /// Explicit ffmpeg binary, or None to use the one on PATH
    ffmpeg_path: Option<PathBuf>,
    format: AudioFormat,
    bitrate: String,
}

impl FfmpegJoiner {
    pub fn new(format: AudioFormat, bitrate: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: None,
            format,
            bitrate: bitrate.into(),
        }
    }

    pub fn with_ffmpeg_path(mut self, path: Option<PathBuf>) -> Self {
        self.ffmpeg_path = path;
        self
    }

    /// Get the FFmpeg command, preferring the configured binary.
    fn ffmpeg_command(&self) -> Command {
        match &self.ffmpeg_path {
            Some(path) => Command::new(path),
            None => Command::new("ffmpeg"),
        }
    }

    /// Encoder arguments for the output format.
    fn codec_args(&self) -> Vec<String> {
        let codec = match self.format {
            AudioFormat::Mp3 => "libmp3lame",
            AudioFormat::Opus => "libopus",
            AudioFormat::Wav => "pcm_s16le",
        };

        let mut args = vec!["-c:a".to_string(), codec.to_string()];
        if self.format != AudioFormat::Wav {
            args.push("-b:a".to_string());
            args.push(self.bitrate.clone());
        }
        args
    }
}

/// Build the concat demuxer list file contents.
fn concat_list(inputs: &[&Path]) -> String {
    let mut list_content = String::new();
    for path in inputs {
        // Escape single quotes in path
        let path_str = path.to_string_lossy().replace('\'', "'\\''");
        list_content.push_str(&format!("file '{}'\n", path_str));
    }
    list_content
}

fn spawn_error(e: std::io::Error) -> MergeError {
    if e.kind() == ErrorKind::NotFound {
        MergeError::FfmpegMissing
    } else {
        MergeError::Io(e)
    }
}

impl AudioJoiner for FfmpegJoiner {
    fn join(&self, inputs: &[&Path], output: &Path) -> Result<(), MergeError> {
        if inputs.is_empty() {
            return Err(MergeError::NothingToJoin);
        }

        // The demuxer resolves relative entries against the list file's directory
        let absolute: Vec<PathBuf> = inputs
            .iter()
            .map(std::path::absolute)
            .collect::<Result<_, _>>()?;
        let absolute: Vec<&Path> = absolute.iter().map(PathBuf::as_path).collect();

        let temp_dir = TempDir::new()?;
        let list_file = temp_dir.path().join("concat_list.txt");
        std::fs::write(&list_file, concat_list(&absolute))?;

        log::debug!("ffmpeg concat of {} files -> {}", inputs.len(), output.display());

        let result = self
            .ffmpeg_command()
            .args(["-y", "-hide_banner", "-loglevel", "error"])
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(&list_file)
            .arg("-vn")
            .args(self.codec_args())
            .arg(output)
            .output()
            .map_err(spawn_error)?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(MergeError::Ffmpeg {
                output: output.to_path_buf(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(())
    }

    fn ensure_available(&self) -> Result<(), MergeError> {
        let result = self
            .ffmpeg_command()
            .arg("-version")
            .output()
            .map_err(spawn_error)?;

        if result.status.success() {
            Ok(())
        } else {
            Err(MergeError::FfmpegMissing)
        }
    }
}
