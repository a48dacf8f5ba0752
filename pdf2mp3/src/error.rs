//! Fatal pipeline errors.

use crate::audio::MergeError;
use crate::document::ExtractError;
use std::path::PathBuf;
use thiserror::Error;
use tts_client::TtsError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("File not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error("No text could be extracted from {}", .0.display())]
    EmptyText(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Speech synthesis failed for chunk {index}: {source}")]
    Synthesis {
        index: usize,
        #[source]
        source: TtsError,
    },

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("Merge task stopped unexpectedly")]
    MergeTask(#[source] tokio::task::JoinError),

    #[error("Failed to prepare output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cancelled")]
    Cancelled,
}

impl PipelineError {
    /// A required external tool or service is missing, not the input's fault
    pub fn is_dependency_error(&self) -> bool {
        match self {
            Self::Synthesis { source, .. } => matches!(
                source,
                TtsError::ProviderUnavailable(_) | TtsError::MissingApiKey { .. }
            ),
            Self::Merge(MergeError::FfmpegMissing) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = PipelineError::DocumentNotFound(PathBuf::from("book.pdf"));
        assert_eq!(err.to_string(), "File not found: book.pdf");

        let err = PipelineError::EmptyText(PathBuf::from("scan.pdf"));
        assert_eq!(err.to_string(), "No text could be extracted from scan.pdf");

        let err = PipelineError::Synthesis {
            index: 4,
            source: TtsError::ServerOverloaded {
                message: "busy".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "Speech synthesis failed for chunk 4: Server overloaded (HTTP 503): busy"
        );
    }

    #[test]
    fn test_dependency_classification() {
        assert!(PipelineError::Merge(MergeError::FfmpegMissing).is_dependency_error());
        assert!(
            PipelineError::Synthesis {
                index: 1,
                source: TtsError::ProviderUnavailable("edge-tts not found".to_string()),
            }
            .is_dependency_error()
        );
        assert!(!PipelineError::Cancelled.is_dependency_error());
    }
}
