// Document loading and text extraction

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions read verbatim instead of being parsed as PDF
const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to parse PDF {}: {message}", path.display())]
    Pdf { path: PathBuf, message: String },

    #[error("PDF parser crashed on {}", path.display())]
    ParserPanicked { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How a document's text is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Pick the reader from the file extension; unknown extensions are PDF
    pub fn detect(path: &Path) -> Self {
        let is_text = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| PLAIN_TEXT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);

        if is_text { Self::PlainText } else { Self::Pdf }
    }
}

/// Extract the full plain text of a document.
///
/// PDF parsing is CPU-bound and the parser is known to panic on some
/// malformed files, so it runs on the blocking pool where a panic surfaces
/// as a join error instead of taking the process down.
pub async fn extract_text(path: &Path) -> Result<String, ExtractError> {
    match DocumentKind::detect(path) {
        DocumentKind::PlainText => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ExtractError::Read {
                    path: path.to_path_buf(),
                    source,
                })
        }
        DocumentKind::Pdf => {
            let owned = path.to_path_buf();
            let result = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned)).await;

            match result {
                Ok(Ok(text)) => Ok(text),
                Ok(Err(e)) => Err(ExtractError::Pdf {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }),
                Err(_) => Err(ExtractError::ParserPanicked {
                    path: path.to_path_buf(),
                }),
            }
        }
    }
}

/// Word count of extracted text (approximate, whitespace-separated)
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
