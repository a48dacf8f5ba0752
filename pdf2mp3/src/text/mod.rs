//! Text processing for TTS: splitting extracted document text into chunks.

pub mod chunker;

pub use chunker::split;

/// A chunk of document text ready for TTS processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// 1-based position in the document
    pub index: usize,
    /// Words of the chunk joined by single spaces
    pub content: String,
    /// Character threshold the chunk was closed against
    pub approx_size: usize,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(index: usize, content: String, approx_size: usize) -> Self {
        Self {
            index,
            content,
            approx_size,
        }
    }

    /// Length of the content in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// The whitespace-separated words of this chunk.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.content.split_whitespace()
    }
}
