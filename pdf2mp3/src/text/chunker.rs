//! Text chunking for TTS processing.

use super::TextChunk;
use std::num::NonZeroUsize;

/// Default chunk threshold in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 6000;

/// Split text into chunks of whole words.
///
/// Words are appended one at a time; as soon as the chunk's space-joined
/// length reaches `limit` characters the chunk is closed. A chunk can
/// therefore overshoot `limit` by at most its last word, and a single word
/// longer than `limit` becomes a chunk of its own.
///
/// # Arguments
/// * `text` - The text to chunk
/// * `limit` - Character threshold at which a chunk is closed
///
/// # Returns
/// Chunks in document order, indexed from 1. Empty or whitespace-only input
/// yields no chunks.
pub fn split(text: &str, limit: NonZeroUsize) -> Vec<TextChunk> {
    let limit = limit.get();
    let mut chunks = Vec::new();
    let mut current = String::new();
    // Char length of `current`, tracked so each word costs O(word)
    let mut current_len = 0;

    for word in text.split_whitespace() {
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word.chars().count();

        if current_len >= limit {
            let index = chunks.len() + 1;
            chunks.push(TextChunk::new(index, std::mem::take(&mut current), limit));
            current_len = 0;
        }
    }

    // Don't forget the last chunk
    if !current.is_empty() {
        let index = chunks.len() + 1;
        chunks.push(TextChunk::new(index, current, limit));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limit(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn all_words(chunks: &[TextChunk]) -> Vec<String> {
        chunks
            .iter()
            .flat_map(|c| c.words().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = split("one two three four five", limit(1000));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 1);
        assert_eq!(chunks[0].content, "one two three four five");
        assert_eq!(chunks[0].approx_size, 1000);
    }

    #[test]
    fn test_empty_text() {
        assert!(split("", limit(10)).is_empty());
    }

    #[test]
    fn test_whitespace_only() {
        assert!(split("   \n\n \t  ", limit(10)).is_empty());
    }

    #[test]
    fn test_long_word_is_own_chunk() {
        let chunks = split("supercalifragilistic", limit(5));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "supercalifragilistic");

        let chunks = split("a supercalifragilistic b", limit(5));
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["a supercalifragilistic", "b"]);
    }

    #[test]
    fn test_boundary_after_reaching_limit() {
        // "one two" is 7 chars: closes at exactly the limit
        let chunks = split("one two three four five", limit(7));
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["one two", "three", "four five"]);
        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let chunks = split("  Hello,\n\nworld!\tHow   are\r\nyou?  ", limit(1000));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Hello, world! How are you?");
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // Each word is 2 chars but 4 bytes; "éé éé" is 5 chars
        let chunks = split("éé éé éé", limit(5));
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["éé éé", "éé"]);
    }

    proptest! {
        #[test]
        fn prop_words_are_preserved(
            words in prop::collection::vec("[a-zA-Z0-9.,'é]{1,12}", 0..200),
            seps in prop::collection::vec(prop::sample::select(vec![" ", "  ", "\n", "\t", " \n "]), 200),
            n in 1usize..80,
        ) {
            let mut text = String::new();
            for (word, sep) in words.iter().zip(seps.iter()) {
                text.push_str(word);
                text.push_str(sep);
            }

            let chunks = split(&text, limit(n));
            prop_assert_eq!(all_words(&chunks), words);
            prop_assert!(chunks.iter().all(|c| !c.content.is_empty()));
        }

        #[test]
        fn prop_chunks_close_at_limit(
            words in prop::collection::vec("[a-z]{1,15}", 1..200),
            n in 1usize..120,
        ) {
            let text = words.join(" ");
            let chunks = split(&text, limit(n));

            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, i + 1);
                let last_word_len = chunk.words().last().map(|w| w.chars().count()).unwrap_or(0);
                if i + 1 < chunks.len() {
                    prop_assert!(chunk.char_len() >= n);
                }
                // Overshoot is bounded by the final word
                prop_assert!(chunk.char_len() < n + last_word_len + 1);
            }
        }

        #[test]
        fn prop_limit_above_text_gives_one_chunk(
            words in prop::collection::vec("[a-z]{1,10}", 1..50),
        ) {
            let text = words.join(" ");
            let chunks = split(&text, limit(text.chars().count() + 1));
            prop_assert_eq!(chunks.len(), 1);
            prop_assert_eq!(&chunks[0].content, &text);
        }

        #[test]
        fn prop_split_is_deterministic(text in "[a-z \n]{0,400}", n in 1usize..60) {
            prop_assert_eq!(split(&text, limit(n)), split(&text, limit(n)));
        }
    }
}
