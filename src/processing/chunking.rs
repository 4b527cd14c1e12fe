//! Fixed-length text chunking for the batch flow.
//!
//! Chunks are measured in characters (Unicode scalar values) and cut with no regard for words
//! or sentences, so every chunk except possibly the last is exactly `max_size` characters long.

use super::types::ChunkingError;

/// Split `text` into the fewest contiguous, non-overlapping pieces of at most `max_size`
/// characters. Concatenating the result reproduces `text` exactly.
///
/// Empty input yields no chunks; a zero `max_size` is rejected.
pub fn chunk_text(text: &str, max_size: usize) -> Result<Vec<String>, ChunkingError> {
    if max_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }

    let mut chunks = Vec::with_capacity(text.len().div_ceil(max_size));
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in text.char_indices() {
        if count == max_size {
            chunks.push(text[start..offset].to_string());
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(text[start..].to_string());
    }
    Ok(chunks)
}
