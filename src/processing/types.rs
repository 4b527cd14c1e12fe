//! Data types and error definitions for the chunked question flow.

use crate::extraction::ExtractionError;
use crate::model::ModelError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while splitting text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// A zero-length chunk budget can never make progress.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Errors that abort a whole batch run before any chunk is queried.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The input file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file was read but is not a parseable PDF.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// The configured chunk size was rejected.
    #[error(transparent)]
    Chunking(#[from] ChunkingError),
}

/// A useful answer and the chunk it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Zero-based position of the chunk in document order.
    pub chunk_index: usize,
    /// Trimmed model answer.
    pub answer: String,
}

/// A chunk whose model call failed; the scan moved on without it.
#[derive(Debug)]
pub struct ChunkFailure {
    /// Zero-based position of the chunk in document order.
    pub chunk_index: usize,
    /// Error returned by the model client.
    pub error: ModelError,
}

/// Result of scanning every chunk of a document.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Number of chunks that were queried.
    pub chunk_count: usize,
    /// Lowest-index non-sentinel answer, if any chunk produced one.
    pub answer: Option<AnswerRecord>,
    /// Per-chunk failures in chunk order.
    pub failures: Vec<ChunkFailure>,
}

impl BatchOutcome {
    /// Whether no chunk yielded a useful answer.
    pub fn is_not_found(&self) -> bool {
        self.answer.is_none()
    }
}
