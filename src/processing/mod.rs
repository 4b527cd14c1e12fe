//! Question-answering pipeline: prompt rendering, chunking, and the chunk scan.

pub mod batch;
pub mod chunking;
pub mod prompt;
pub mod types;

pub use batch::{BatchSettings, answer_from_file, query_chunks};
pub use chunking::chunk_text;
pub use prompt::{SENTINEL_PHRASE, build_prompt, is_sentinel};
pub use types::{AnswerRecord, BatchError, BatchOutcome, ChunkFailure, ChunkingError};
