//! Chunk-by-chunk question scan.
//!
//! Every chunk is queried, even after a useful answer turns up; selection happens only once all
//! results are in, so the earliest chunk mentioning the answer always wins.

use super::chunking::chunk_text;
use super::prompt::{build_prompt, is_sentinel};
use super::types::{AnswerRecord, BatchError, BatchOutcome, ChunkFailure};
use crate::extraction::{TextExtractor, extract_blocking};
use crate::model::{ModelClient, ModelError};
use futures_util::{StreamExt, stream};
use std::path::Path;
use std::sync::Arc;

/// Knobs for a batch run.
#[derive(Debug, Clone, Copy)]
pub struct BatchSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Model calls kept in flight.
    pub concurrency: usize,
}

/// Read the PDF at `path`, split its text, and scan every chunk for an answer to `question`.
///
/// Reading, extraction, and chunk-size problems abort the run; model failures only skip the
/// affected chunk.
pub async fn answer_from_file(
    extractor: Arc<dyn TextExtractor>,
    client: &dyn ModelClient,
    path: &Path,
    question: &str,
    settings: BatchSettings,
) -> Result<BatchOutcome, BatchError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| BatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let text = extract_blocking(extractor, bytes).await?;
    let chunks = chunk_text(&text, settings.chunk_size)?;
    tracing::info!(
        path = %path.display(),
        text_length = text.chars().count(),
        chunks = chunks.len(),
        chunk_size = settings.chunk_size,
        "Document split into chunks"
    );
    Ok(query_chunks(client, &chunks, question, settings.concurrency).await)
}

/// Ask `question` against each chunk and return the lowest-index useful answer.
///
/// `concurrency` bounds the number of model calls in flight (`1` is strictly sequential;
/// `0` is treated as `1`). Results are collected in chunk order regardless of completion order.
/// A failed call is recorded and the scan continues; nothing is retried.
pub async fn query_chunks(
    client: &dyn ModelClient,
    chunks: &[String],
    question: &str,
    concurrency: usize,
) -> BatchOutcome {
    let results: Vec<(usize, Result<String, ModelError>)> =
        stream::iter(chunks.iter().enumerate())
            .map(|(index, chunk)| async move {
                tracing::debug!(chunk = index + 1, total = chunks.len(), "Querying chunk");
                let prompt = build_prompt(chunk, question);
                (index, client.ask(&prompt).await)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await;

    let mut records = Vec::new();
    let mut failures = Vec::new();
    for (chunk_index, result) in results {
        match result {
            Ok(answer) => {
                let answer = answer.trim();
                if is_sentinel(answer) {
                    tracing::debug!(chunk = chunk_index + 1, "Chunk did not contain the answer");
                } else {
                    records.push(AnswerRecord {
                        chunk_index,
                        answer: answer.to_string(),
                    });
                }
            }
            Err(error) => {
                tracing::warn!(chunk = chunk_index + 1, error = %error, "Chunk query failed");
                failures.push(ChunkFailure { chunk_index, error });
            }
        }
    }

    let useful = records.len();
    let answer = records.into_iter().min_by_key(|record| record.chunk_index);
    tracing::info!(
        chunks = chunks.len(),
        useful,
        failed = failures.len(),
        answered_by = ?answer.as_ref().map(|record| record.chunk_index + 1),
        "Chunk scan finished"
    );

    BatchOutcome {
        chunk_count: chunks.len(),
        answer,
        failures,
    }
}
