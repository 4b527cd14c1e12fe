//! Console entrypoint: ask one question of a local PDF, chunk by chunk.
//!
//! Missing `--file`/`--question` values are prompted for interactively. Every chunk is sent to
//! the model and the earliest chunk with a real answer is reported.
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use pdfchat::{
    config, logging,
    extraction::PdfTextExtractor,
    model::{AnthropicClient, AnthropicSettings},
    processing::{BatchOutcome, BatchSettings, answer_from_file},
};

#[derive(Parser)]
#[command(
    name = "pdfchat-batch",
    about = "Ask a question about a PDF, querying the model once per text chunk"
)]
struct Cli {
    /// Path to the PDF; prompted for when omitted.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Question to ask; prompted for when omitted.
    #[arg(long)]
    question: Option<String>,
    /// Chunk size in characters (defaults to `CHUNK_SIZE`).
    #[arg(long)]
    chunk_size: Option<usize>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing_with("warn");
    config::init_config().context("failed to load configuration")?;
    let config = config::get_config();

    let path = match cli.file {
        Some(path) => path,
        None => PathBuf::from(prompt("Enter the path to your PDF file: ")?),
    };
    let question = match cli.question {
        Some(question) => question,
        None => prompt("What would you like to know about the document? ")?,
    };
    if question.trim().is_empty() {
        bail!("a question is required");
    }

    let settings = BatchSettings {
        chunk_size: cli.chunk_size.unwrap_or(config.chunk_size),
        concurrency: config.batch_concurrency,
    };
    let client = AnthropicClient::new(AnthropicSettings::from(config))
        .context("failed to build model client")?;

    let outcome = answer_from_file(
        Arc::new(PdfTextExtractor),
        &client,
        &path,
        question.trim(),
        settings,
    )
    .await
    .with_context(|| format!("could not process {}", path.display()))?;

    print!("{}", render_outcome(&outcome));
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    stdout.write_all(label.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn render_outcome(outcome: &BatchOutcome) -> String {
    let mut report = format!("Document split into {} chunk(s).\n", outcome.chunk_count);
    for failure in &outcome.failures {
        report.push_str(&format!(
            "Chunk {}: the model request failed; skipping.\n",
            failure.chunk_index + 1
        ));
    }
    match &outcome.answer {
        Some(record) => report.push_str(&format!(
            "\nAnswer (from chunk {}):\n{}\n",
            record.chunk_index + 1,
            record.answer
        )),
        None => report.push_str("\nNo answer found in the document.\n"),
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfchat::{
        model::ModelError,
        processing::{AnswerRecord, ChunkFailure},
    };

    #[test]
    fn render_outcome_reports_one_based_chunk() {
        let outcome = BatchOutcome {
            chunk_count: 3,
            answer: Some(AnswerRecord {
                chunk_index: 1,
                answer: "The answer is 42.".into(),
            }),
            failures: vec![ChunkFailure {
                chunk_index: 2,
                error: ModelError::Unavailable("offline".into()),
            }],
        };

        let report = render_outcome(&outcome);
        assert!(report.starts_with("Document split into 3 chunk(s).\n"));
        assert!(report.contains("Chunk 3: the model request failed"));
        assert!(report.contains("Answer (from chunk 2):\nThe answer is 42.\n"));
        assert!(!report.contains("offline"));
    }

    #[test]
    fn render_outcome_reports_not_found() {
        let outcome = BatchOutcome {
            chunk_count: 0,
            answer: None,
            failures: Vec::new(),
        };
        assert!(render_outcome(&outcome).ends_with("No answer found in the document.\n"));
    }

    #[test]
    fn cli_accepts_all_flags() {
        let cli = Cli::try_parse_from([
            "pdfchat-batch",
            "--file",
            "doc.pdf",
            "--question",
            "Why?",
            "--chunk-size",
            "500",
        ])
        .expect("parse");
        assert_eq!(cli.file, Some(PathBuf::from("doc.pdf")));
        assert_eq!(cli.question.as_deref(), Some("Why?"));
        assert_eq!(cli.chunk_size, Some(500));
    }
}
