//! PDF text extraction and upload type screening.
//!
//! Parsing is delegated to `pdf-extract`. The [`TextExtractor`] trait is the seam the HTTP
//! handlers and the batch CLI depend on, so tests can substitute canned text.

use std::sync::Arc;
use thiserror::Error;

/// The only MIME type accepted for uploads.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Errors raised while turning PDF bytes into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The bytes could not be parsed as a PDF.
    #[error("failed to extract text from PDF: {0}")]
    Unparseable(String),
    /// The extraction task panicked or was cancelled.
    #[error("extraction task aborted: {0}")]
    Aborted(String),
}

/// Converts raw document bytes into plain text.
pub trait TextExtractor: Send + Sync {
    /// Extract the full text of the document held in `bytes`.
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Production extractor backed by `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|error| ExtractionError::Unparseable(error.to_string()))
    }
}

/// Run `extractor` on the blocking pool so large documents do not stall the runtime.
///
/// A panic inside the PDF library surfaces as [`ExtractionError::Aborted`].
pub async fn extract_blocking(
    extractor: Arc<dyn TextExtractor>,
    bytes: Vec<u8>,
) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extractor.extract(&bytes))
        .await
        .map_err(|error| ExtractionError::Aborted(error.to_string()))?
}

/// Outcome of screening an upload's declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeCheck {
    /// The upload may proceed to extraction.
    Accepted,
    /// The upload must be refused; carries a log-friendly reason.
    Rejected(String),
}

impl MimeCheck {
    /// Whether the check passed.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Decide whether a declared content type is a PDF.
///
/// Comparison ignores case and any parameters after `;`. A missing type is rejected.
pub fn is_accepted_mime_type(content_type: Option<&str>) -> MimeCheck {
    let Some(raw) = content_type else {
        return MimeCheck::Rejected("no content type supplied".to_string());
    };
    let essence = raw.split(';').next().unwrap_or_default().trim();
    if essence.eq_ignore_ascii_case(PDF_MIME_TYPE) {
        MimeCheck::Accepted
    } else {
        MimeCheck::Rejected(format!("unsupported content type '{raw}'"))
    }
}
