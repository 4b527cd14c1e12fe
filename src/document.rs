//! In-memory holder for the currently loaded document.
//!
//! One [`DocumentStore`] lives in the router state; handlers receive it explicitly rather than
//! reaching for a global. Writes replace the whole document, so concurrent uploads resolve as
//! last-writer-wins and an ask racing a clear answers from the snapshot it already took.

use serde::Serialize;
use tokio::sync::RwLock;

/// The document questions are answered against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Original name of the uploaded file.
    pub filename: String,
    /// Extracted plain text.
    pub content: String,
    /// Whether a document is loaded.
    pub has_file: bool,
}

impl Document {
    /// Build a loaded document.
    pub fn loaded(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            has_file: true,
        }
    }

    /// Length of the extracted text in characters.
    pub fn text_length(&self) -> usize {
        self.content.chars().count()
    }
}

/// Read-only view reported by `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatus {
    /// Whether a document is loaded.
    pub has_file: bool,
    /// Loaded filename, empty when none.
    pub filename: String,
    /// Extracted text length in characters.
    pub text_length: usize,
}

/// Single-slot document store.
#[derive(Debug, Default)]
pub struct DocumentStore {
    current: RwLock<Document>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is loaded with `document`.
    pub async fn replace(&self, document: Document) {
        *self.current.write().await = document;
    }

    /// Clone the current document.
    pub async fn snapshot(&self) -> Document {
        self.current.read().await.clone()
    }

    /// Report presence, filename, and text length without cloning the text.
    pub async fn status(&self) -> DocumentStatus {
        let current = self.current.read().await;
        DocumentStatus {
            has_file: current.has_file,
            filename: current.filename.clone(),
            text_length: current.text_length(),
        }
    }

    /// Reset to the empty document. Safe to call repeatedly.
    pub async fn clear(&self) {
        *self.current.write().await = Document::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_store_is_empty() {
        let store = DocumentStore::new();
        assert_eq!(
            store.status().await,
            DocumentStatus {
                has_file: false,
                filename: String::new(),
                text_length: 0,
            }
        );
    }

    #[tokio::test]
    async fn replace_overwrites_previous_document() {
        let store = DocumentStore::new();
        store.replace(Document::loaded("a.pdf", "first")).await;
        store.replace(Document::loaded("b.pdf", "second text")).await;

        let status = store.status().await;
        assert!(status.has_file);
        assert_eq!(status.filename, "b.pdf");
        assert_eq!(status.text_length, "second text".len());
        assert_eq!(store.snapshot().await.content, "second text");
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = DocumentStore::new();
        store.replace(Document::loaded("a.pdf", "text")).await;
        store.clear().await;
        store.clear().await;
        assert_eq!(store.snapshot().await, Document::default());
    }

    #[test]
    fn text_length_counts_characters() {
        assert_eq!(Document::loaded("x.pdf", "héllo").text_length(), 5);
    }

    #[test]
    fn status_serializes_camel_case() {
        let status = DocumentStatus {
            has_file: true,
            filename: "a.pdf".into(),
            text_length: 3,
        };
        let json = serde_json::to_value(status).expect("json");
        assert_eq!(
            json,
            serde_json::json!({ "hasFile": true, "filename": "a.pdf", "textLength": 3 })
        );
    }
}
