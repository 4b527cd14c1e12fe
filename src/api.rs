//! HTTP surface for the PDF question service.
//!
//! - `POST /upload` – Multipart field `pdfFile`; extracts the PDF's text and makes it the current
//!   document. Returns `{ success, message, filename?, textLength? }`.
//! - `POST /ask` – JSON `{ "question": "..." }`; answers from the full text of the current
//!   document in a single model call. Returns `{ success, question?, answer?, filename?, message? }`.
//! - `GET /status` – `{ hasFile, filename, textLength }` for the current document.
//! - `POST /clear` – Forget the current document.
//!
//! Anything else is served from the public asset directory. Failures reach the caller only as a
//! fixed message; the underlying error is logged.

use crate::document::{Document, DocumentStatus, DocumentStore};
use crate::extraction::{
    ExtractionError, MimeCheck, TextExtractor, extract_blocking, is_accepted_mime_type,
};
use crate::model::{ModelClient, ModelError};
use crate::processing::build_prompt;
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tower_http::services::ServeDir;
use uuid::Uuid;

/// Multipart field carrying the uploaded PDF.
pub const UPLOAD_FIELD: &str = "pdfFile";

/// Shared handler context: the document slot plus the collaborators that fill and query it.
pub struct AppState {
    /// Currently loaded document.
    pub documents: DocumentStore,
    /// Model used to answer questions.
    pub model: Arc<dyn ModelClient>,
    /// Extractor applied to uploads.
    pub extractor: Arc<dyn TextExtractor>,
    /// Scratch directory for uploads awaiting extraction; must exist.
    pub upload_dir: PathBuf,
}

impl AppState {
    /// Build state with an empty document store.
    pub fn new(
        model: Arc<dyn ModelClient>,
        extractor: Arc<dyn TextExtractor>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            documents: DocumentStore::new(),
            model,
            extractor,
            upload_dir: upload_dir.into(),
        }
    }
}

/// Build the router for the question service.
pub fn create_router(
    state: Arc<AppState>,
    public_dir: impl AsRef<Path>,
    upload_max_bytes: usize,
) -> Router {
    Router::new()
        .route("/upload", post(upload_document))
        .route("/ask", post(ask_question))
        .route("/status", get(get_status))
        .route("/clear", post(clear_document))
        .fallback_service(ServeDir::new(public_dir.as_ref()))
        .layer(DefaultBodyLimit::max(upload_max_bytes))
        .with_state(state)
}

/// Response body for `POST /upload`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    success: bool,
    message: &'static str,
    filename: String,
    text_length: usize,
}

/// Accept one PDF, extract its text, and make it the current document.
///
/// The declared content type is screened before any bytes are read. The part is spooled to
/// the upload directory and the spool file is removed once extraction finishes either way.
/// A request that is not a readable multipart body counts as carrying no file.
async fn upload_document(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    tracing::info!("Upload received");
    let mut multipart = multipart.map_err(|rejection| {
        tracing::info!(error = %rejection.body_text(), "Upload body is not multipart");
        ApiError::FileValidation(FileValidation::MissingFile)
    })?;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) || field.file_name().is_none() {
            continue;
        }
        if let MimeCheck::Rejected(reason) = is_accepted_mime_type(field.content_type()) {
            return Err(ApiError::FileValidation(FileValidation::UnsupportedType(reason)));
        }
        let filename = field.file_name().unwrap_or_default().to_string();

        let spool_path = state.upload_dir.join(Uuid::new_v4().to_string());
        let spooled = async {
            let mut file = tokio::fs::File::create(&spool_path).await?;
            while let Some(chunk) = field.chunk().await? {
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            let bytes = tokio::fs::read(&spool_path).await?;
            Ok::<_, ApiError>(extract_blocking(state.extractor.clone(), bytes).await?)
        }
        .await;
        if let Err(error) = tokio::fs::remove_file(&spool_path).await {
            tracing::warn!(
                path = %spool_path.display(),
                error = %error,
                "Failed to remove spooled upload"
            );
        }
        let text = spooled?;

        let document = Document::loaded(filename, text);
        let text_length = document.text_length();
        let filename = document.filename.clone();
        state.documents.replace(document).await;
        tracing::info!(filename = %filename, text_length, "PDF processed");

        return Ok(Json(UploadResponse {
            success: true,
            message: "PDF uploaded successfully!",
            filename,
            text_length,
        }));
    }

    Err(ApiError::FileValidation(FileValidation::MissingFile))
}

/// Request body for `POST /ask`.
#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: Option<String>,
}

/// Response body for a successful `POST /ask`.
#[derive(Serialize)]
struct AskResponse {
    success: bool,
    question: String,
    answer: String,
    filename: String,
}

/// Answer a question from the full text of the current document.
///
/// An unreadable body is treated as a request without a question.
async fn ask_question(
    State(state): State<Arc<AppState>>,
    request: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = match request {
        Ok(Json(request)) => request.question.unwrap_or_default(),
        Err(rejection) => {
            tracing::info!(error = %rejection.body_text(), "Unreadable question body");
            String::new()
        }
    };
    tracing::info!(question = %question, "Question received");

    let document = state.documents.snapshot().await;
    if !document.has_file {
        return Err(ApiError::InputValidation(InputValidation::NoDocument));
    }
    if question.trim().is_empty() {
        return Err(ApiError::InputValidation(InputValidation::EmptyQuestion));
    }

    let prompt = build_prompt(&document.content, &question);
    let answer = state.model.ask(&prompt).await?;
    tracing::info!(filename = %document.filename, "Model answered");

    Ok(Json(AskResponse {
        success: true,
        question,
        answer,
        filename: document.filename,
    }))
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<DocumentStatus> {
    Json(state.documents.status().await)
}

/// Response body for `POST /clear` and for every failed request.
#[derive(Serialize)]
struct MessageResponse {
    success: bool,
    message: &'static str,
}

async fn clear_document(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    state.documents.clear().await;
    tracing::info!("Cleared current document");
    Json(MessageResponse {
        success: true,
        message: "All data cleared!",
    })
}

/// Upload problems detected before extraction.
#[derive(Debug, Error)]
enum FileValidation {
    #[error("no pdfFile file part in the request")]
    MissingFile,
    #[error("{0}")]
    UnsupportedType(String),
}

/// Request problems detected before any model call.
#[derive(Debug, Error)]
enum InputValidation {
    #[error("no document loaded")]
    NoDocument,
    #[error("question is empty")]
    EmptyQuestion,
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("file validation failed: {0}")]
    FileValidation(FileValidation),
    #[error("input validation failed: {0}")]
    InputValidation(InputValidation),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("upload I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::FileValidation(FileValidation::UnsupportedType(_)) => StatusCode::BAD_REQUEST,
            Self::Multipart(error) => error.status(),
            _ => StatusCode::OK,
        }
    }

    fn user_message(&self) -> &'static str {
        match self {
            Self::FileValidation(FileValidation::MissingFile) => "No file uploaded!",
            Self::FileValidation(FileValidation::UnsupportedType(_)) => "Only PDF files allowed!",
            Self::InputValidation(InputValidation::NoDocument) => "Please upload a PDF first!",
            Self::InputValidation(InputValidation::EmptyQuestion) => "Please ask a question!",
            Self::Extraction(_) | Self::Io(_) | Self::Multipart(_) => "Failed to process PDF",
            Self::Model(_) => "Failed to get answer from AI",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::FileValidation(_) | Self::InputValidation(_) => {
                tracing::info!(error = %self, "Request rejected");
            }
            _ => tracing::error!(error = %self, "Request failed"),
        }
        let body = MessageResponse {
            success: false,
            message: self.user_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
