#![deny(missing_docs)]

//! Core library for the PDF question service and its batch CLI.

/// HTTP routing and request handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Single-slot store for the loaded document.
pub mod document;
/// PDF text extraction and upload screening.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Hosted language-model client.
pub mod model;
/// Prompting, chunking, and the chunk-by-chunk question scan.
pub mod processing;
