//! Prompt template and the "not in the document" sentinel.

/// Fallback phrase the model is told to use when the supplied text lacks the answer.
pub const SENTINEL_PHRASE: &str = "I cannot find that information in the document.";

/// Render the question-answering prompt over `document_text`.
///
/// The text is embedded verbatim; the model is restricted to it and told to reply with
/// [`SENTINEL_PHRASE`] when the answer is absent.
pub fn build_prompt(document_text: &str, question: &str) -> String {
    format!(
        "Here is a document:\n\n{document_text}\n\nQuestion: {question}\n\n\
         Please answer the question based only on the document above. \
         If the answer is not in the document, say \"{SENTINEL_PHRASE}\""
    )
}

/// Whether a model answer signals that the supplied text did not contain the answer.
///
/// The answer is trimmed and compared case-insensitively by containment.
pub fn is_sentinel(answer: &str) -> bool {
    answer
        .trim()
        .to_lowercase()
        .contains(&SENTINEL_PHRASE.to_lowercase())
}
