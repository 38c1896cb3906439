//! Prompts sent to the generation endpoint.
//!
//! Kept in one place so unit tests can inspect them without a model.

/// Placeholder in [`CHUNK_SUMMARY_TEMPLATE`] replaced by the chunk text.
pub const CHUNK_PLACEHOLDER: &str = "{chunk}";

/// Instructions for summarising one chunk of document text.
pub const CHUNK_SUMMARY_TEMPLATE: &str = r#"Generate a **detailed summary** of this section of a document.

Rules:
- Maintain all key insights, figures and conclusions; do not omit material.
- Summarise only the content below, nothing else.
- Use ### headings for topics and - bullet points for individual points.
- Make the summary complete and well-structured.

Section Content:
{chunk}

Return only the structured summary."#;

/// Build the prompt for one chunk.
pub fn chunk_summary_prompt(chunk: &str) -> String {
    CHUNK_SUMMARY_TEMPLATE.replacen(CHUNK_PLACEHOLDER, chunk, 1)
}
