//! # pdf-digest
//!
//! Extract the content of a PDF page by page and summarise it with an LLM.
//!
//! Each page yields its text (the embedded text layer, or OCR when the page is
//! a scan), cleaned of layout noise, plus any chart figures OCR can read off
//! the rendered page. A table-of-contents page maps page numbers to section
//! titles. The combined text is summarised in word chunks by a generation
//! endpoint (a local Ollama model by default) and the summary is rendered to
//! HTML fragments.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     check the file exists and starts with %PDF
//!  ├─ 2. Index     parse "1. Title 3" entries off the index page
//!  ├─ 3. Pages     text layer → OCR fallback → refine, + chart OCR
//!  │               (bounded pool, reassembled in page order)
//!  ├─ 4. Artifact  extracted_text/extracted_<timestamp>.txt
//!  ├─ 5. Summary   10 000-word chunks, one request at a time, cleaned
//!  └─ 6. HTML      ### → <h3>, - → <ul><li>, rest → <p>
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_digest::{process_document, ProcessingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Summaries from deepseek-r1:1.5b on http://localhost:11434
//!     let config = ProcessingConfig::default();
//!     let result = process_document("report.pdf", &config).await?;
//!     for (page, title) in &result.indexed_sections {
//!         println!("p.{page}: {title}");
//!     }
//!     println!("{}", result.summary_html);
//!     Ok(())
//! }
//! ```
//!
//! ## External tools
//!
//! | Tool | Used for | Override |
//! |------|----------|----------|
//! | libpdfium | page count, text layer, rendering | `PDFIUM_LIB_PATH`, [`ProcessingConfigBuilder::pdfium_library`] |
//! | tesseract | OCR fallback and chart text | [`ProcessingConfigBuilder::tesseract_binary`] |
//! | Ollama | chunk summaries | [`ProcessingConfigBuilder::endpoint`], or a hosted provider via [`ProcessingConfigBuilder::provider_name`] |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfdigest` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ProcessingConfig, ProcessingConfigBuilder};
pub use error::{DigestError, GenerateError, OcrError, PageError};
pub use output::{Chart, FinalResult, PageRecord, ProcessingStats, TextSource};
pub use pipeline::llm::{GenerateRequest, GenerateResponse, GenerationClient};
pub use pipeline::ocr::{OcrEngine, OcrMode};
pub use pipeline::render::{DocumentBackend, RawPage};
pub use pipeline::summary::{ChunkState, ChunkSummary, NO_SUMMARY_PLACEHOLDER};
pub use process::{inspect, process_document, process_document_tracked, process_sync, process_to_file};
pub use progress::{
    DocumentProgress, NoopProgressCallback, ProcessingProgressCallback, ProcessingStage,
    ProgressCallback, ProgressRegistry, ProgressSnapshot,
};
