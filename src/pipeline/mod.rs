//! Pipeline stages for PDF extraction and summarisation.
//!
//! Each submodule implements one step and is testable on its own; the
//! collaborators behind [`render`], [`ocr`] and [`llm`] are traits so tests
//! run without pdfium, tesseract or a model.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ page ──────────▶ coordinator ──▶ summary ──▶ postprocess ──▶ html
//! (%PDF)    (pdfium)   (text/OCR,       (bounded pool,  (chunks,    (clean-up)     (fragments)
//!                       refine, chart)   page order)     single
//!                                                        flight)
//! ```
//!
//! 1. [`input`]  checks the path names a readable PDF
//! 2. [`render`] counts pages, reads the text layer and rasterises pages;
//!    blocking, so callers use `spawn_blocking`
//! 3. [`page`]   builds one record per page: native text or [`ocr`] fallback,
//!    [`refine`]d, plus [`chart`] content
//! 4. [`index`]  parses the table-of-contents page
//! 5. [`coordinator`] fans pages out and writes the extracted-text artifact
//! 6. [`summary`] drives the [`llm`] client over word chunks, one at a time
//! 7. [`postprocess`] strips reasoning spans and boilerplate
//! 8. [`html`]   renders the summary markup

pub mod chart;
pub mod coordinator;
pub mod encode;
pub mod html;
pub mod index;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod page;
pub mod postprocess;
pub mod refine;
pub mod render;
pub mod summary;
