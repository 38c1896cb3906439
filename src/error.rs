//! Error types for the pdf-digest library.
//!
//! Failures fall into three groups:
//!
//! * [`DigestError`] (**fatal**): the document cannot be processed at all
//!   (missing file, not a PDF, pdfium unavailable, bad configuration).
//!   Returned as `Err(DigestError)` from the top-level `process*` functions.
//!
//! * [`PageError`] (**non-fatal**): one page could not be loaded or rendered.
//!   Stored on the page's [`crate::output::PageRecord`], which still appears in
//!   the result with empty text, so the rest of the document is unaffected.
//!
//! * [`OcrError`] / [`GenerateError`]: collaborator failures. Callers degrade
//!   them to empty text or a placeholder summary and log a warning; they never
//!   reach the caller of `process_document`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-digest library.
#[derive(Debug, Error)]
pub enum DigestError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, pass --pdfium-lib, or install\n\
libpdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// The page still produces a [`crate::output::PageRecord`] (with empty text)
/// so the document keeps one record per page.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Requested page number is outside `1..=total`.
    #[error("Page {page} is out of range (document has {total} pages)")]
    OutOfRange { page: usize, total: usize },

    /// The document or page could not be opened.
    #[error("Page {page}: load failed: {detail}")]
    LoadFailed { page: usize, detail: String },

    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The extraction task itself died (panic in the blocking pool).
    #[error("Page {page}: extraction task failed: {detail}")]
    TaskFailed { page: usize, detail: String },
}

/// OCR engine failure. Always degraded to empty text by the caller.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The engine binary could not be started.
    #[error("OCR engine '{binary}' could not be started: {source}")]
    Unavailable {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran but exited unsuccessfully.
    #[error("OCR engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The page image could not be handed to the engine.
    #[error("Could not encode image for OCR: {0}")]
    Encode(String),
}

/// Generation endpoint failure. Always degraded to a placeholder chunk summary.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Endpoint could not be reached.
    #[error("Generation endpoint unavailable: {0}")]
    Unavailable(String),

    /// Endpoint returned a non-success status.
    #[error("Generation failed: {0}")]
    Failed(String),

    /// Response body was not the expected JSON shape.
    #[error("Malformed generation response: {0}")]
    InvalidResponse(String),
}
