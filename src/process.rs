//! Whole-document entry points.
//!
//! [`process_document`] runs every stage and returns a [`FinalResult`]:
//!
//! 1. validate the input and open it once to learn the page count
//! 2. parse the index page
//! 3. extract every page through the bounded pool
//! 4. persist the concatenated text
//! 5. summarise it chunk by chunk and render the summary to HTML
//!
//! Only problems with the document as a whole (unreadable file, pdfium
//! missing, provider misconfigured) are errors. Page, OCR and generation
//! failures degrade the content of the result instead.

use crate::config::ProcessingConfig;
use crate::error::DigestError;
use crate::output::{FinalResult, ProcessingStats};
use crate::pipeline::coordinator;
use crate::pipeline::html::render_html;
use crate::pipeline::index::parse_index_sections;
use crate::pipeline::input;
use crate::pipeline::llm::{GenerationClient, OllamaClient, ProviderClient};
use crate::pipeline::ocr::{OcrEngine, TesseractOcr};
use crate::pipeline::page::PageExtractor;
use crate::pipeline::render::{DocumentBackend, PdfiumBackend};
use crate::pipeline::summary::SummaryGenerator;
use crate::progress::{DocumentProgress, ProcessingStage};
use edgequake_llm::ProviderFactory;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Process a PDF into page records, index sections and a summary.
///
/// Progress goes to `config.progress_callback`, under the file name as
/// document id.
///
/// # Example
/// ```rust,no_run
/// use pdf_digest::{process_document, ProcessingConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ProcessingConfig::default();
/// let result = process_document("report.pdf", &config).await?;
/// println!("{} pages, {} sections", result.num_pages, result.indexed_sections.len());
/// println!("{}", result.summary_text);
/// # Ok(())
/// # }
/// ```
pub async fn process_document(
    path: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<FinalResult, DigestError> {
    let path = path.as_ref();
    let progress = DocumentProgress::new(document_id(path), config.progress_callback.clone());
    process_document_tracked(path, config, progress).await
}

/// Like [`process_document`], reporting through a caller-owned handle
/// (for example one from [`crate::ProgressRegistry::track`]).
///
/// The handle ends in [`ProcessingStage::Complete`] or
/// [`ProcessingStage::Failed`].
pub async fn process_document_tracked(
    path: impl AsRef<Path>,
    config: &ProcessingConfig,
    progress: DocumentProgress,
) -> Result<FinalResult, DigestError> {
    let result = run(path.as_ref(), config, &progress).await;
    match &result {
        Ok(r) => {
            progress.advance(ProcessingStage::Complete);
            info!(
                "{}: processing complete: {} pages, {} sections, {:.2}s",
                progress.document_id(),
                r.num_pages,
                r.indexed_sections.len(),
                r.processing_time
            );
        }
        Err(e) => {
            progress.advance(ProcessingStage::Failed);
            warn!("{}: processing failed: {}", progress.document_id(), e);
        }
    }
    result
}

/// Process a PDF and write the JSON result to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn process_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<FinalResult, DigestError> {
    let result = process_document(path, config).await?;
    let out = output_path.as_ref();

    let json = serde_json::to_vec_pretty(&result)
        .map_err(|e| DigestError::Internal(format!("serialise result: {e}")))?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DigestError::OutputWriteFailed {
                path: out.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = out.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json)
        .await
        .map_err(|e| DigestError::OutputWriteFailed {
            path: out.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, out)
        .await
        .map_err(|e| DigestError::OutputWriteFailed {
            path: out.to_path_buf(),
            source: e,
        })?;

    Ok(result)
}

/// Synchronous wrapper around [`process_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync(
    path: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<FinalResult, DigestError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DigestError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_document(path, config))
}

/// Page count of a PDF, without extraction or summarisation.
///
/// Needs neither OCR nor a generation endpoint.
pub async fn inspect(
    path: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<usize, DigestError> {
    let pdf_path = input::validate_pdf_path(path.as_ref())?;
    let backend = resolve_backend(config)?;
    count_pages(backend, pdf_path).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run(
    path: &Path,
    config: &ProcessingConfig,
    progress: &DocumentProgress,
) -> Result<FinalResult, DigestError> {
    let start = Instant::now();
    info!("Processing {}", path.display());

    // ── Step 1: Resolve input and collaborators ──────────────────────────
    let pdf_path = input::validate_pdf_path(path)?;
    let backend = resolve_backend(config)?;
    let ocr = resolve_ocr(config);
    let generator = resolve_generator(config)?;

    let num_pages = count_pages(Arc::clone(&backend), pdf_path.clone()).await?;
    let extractor = Arc::new(PageExtractor::new(pdf_path.clone(), num_pages, backend, ocr));

    // ── Step 2: Index sections ───────────────────────────────────────────
    progress.advance(ProcessingStage::ExtractingIndex);
    let index_page = extractor.extract_text(config.index_page).await;
    let indexed_sections = parse_index_sections(&index_page.text);
    info!(
        "Found {} indexed sections on page {}",
        indexed_sections.len(),
        config.index_page
    );

    // ── Step 3: Pages ────────────────────────────────────────────────────
    progress.advance(ProcessingStage::ExtractingPages);
    let extraction_start = Instant::now();
    let pages =
        coordinator::extract_pages(Arc::clone(&extractor), num_pages, config.concurrency, progress)
            .await;
    let extraction_ms = extraction_start.elapsed().as_millis() as u64;
    info!("Extracted {} pages in {}ms", pages.len(), extraction_ms);

    // ── Step 4: Persist extracted text ───────────────────────────────────
    let text = coordinator::concatenate(&pages);
    let extracted_text_path = match coordinator::write_artifact(&config.artifact_dir, &text).await {
        Ok(p) => Some(p),
        Err(e) => {
            warn!(
                "Could not save extracted text under {}: {}",
                config.artifact_dir.display(),
                e
            );
            None
        }
    };

    // ── Step 5: Summary ──────────────────────────────────────────────────
    progress.advance(ProcessingStage::Summarizing);
    let summary_start = Instant::now();
    let summary = SummaryGenerator::new(
        generator,
        &config.model,
        config.max_output_tokens,
        config.chunk_words,
    )
    .summarize(&text, progress)
    .await;
    let summary_ms = summary_start.elapsed().as_millis() as u64;
    let summary_html = render_html(&summary.text);

    // ── Step 6: Stats ────────────────────────────────────────────────────
    let mut stats = ProcessingStats::from_pages(&pages);
    stats.summary_chunks = summary.chunks.len();
    stats.degraded_chunks = summary.degraded_chunks();
    stats.extraction_ms = extraction_ms;
    stats.summary_ms = summary_ms;
    debug!("{:?}", stats);

    Ok(FinalResult {
        source_path: pdf_path,
        num_pages,
        indexed_sections,
        extracted_pages: pages,
        summary_text: summary.text,
        summary_html,
        processing_time: round_secs(start.elapsed().as_secs_f64()),
        extracted_text_path,
        stats,
    })
}

fn document_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

async fn count_pages(
    backend: Arc<dyn DocumentBackend>,
    path: PathBuf,
) -> Result<usize, DigestError> {
    tokio::task::spawn_blocking(move || backend.page_count(&path))
        .await
        .map_err(|e| DigestError::Internal(format!("Page count task panicked: {}", e)))?
}

fn resolve_backend(config: &ProcessingConfig) -> Result<Arc<dyn DocumentBackend>, DigestError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }
    let backend = PdfiumBackend::bind(
        config.pdfium_library.as_deref(),
        config.password.clone(),
        config.max_rendered_pixels,
    )?;
    Ok(Arc::new(backend))
}

fn resolve_ocr(config: &ProcessingConfig) -> Arc<dyn OcrEngine> {
    match config.ocr {
        Some(ref ocr) => Arc::clone(ocr),
        None => Arc::new(TesseractOcr::new(
            &config.tesseract_binary,
            &config.ocr_language,
        )),
    }
}

/// Resolve the generation client, from most-specific to least-specific:
///
/// 1. **Pre-built client** (`config.generator`), used as-is.
/// 2. **Named provider** (`config.provider_name`): an `edgequake-llm`
///    provider for `config.model`, reading its API key from the environment.
/// 3. **Raw endpoint** (`config.endpoint`): Ollama-style `/api/generate`.
fn resolve_generator(
    config: &ProcessingConfig,
) -> Result<Arc<dyn GenerationClient>, DigestError> {
    if let Some(ref client) = config.generator {
        return Ok(Arc::clone(client));
    }

    if let Some(ref name) = config.provider_name {
        let provider = ProviderFactory::create_llm_provider(name, &config.model).map_err(|e| {
            DigestError::ProviderNotConfigured {
                provider: name.clone(),
                hint: format!("{e}"),
            }
        })?;
        return Ok(Arc::new(ProviderClient::new(provider)));
    }

    let client = OllamaClient::new(&config.endpoint)?;
    debug!("Generating with '{}' at {}", config.model, client.endpoint());
    Ok(Arc::new(client))
}
