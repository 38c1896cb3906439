//! Whole-pipeline tests with in-process collaborators.
//!
//! The document backend, OCR engine and generation client are fakes, so
//! these run anywhere: no pdfium, tesseract or model server needed. The
//! input file only has to pass the `%PDF` header check.
//!
//! Run with:
//!   cargo test --test pipeline

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use pdf_digest::{
    inspect, process_document, process_document_tracked, process_sync, process_to_file,
    DigestError, DocumentBackend, GenerateError, GenerateRequest, GenerateResponse,
    GenerationClient, OcrEngine, OcrError, OcrMode, PageError, ProcessingConfig,
    ProcessingProgressCallback, ProcessingStage, ProgressRegistry, TextSource,
    NO_SUMMARY_PLACEHOLDER,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Pages with fixed text layers. By default early pages are the slowest to
/// load, so with more than one worker they finish last.
struct FakeDocument {
    pages: Vec<String>,
    broken_page: Option<usize>,
    delays_ms: Option<Vec<u64>>,
}

impl FakeDocument {
    fn new<S: Into<String>>(pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
            broken_page: None,
            delays_ms: None,
        }
    }

    /// Per-page load latency, indexed by page - 1.
    fn with_delays(mut self, delays_ms: Vec<u64>) -> Self {
        self.delays_ms = Some(delays_ms);
        self
    }

    fn with_broken_page(mut self, page: usize) -> Self {
        self.broken_page = Some(page);
        self
    }
}

impl DocumentBackend for FakeDocument {
    fn page_count(&self, _path: &Path) -> Result<usize, DigestError> {
        Ok(self.pages.len())
    }

    fn native_text(&self, _path: &Path, page: usize) -> Result<String, PageError> {
        if self.broken_page == Some(page) {
            return Err(PageError::LoadFailed {
                page,
                detail: "damaged page object".into(),
            });
        }
        let delay = match self.delays_ms {
            Some(ref delays) => delays[page - 1],
            None => (self.pages.len() + 1 - page) as u64 * 3,
        };
        std::thread::sleep(Duration::from_millis(delay));
        Ok(self.pages[page - 1].clone())
    }

    fn render_page(&self, _path: &Path, page: usize) -> Result<DynamicImage, PageError> {
        // The width encodes the page number for the OCR fake.
        let img = RgbImage::from_pixel(PAGE_WIDTH_BASE + page as u32, 8, Rgb([255, 255, 255]));
        Ok(DynamicImage::ImageRgb8(img))
    }
}

const PAGE_WIDTH_BASE: u32 = 10;

fn page_of(image: &DynamicImage) -> usize {
    (image.width() - PAGE_WIDTH_BASE) as usize
}

/// Reads "scanned page N" off any page, and a small chart off `chart_page`.
struct FakeOcr {
    chart_page: Option<usize>,
}

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn recognize(&self, image: &DynamicImage, mode: OcrMode) -> Result<String, OcrError> {
        let page = page_of(image);
        match mode {
            OcrMode::Page => Ok(format!("scanned\n\npage {page}\x0c")),
            OcrMode::SparseBlock if self.chart_page == Some(page) => {
                Ok("Sales by quarter\nQ1 10.5\nQ2 12\n".into())
            }
            OcrMode::SparseBlock => Ok(String::new()),
        }
    }
}

/// Answers "- point N" for the Nth request, or nothing for the requests in
/// `silent`. Records prompts and the peak number of requests in flight.
#[derive(Default)]
struct RecordingGenerator {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    silent: Vec<usize>,
}

impl RecordingGenerator {
    fn silent_on(calls: &[usize]) -> Self {
        Self {
            silent: calls.to_vec(),
            ..Default::default()
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for RecordingGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, GenerateError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(request.prompt.clone());

        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let response = if self.silent.contains(&n) {
            None
        } else {
            Some(format!("<think>scratch work</think>- point {n}"))
        };
        Ok(GenerateResponse { response })
    }
}

#[derive(Default)]
struct StageLog {
    stages: Mutex<Vec<ProcessingStage>>,
    pages: AtomicUsize,
}

impl ProcessingProgressCallback for StageLog {
    fn on_stage(&self, _document_id: &str, stage: ProcessingStage) {
        self.stages.lock().unwrap().push(stage);
    }

    fn on_page_complete(&self, _page: usize, _done: usize, _total: usize) {
        self.pages.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

struct Fixture {
    dir: TempDir,
    pdf: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("report.pdf");
        std::fs::write(&pdf, b"%PDF-1.7\n% test fixture\n").unwrap();
        Self { dir, pdf }
    }

    fn artifacts(&self) -> PathBuf {
        self.dir.path().join("extracted_text")
    }

    fn config(
        &self,
        document: FakeDocument,
        generator: Arc<RecordingGenerator>,
    ) -> pdf_digest::ProcessingConfigBuilder {
        ProcessingConfig::builder()
            .backend(Arc::new(document))
            .ocr(Arc::new(FakeOcr { chart_page: None }))
            .generator(generator)
            .artifact_dir(self.artifacts())
    }
}

/// `RUST_LOG=pdf_digest=debug cargo test --test pipeline -- --nocapture`
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn numbered_pages(n: usize) -> Vec<String> {
    (1..=n).map(|p| format!("page {p} body text")).collect()
}

/// `n` latencies in `0..20` ms from a splitmix64 stream seeded with `seed`.
fn seeded_delays(seed: u64, n: usize) -> Vec<u64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            (z ^ (z >> 31)) % 20
        })
        .collect()
}

// ── Extraction ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn page_order_does_not_depend_on_concurrency() {
    let fx = Fixture::new();
    let mut runs = Vec::new();

    for concurrency in [1, 3, 8] {
        let config = fx
            .config(FakeDocument::new(numbered_pages(9)), Arc::default())
            .concurrency(concurrency)
            .build()
            .unwrap();
        let result = process_document(&fx.pdf, &config).await.unwrap();

        let pages: Vec<usize> = result.extracted_pages.iter().map(|p| p.page).collect();
        assert_eq!(pages, (1..=9).collect::<Vec<_>>(), "concurrency {concurrency}");
        runs.push(
            result
                .extracted_pages
                .iter()
                .map(|p| p.text.clone())
                .collect::<Vec<_>>(),
        );
    }

    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0], runs[2]);
    assert_eq!(runs[0][4], "page 5 body text");
}

#[tokio::test]
async fn page_order_survives_random_latencies() {
    let fx = Fixture::new();
    let baseline_config = fx
        .config(FakeDocument::new(numbered_pages(12)), Arc::default())
        .concurrency(1)
        .build()
        .unwrap();
    let baseline = process_document(&fx.pdf, &baseline_config).await.unwrap();
    let expected: Vec<String> = baseline
        .extracted_pages
        .iter()
        .map(|p| p.text.clone())
        .collect();

    for seed in [1, 7, 42, 2024] {
        let document = FakeDocument::new(numbered_pages(12)).with_delays(seeded_delays(seed, 12));
        let config = fx
            .config(document, Arc::default())
            .concurrency(5)
            .build()
            .unwrap();
        let result = process_document(&fx.pdf, &config).await.unwrap();

        let texts: Vec<String> = result
            .extracted_pages
            .iter()
            .map(|p| p.text.clone())
            .collect();
        assert_eq!(texts, expected, "seed {seed}");
        let artifact = std::fs::read_to_string(result.extracted_text_path.unwrap()).unwrap();
        assert_eq!(artifact, expected.join("\n"), "seed {seed}");
    }
}

#[tokio::test]
async fn broken_page_is_isolated() {
    let fx = Fixture::new();
    let config = fx
        .config(
            FakeDocument::new(numbered_pages(4)).with_broken_page(2),
            Arc::default(),
        )
        .build()
        .unwrap();

    let result = process_document(&fx.pdf, &config).await.unwrap();

    assert_eq!(result.num_pages, 4);
    assert_eq!(result.extracted_pages.len(), 4);
    let broken = &result.extracted_pages[1];
    assert_eq!(broken.page, 2);
    assert!(broken.text.is_empty());
    assert!(matches!(broken.error, Some(PageError::LoadFailed { page: 2, .. })));
    assert_eq!(result.extracted_pages[2].text, "page 3 body text");
    assert_eq!(result.stats.failed_pages, 1);
    assert_eq!(result.stats.native_pages, 3);
}

#[tokio::test]
async fn scanned_pages_fall_back_to_ocr() {
    let fx = Fixture::new();
    let config = fx
        .config(
            FakeDocument::new(["typed page", "   ", "another typed page"]),
            Arc::default(),
        )
        .build()
        .unwrap();

    let result = process_document(&fx.pdf, &config).await.unwrap();
    let scanned = &result.extracted_pages[1];

    assert_eq!(scanned.source, TextSource::Ocr);
    assert_eq!(scanned.text, "scanned page 2");
    assert_eq!(result.extracted_pages[0].source, TextSource::Native);
    assert_eq!(result.stats.ocr_pages, 1);
}

#[tokio::test]
async fn chart_text_is_attached_to_its_page() {
    let fx = Fixture::new();
    let config = fx
        .config(FakeDocument::new(numbered_pages(3)), Arc::default())
        .ocr(Arc::new(FakeOcr { chart_page: Some(3) }))
        .build()
        .unwrap();

    let result = process_document(&fx.pdf, &config).await.unwrap();

    assert!(result.extracted_pages[0].charts.is_empty());
    assert!(result.extracted_pages[1].charts.is_empty());
    let charts = &result.extracted_pages[2].charts;
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].page, 3);
    assert_eq!(charts[0].lines, vec!["Sales by quarter", "Q1 10.5", "Q2 12"]);
    assert_eq!(charts[0].numeric_tokens, vec!["10.5", "12"]);
    assert_eq!(result.stats.charts_found, 1);
}

#[tokio::test]
async fn extracted_text_artifact_is_written() {
    let fx = Fixture::new();
    let config = fx
        .config(FakeDocument::new(["first page", "second page"]), Arc::default())
        .build()
        .unwrap();

    let result = process_document(&fx.pdf, &config).await.unwrap();

    let path = result.extracted_text_path.expect("artifact path");
    assert!(path.starts_with(fx.artifacts()));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("extracted_") && name.ends_with(".txt"), "{name}");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "first page\nsecond page");
}

#[tokio::test]
async fn unwritable_artifact_dir_does_not_stop_the_summary() {
    let fx = Fixture::new();
    // A directory cannot be created beneath a regular file.
    let blocked = fx.pdf.join("extracted_text");
    let config = fx
        .config(FakeDocument::new(numbered_pages(2)), Arc::default())
        .artifact_dir(&blocked)
        .build()
        .unwrap();

    let result = process_document(&fx.pdf, &config).await.unwrap();

    assert!(result.extracted_text_path.is_none());
    assert!(!blocked.exists());
    assert_eq!(result.summary_text, "- point 1");
    assert_eq!(result.summary_html, "<ul><li>point 1</li></ul>");
    assert_eq!(result.extracted_pages.len(), 2);
}

// ── Index page ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn sections_come_from_the_index_page() {
    let fx = Fixture::new();
    let pages = [
        "Title page",
        "Foreword",
        "Contents\n1. Introduction   4\n2. Methods 7",
        "Introduction body",
    ];
    let config = fx
        .config(FakeDocument::new(pages), Arc::default())
        .build()
        .unwrap();

    let result = process_document(&fx.pdf, &config).await.unwrap();

    assert_eq!(result.indexed_sections.len(), 2);
    assert_eq!(result.indexed_sections[&4], "Introduction");
    assert_eq!(result.indexed_sections[&7], "Methods");
}

#[tokio::test]
async fn sections_keep_long_page_numbers_and_punctuation() {
    let fx = Fixture::new();
    let pages = [
        "Title page",
        "Foreword",
        "Contents\n4. Results 99\n5. Appendix 120\n6. Glossary 130\n7. Risks & Costs 12",
        "Results body",
    ];
    let config = fx
        .config(FakeDocument::new(pages), Arc::default())
        .build()
        .unwrap();

    let result = process_document(&fx.pdf, &config).await.unwrap();

    let want = BTreeMap::from([
        (12, "Risks & Costs".to_string()),
        (99, "Results".to_string()),
        (120, "Appendix".to_string()),
        (130, "Glossary".to_string()),
    ]);
    assert_eq!(result.indexed_sections, want);
    // The page record itself is still refined.
    assert_eq!(
        result.extracted_pages[2].text,
        "Contents 4. Results 99 5. Appendix 6. Glossary 7. Risks Costs 12"
    );
}

#[tokio::test]
async fn index_page_beyond_document_gives_no_sections() {
    let fx = Fixture::new();
    let config = fx
        .config(FakeDocument::new(["1. Only 1"]), Arc::default())
        .index_page(5)
        .build()
        .unwrap();

    let result = process_document(&fx.pdf, &config).await.unwrap();

    assert!(result.indexed_sections.is_empty());
    assert_eq!(result.extracted_pages.len(), 1);
}

// ── Summary ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chunks_are_summarised_one_at_a_time_in_order() {
    let fx = Fixture::new();
    let generator = Arc::new(RecordingGenerator::default());
    let config = fx
        .config(
            FakeDocument::new(["a1 a2 a3 a4", "b1 b2 b3 b4", "c1 c2 c3 c4"]),
            Arc::clone(&generator),
        )
        .chunk_words(5)
        .concurrency(4)
        .build()
        .unwrap();

    let result = process_document(&fx.pdf, &config).await.unwrap();

    assert_eq!(generator.peak_in_flight.load(Ordering::SeqCst), 1);
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("a1 a2 a3 a4 b1"));
    assert!(prompts[1].contains("b2 b3 b4 c1 c2"));
    assert!(prompts[2].contains("c3 c4"));

    assert_eq!(result.summary_text, "- point 1\n\n- point 2\n\n- point 3");
    assert_eq!(
        result.summary_html,
        "<ul><li>point 1</li></ul><ul><li>point 2</li></ul><ul><li>point 3</li></ul>"
    );
    assert_eq!(result.stats.summary_chunks, 3);
    assert_eq!(result.stats.degraded_chunks, 0);
}

#[tokio::test]
async fn missing_chunk_summary_becomes_placeholder() {
    let fx = Fixture::new();
    let generator = Arc::new(RecordingGenerator::silent_on(&[2]));
    let config = fx
        .config(FakeDocument::new(["one two", "three four", "five six"]), generator)
        .chunk_words(2)
        .build()
        .unwrap();

    let result = process_document(&fx.pdf, &config).await.unwrap();

    assert_eq!(
        result.summary_text,
        format!("- point 1\n\n{NO_SUMMARY_PLACEHOLDER}\n\n- point 3")
    );
    assert!(result
        .summary_html
        .contains(&format!("<p>{NO_SUMMARY_PLACEHOLDER}</p>")));
    assert_eq!(result.stats.degraded_chunks, 1);
}

#[tokio::test]
async fn blank_document_makes_no_requests() {
    let fx = Fixture::new();
    let generator = Arc::new(RecordingGenerator::default());
    let config = fx
        .config(FakeDocument::new(["", "  "]), Arc::clone(&generator))
        .ocr(Arc::new(BlindOcr))
        .build()
        .unwrap();

    let result = process_document(&fx.pdf, &config).await.unwrap();

    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    assert!(result.summary_text.is_empty());
    assert!(result.summary_html.is_empty());
    assert!(result
        .extracted_pages
        .iter()
        .all(|p| p.source == TextSource::None && p.error.is_none()));
}

struct BlindOcr;

#[async_trait]
impl OcrEngine for BlindOcr {
    async fn recognize(&self, _image: &DynamicImage, _mode: OcrMode) -> Result<String, OcrError> {
        Ok(String::new())
    }
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tracked_document_reaches_complete() {
    let fx = Fixture::new();
    let log = Arc::new(StageLog::default());
    let config = fx
        .config(FakeDocument::new(numbered_pages(5)), Arc::default())
        .chunk_words(4)
        .build()
        .unwrap();

    let registry = ProgressRegistry::new();
    let handle = registry.track("report-42", Some(log.clone()));
    process_document_tracked(&fx.pdf, &config, handle).await.unwrap();

    let snap = registry.snapshot("report-42").unwrap();
    assert_eq!(snap.stage, ProcessingStage::Complete);
    assert_eq!(snap.pages_done, 5);
    assert_eq!(snap.pages_total, 5);
    assert_eq!(snap.page_percent(), 100);
    assert_eq!(snap.chunks_total, 5);
    assert_eq!(snap.chunks_done, 5);

    assert_eq!(
        *log.stages.lock().unwrap(),
        vec![
            ProcessingStage::ExtractingIndex,
            ProcessingStage::ExtractingPages,
            ProcessingStage::Summarizing,
            ProcessingStage::Complete,
        ]
    );
    assert_eq!(log.pages.load(Ordering::SeqCst), 5);
    assert!(registry.forget("report-42"));
    assert!(registry.snapshot("report-42").is_none());
}

#[tokio::test]
async fn rejected_input_ends_in_failed() {
    let fx = Fixture::new();
    let not_pdf = fx.dir.path().join("notes.pdf");
    std::fs::write(&not_pdf, b"plain text, not a pdf").unwrap();
    let config = fx
        .config(FakeDocument::new(numbered_pages(1)), Arc::default())
        .build()
        .unwrap();

    let registry = ProgressRegistry::new();
    let handle = registry.track("notes", None);
    let err = process_document_tracked(&not_pdf, &config, handle)
        .await
        .unwrap_err();

    assert!(matches!(err, DigestError::NotAPdf { .. }));
    assert_eq!(
        registry.snapshot("notes").unwrap().stage,
        ProcessingStage::Failed
    );
}

// ── Entry points ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn result_is_written_as_json() {
    let fx = Fixture::new();
    let config = fx
        .config(FakeDocument::new(numbered_pages(2)), Arc::default())
        .build()
        .unwrap();
    let out = fx.dir.path().join("out/result.json");

    let result = process_to_file(&fx.pdf, &out, &config).await.unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["num_pages"], 2);
    assert_eq!(json["summary_text"], result.summary_text.as_str());
    assert_eq!(json["extracted_pages"][1]["text"], "page 2 body text");
    assert!(!out.with_extension("json.tmp").exists());
}

#[test]
fn sync_wrapper_runs_the_pipeline() {
    let fx = Fixture::new();
    let config = fx
        .config(FakeDocument::new(numbered_pages(2)), Arc::default())
        .build()
        .unwrap();

    let result = process_sync(&fx.pdf, &config).unwrap();
    assert_eq!(result.num_pages, 2);
    assert_eq!(result.summary_text, "- point 1");
}

#[test]
fn inspect_counts_pages_only() {
    let fx = Fixture::new();
    let generator = Arc::new(RecordingGenerator::default());
    let config = fx
        .config(FakeDocument::new(numbered_pages(6)), Arc::clone(&generator))
        .build()
        .unwrap();

    let pages = tokio_test::block_on(inspect(&fx.pdf, &config)).unwrap();

    assert_eq!(pages, 6);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    assert!(!fx.artifacts().exists());
}
