//! Result types produced by the extraction and summary pipeline.
//!
//! Everything here is plain data: created once by the pipeline, never mutated
//! afterwards, and serialisable so the CLI's `--json` mode and any transport
//! layer can hand it on unchanged.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Where a page's base text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// The PDF's embedded text layer.
    Native,
    /// OCR over the rendered page (text layer was empty).
    Ocr,
    /// Nothing was extracted (out of range, load failure, empty OCR).
    #[default]
    None,
}

/// Numeric and textual content recovered from one chart-bearing region.
///
/// The two views are independent readings of the same OCR pass: `lines`
/// keeps every non-blank line, `numeric_tokens` keeps only the
/// whitespace-separated tokens that parse as plain numbers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Chart {
    /// 1-based page the region was rendered from.
    pub page: usize,
    /// Non-blank OCR lines, trimmed, in reading order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
    /// Numeric-looking tokens, in reading order.
    #[serde(default)]
    pub numeric_tokens: Vec<String>,
}

/// Extraction result for a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-based page number.
    pub page: usize,
    /// Refined page text (possibly empty).
    pub text: String,
    /// Chart data found on the rendered page.
    pub charts: Vec<Chart>,
    /// Where `text` came from.
    #[serde(default)]
    pub source: TextSource,
    /// Set when the page could not be processed; `text` is empty in that case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
}

impl PageRecord {
    /// An empty record for a page that produced nothing.
    pub fn empty(page: usize) -> Self {
        Self {
            page,
            text: String::new(),
            charts: Vec::new(),
            source: TextSource::None,
            error: None,
        }
    }

    /// An empty record carrying the reason the page failed.
    pub fn failed(page: usize, error: PageError) -> Self {
        Self {
            error: Some(error),
            ..Self::empty(page)
        }
    }
}

/// Aggregate counters for one processing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Pages whose text came from the embedded text layer.
    pub native_pages: usize,
    /// Pages whose text came from OCR.
    pub ocr_pages: usize,
    /// Pages that carry a [`PageError`].
    pub failed_pages: usize,
    /// Charts attached across all pages.
    pub charts_found: usize,
    /// Chunks sent to the generation endpoint.
    pub summary_chunks: usize,
    /// Chunks whose summary fell back to the placeholder.
    pub degraded_chunks: usize,
    /// Wall-clock time spent in page extraction.
    pub extraction_ms: u64,
    /// Wall-clock time spent in summary generation.
    pub summary_ms: u64,
}

impl ProcessingStats {
    /// Tally the page-level counters from ordered page records.
    pub fn from_pages(pages: &[PageRecord]) -> Self {
        let mut stats = Self::default();
        for page in pages {
            match page.source {
                TextSource::Native => stats.native_pages += 1,
                TextSource::Ocr => stats.ocr_pages += 1,
                TextSource::None => {}
            }
            if page.error.is_some() {
                stats.failed_pages += 1;
            }
            stats.charts_found += page.charts.len();
        }
        stats
    }
}

/// The structured result of processing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResult {
    /// Path the document was read from.
    pub source_path: PathBuf,
    /// Page count discovered when the document was opened.
    pub num_pages: usize,
    /// Page number → section title, parsed from the index page.
    /// Empty means "no index available".
    pub indexed_sections: BTreeMap<usize, String>,
    /// One record per page, in ascending page order.
    pub extracted_pages: Vec<PageRecord>,
    /// Cleaned, concatenated chunk summaries.
    pub summary_text: String,
    /// `summary_text` rendered to HTML fragments.
    pub summary_html: String,
    /// Wall-clock processing time in seconds (two decimals).
    pub processing_time: f64,
    /// Where the concatenated extracted text was persisted, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text_path: Option<PathBuf>,
    /// Per-run counters.
    #[serde(default)]
    pub stats: ProcessingStats,
}
