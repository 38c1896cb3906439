//! Per-page extraction: native text, OCR fallback, refinement, charts.
//!
//! Blocking work (opening the document, rendering, binarising) runs in one
//! `spawn_blocking` call per page. OCR is async and runs afterwards on the
//! rendered images.

use crate::error::PageError;
use crate::output::{PageRecord, TextSource};
use crate::pipeline::chart::{self, ChartExtractor};
use crate::pipeline::ocr::{OcrEngine, OcrMode};
use crate::pipeline::refine::{collapse_whitespace, refine_text};
use crate::pipeline::render::DocumentBackend;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Produces one [`PageRecord`] per requested page of a single document.
#[derive(Clone)]
pub struct PageExtractor {
    path: PathBuf,
    page_count: usize,
    backend: Arc<dyn DocumentBackend>,
    ocr: Arc<dyn OcrEngine>,
    charts: ChartExtractor,
}

impl PageExtractor {
    pub fn new(
        path: impl Into<PathBuf>,
        page_count: usize,
        backend: Arc<dyn DocumentBackend>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            path: path.into(),
            page_count,
            backend,
            charts: ChartExtractor::new(Arc::clone(&ocr)),
            ocr,
        }
    }

    /// Full extraction of `page`: text (native or OCR), refined, plus charts.
    ///
    /// Never fails. Out-of-range pages and backend failures produce an
    /// empty-text record carrying the [`PageError`].
    pub async fn extract(&self, page: usize) -> PageRecord {
        if let Err(e) = self.check_range(page) {
            return PageRecord::failed(page, e);
        }

        let backend = Arc::clone(&self.backend);
        let path = self.path.clone();
        let loaded = tokio::task::spawn_blocking(move || {
            backend.load_page(&path, page).map(|raw| {
                let binarised = chart::preprocess(&raw.image);
                (raw, binarised)
            })
        })
        .await;

        let (raw, binarised) = match loaded {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                warn!("{}", e);
                return PageRecord::failed(page, e);
            }
            Err(join) => {
                let e = PageError::TaskFailed {
                    page,
                    detail: join.to_string(),
                };
                warn!("{}", e);
                return PageRecord::failed(page, e);
            }
        };

        let (base, source) = if !raw.native_text.trim().is_empty() {
            (raw.native_text, TextSource::Native)
        } else {
            self.ocr_page(page, &raw.image).await
        };

        let charts = self.charts.extract(page, binarised).await;
        let text = refine_text(&base);
        debug!(
            "Page {}: {} chars ({:?}), {} chart(s)",
            page,
            text.len(),
            source,
            charts.len()
        );

        PageRecord {
            page,
            text,
            charts,
            source,
            error: None,
        }
    }

    /// Text of `page` only, without chart extraction. Used for the index page.
    ///
    /// Renders only when the text layer is empty. The text is
    /// whitespace-collapsed but not refined, so three-digit page numbers and
    /// title punctuation survive for the section parser.
    pub async fn extract_text(&self, page: usize) -> PageRecord {
        if let Err(e) = self.check_range(page) {
            return PageRecord::failed(page, e);
        }

        let backend = Arc::clone(&self.backend);
        let path = self.path.clone();
        let native = tokio::task::spawn_blocking(move || backend.native_text(&path, page))
            .await
            .map_err(|join| PageError::TaskFailed {
                page,
                detail: join.to_string(),
            })
            .and_then(|r| r);

        let native = match native {
            Ok(text) => text,
            Err(e) => {
                warn!("{}", e);
                return PageRecord::failed(page, e);
            }
        };

        if !native.trim().is_empty() {
            return PageRecord {
                text: collapse_whitespace(&native),
                source: TextSource::Native,
                ..PageRecord::empty(page)
            };
        }

        let backend = Arc::clone(&self.backend);
        let path = self.path.clone();
        let image = tokio::task::spawn_blocking(move || backend.render_page(&path, page))
            .await
            .map_err(|join| PageError::TaskFailed {
                page,
                detail: join.to_string(),
            })
            .and_then(|r| r);

        match image {
            Ok(image) => {
                let (text, source) = self.ocr_page(page, &image).await;
                PageRecord {
                    text: collapse_whitespace(&text),
                    source,
                    ..PageRecord::empty(page)
                }
            }
            Err(e) => {
                warn!("{}", e);
                PageRecord::failed(page, e)
            }
        }
    }

    fn check_range(&self, page: usize) -> Result<(), PageError> {
        if page == 0 || page > self.page_count {
            let e = PageError::OutOfRange {
                page,
                total: self.page_count,
            };
            warn!("{}", e);
            return Err(e);
        }
        Ok(())
    }

    async fn ocr_page(&self, page: usize, image: &DynamicImage) -> (String, TextSource) {
        match self.ocr.recognize(image, OcrMode::Page).await {
            Ok(text) if !text.trim().is_empty() => (text, TextSource::Ocr),
            Ok(_) => {
                debug!("Page {}: OCR found no text", page);
                (String::new(), TextSource::None)
            }
            Err(e) => {
                warn!("Page {}: OCR failed: {}", page, e);
                (String::new(), TextSource::None)
            }
        }
    }
}
