//! Chart text recovery from a rendered page.
//!
//! The page image is reduced to a binary black-on-white picture (grayscale,
//! then a global Otsu threshold) and read by the OCR engine in
//! [`OcrMode::SparseBlock`] mode. The OCR text is kept two ways on the
//! resulting [`Chart`]: every non-blank line, and the tokens that look like
//! plain numbers.
//!
//! The whole page is treated as one chart region.

use crate::output::Chart;
use crate::pipeline::ocr::{OcrEngine, OcrMode};
use image::{DynamicImage, GrayImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use std::sync::Arc;
use tracing::{debug, warn};

/// Grayscale plus Otsu binarisation.
///
/// CPU-bound; run it on the blocking pool next to rendering.
pub fn preprocess(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    let level = otsu_level(&gray);
    threshold(&gray, level, ThresholdType::Binary)
}

/// `true` when `token` is digits with at most one `.` anywhere in it.
///
/// `"12"`, `"3.5"` and `".5"` qualify; `"1.2.3"`, `"-4"`, `"12%"` and `"."` do not.
pub fn is_numeric_token(token: &str) -> bool {
    let without_point = token.replacen('.', "", 1);
    !without_point.is_empty() && without_point.bytes().all(|b| b.is_ascii_digit())
}

/// Whitespace-separated numeric tokens of `text`, in order.
pub fn numeric_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|t| is_numeric_token(t))
        .map(str::to_string)
        .collect()
}

/// Build a [`Chart`] from OCR output. `None` when the text has no content.
pub fn parse_chart_text(page: usize, text: &str) -> Option<Chart> {
    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(Chart {
        page,
        numeric_tokens: numeric_tokens(text),
        lines,
    })
}

/// Reads chart content off preprocessed page images.
#[derive(Clone)]
pub struct ChartExtractor {
    ocr: Arc<dyn OcrEngine>,
}

impl ChartExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    /// OCR a binarised page image. OCR failures yield no charts.
    pub async fn extract(&self, page: usize, binarised: GrayImage) -> Vec<Chart> {
        let image = DynamicImage::ImageLuma8(binarised);
        match self.ocr.recognize(&image, OcrMode::SparseBlock).await {
            Ok(text) => {
                let charts: Vec<Chart> = parse_chart_text(page, &text).into_iter().collect();
                debug!("Page {}: {} chart region(s)", page, charts.len());
                charts
            }
            Err(e) => {
                warn!("Page {}: chart OCR failed: {}", page, e);
                Vec::new()
            }
        }
    }
}
