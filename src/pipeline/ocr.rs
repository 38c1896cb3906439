//! OCR collaborator.
//!
//! [`OcrEngine`] is the seam: the page and chart stages hand it an image and a
//! [`OcrMode`], and get back best-effort text. [`TesseractOcr`] shells out to
//! the `tesseract` binary; tests substitute scripted fakes.
//!
//! Callers treat every [`OcrError`] as "no text" and log it. An engine error
//! never fails a page.

use crate::error::OcrError;
use crate::pipeline::encode::encode_png;
use async_trait::async_trait;
use image::DynamicImage;
use tokio::process::Command;
use tracing::debug;

/// Layout assumption passed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrMode {
    /// Full-page text with automatic layout analysis.
    Page,
    /// A single uniform block of sparse, structured text (chart labels, axes).
    SparseBlock,
}

impl OcrMode {
    /// Tesseract page segmentation mode.
    pub fn psm(self) -> u8 {
        match self {
            OcrMode::Page => 3,
            OcrMode::SparseBlock => 6,
        }
    }
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognise text in `image`.
    async fn recognize(&self, image: &DynamicImage, mode: OcrMode) -> Result<String, OcrError>;
}

/// Runs the `tesseract` command-line engine.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    /// Arguments after the input path: output to stdout, language, engine and layout mode.
    fn args(&self, mode: OcrMode) -> Vec<String> {
        vec![
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
            "--oem".to_string(),
            "3".to_string(),
            "--psm".to_string(),
            mode.psm().to_string(),
        ]
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &DynamicImage, mode: OcrMode) -> Result<String, OcrError> {
        let png = encode_png(image).map_err(|e| OcrError::Encode(e.to_string()))?;

        // Removed when `input` drops, after the engine has exited.
        let input = tempfile::Builder::new()
            .prefix("pdfdigest-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Encode(e.to_string()))?;
        tokio::fs::write(input.path(), &png)
            .await
            .map_err(|e| OcrError::Encode(e.to_string()))?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .args(self.args(mode))
            .output()
            .await
            .map_err(|source| OcrError::Unavailable {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).replace('\x0c', "");
        debug!("tesseract psm {} → {} chars", mode.psm(), text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn psm_per_mode() {
        assert_eq!(OcrMode::Page.psm(), 3);
        assert_eq!(OcrMode::SparseBlock.psm(), 6);
    }

    #[test]
    fn sparse_block_args() {
        let ocr = TesseractOcr::new("tesseract", "deu");
        assert_eq!(
            ocr.args(OcrMode::SparseBlock),
            vec!["stdout", "-l", "deu", "--oem", "3", "--psm", "6"]
        );
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let ocr = TesseractOcr::new("/nonexistent/tesseract-binary", "eng");
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([255])));
        let err = ocr.recognize(&img, OcrMode::Page).await.unwrap_err();
        assert!(matches!(err, OcrError::Unavailable { .. }), "got {err:?}");
    }
}
