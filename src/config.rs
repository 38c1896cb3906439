//! Configuration for a processing run.
//!
//! Every knob lives on [`ProcessingConfig`], built through
//! [`ProcessingConfigBuilder`]. The builder clamps numeric fields to their
//! legal range as they are set and [`ProcessingConfigBuilder::build`] rejects
//! combinations that cannot work.
//!
//! Collaborators (document backend, OCR engine, generation client) can be
//! injected as trait objects. When they are absent the pipeline builds the
//! defaults: pdfium, the `tesseract` binary, and the Ollama HTTP endpoint (or
//! an `edgequake-llm` provider when `provider_name` is set).

use crate::error::DigestError;
use crate::pipeline::llm::GenerationClient;
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::render::DocumentBackend;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default local generation endpoint (Ollama).
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";
/// Default model served by the local endpoint.
pub const DEFAULT_MODEL: &str = "deepseek-r1:1.5b";

/// Configuration for processing one document.
///
/// # Example
/// ```rust
/// use pdf_digest::ProcessingConfig;
///
/// let config = ProcessingConfig::builder()
///     .index_page(2)
///     .concurrency(4)
///     .chunk_words(5_000)
///     .build()
///     .unwrap();
/// assert_eq!(config.index_page, 2);
/// ```
#[derive(Clone)]
pub struct ProcessingConfig {
    /// 1-based page holding the table of contents. Default: 3.
    pub index_page: usize,

    /// Page-extraction worker pool size. Default: 8.
    ///
    /// Independent of page count; a 500-page document still has at most this
    /// many pages in flight.
    pub concurrency: usize,

    /// Words per summary chunk. Default: 10 000.
    pub chunk_words: usize,

    /// Model identifier sent to the generation endpoint. Default: `deepseek-r1:1.5b`.
    pub model: String,

    /// Generation endpoint URL. Default: `http://localhost:11434/api/generate`.
    pub endpoint: String,

    /// Upper bound on tokens generated per chunk. Default: 8192.
    pub max_output_tokens: usize,

    /// Hosted provider name (e.g. "openai", "anthropic"). When set, summary
    /// generation goes through `edgequake-llm` instead of `endpoint`.
    pub provider_name: Option<String>,

    /// Pre-constructed generation client. Takes precedence over everything else.
    pub generator: Option<Arc<dyn GenerationClient>>,

    /// Pre-constructed document backend. Default: pdfium.
    pub backend: Option<Arc<dyn DocumentBackend>>,

    /// Pre-constructed OCR engine. Default: tesseract.
    pub ocr: Option<Arc<dyn OcrEngine>>,

    /// Tesseract language pack. Default: `eng`.
    pub ocr_language: String,

    /// Tesseract executable. Default: `tesseract` on `PATH`.
    pub tesseract_binary: String,

    /// Longest edge of a rendered page in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to the pdfium shared library.
    pub pdfium_library: Option<PathBuf>,

    /// Directory receiving the extracted-text artifact. Default: `extracted_text`.
    pub artifact_dir: PathBuf,

    /// Receives stage, page and chunk notifications.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            index_page: 3,
            concurrency: 8,
            chunk_words: 10_000,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_output_tokens: 8192,
            provider_name: None,
            generator: None,
            backend: None,
            ocr: None,
            ocr_language: "eng".to_string(),
            tesseract_binary: "tesseract".to_string(),
            max_rendered_pixels: 2000,
            password: None,
            pdfium_library: None,
            artifact_dir: PathBuf::from("extracted_text"),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ProcessingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingConfig")
            .field("index_page", &self.index_page)
            .field("concurrency", &self.concurrency)
            .field("chunk_words", &self.chunk_words)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("provider_name", &self.provider_name)
            .field("generator", &self.generator.as_ref().map(|_| "<dyn GenerationClient>"))
            .field("backend", &self.backend.as_ref().map(|_| "<dyn DocumentBackend>"))
            .field("ocr", &self.ocr.as_ref().map(|_| "<dyn OcrEngine>"))
            .field("ocr_language", &self.ocr_language)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("artifact_dir", &self.artifact_dir)
            .finish()
    }
}

impl ProcessingConfig {
    /// Create a new builder starting from the defaults.
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ProcessingConfig`].
#[derive(Debug)]
pub struct ProcessingConfigBuilder {
    config: ProcessingConfig,
}

impl ProcessingConfigBuilder {
    pub fn index_page(mut self, page: usize) -> Self {
        self.config.index_page = page;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn chunk_words(mut self, n: usize) -> Self {
        self.config.chunk_words = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn generator(mut self, client: Arc<dyn GenerationClient>) -> Self {
        self.config.generator = Some(client);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn DocumentBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn ocr(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr = Some(engine);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_binary(mut self, binary: impl Into<String>) -> Self {
        self.config.tesseract_binary = binary.into();
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.artifact_dir = dir.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessingConfig, DigestError> {
        let c = &self.config;
        if c.index_page == 0 {
            return Err(DigestError::InvalidConfig(
                "Index page is 1-based and must be >= 1".into(),
            ));
        }
        if c.max_output_tokens == 0 {
            return Err(DigestError::InvalidConfig(
                "max_output_tokens must be >= 1".into(),
            ));
        }
        if c.generator.is_none() && c.provider_name.is_none() {
            if c.model.trim().is_empty() {
                return Err(DigestError::InvalidConfig("Model must not be empty".into()));
            }
            if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
                return Err(DigestError::InvalidConfig(format!(
                    "Endpoint must be an http(s) URL, got '{}'",
                    c.endpoint
                )));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ProcessingConfig::default();
        assert_eq!(c.index_page, 3);
        assert_eq!(c.concurrency, 8);
        assert_eq!(c.chunk_words, 10_000);
        assert_eq!(c.model, "deepseek-r1:1.5b");
        assert_eq!(c.endpoint, "http://localhost:11434/api/generate");
        assert_eq!(c.max_output_tokens, 8192);
        assert_eq!(c.artifact_dir, PathBuf::from("extracted_text"));
    }

    #[test]
    fn builder_clamps() {
        let c = ProcessingConfig::builder()
            .concurrency(0)
            .chunk_words(0)
            .max_rendered_pixels(10)
            .build()
            .unwrap();
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.chunk_words, 1);
        assert_eq!(c.max_rendered_pixels, 100);
    }

    #[test]
    fn rejects_zero_index_page() {
        let err = ProcessingConfig::builder().index_page(0).build().unwrap_err();
        assert!(matches!(err, DigestError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let err = ProcessingConfig::builder()
            .endpoint("localhost:11434")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn provider_name_skips_endpoint_check() {
        let c = ProcessingConfig::builder()
            .endpoint("unused")
            .provider_name("openai")
            .build()
            .unwrap();
        assert_eq!(c.provider_name.as_deref(), Some("openai"));
    }

    #[test]
    fn debug_redacts_password() {
        let c = ProcessingConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
