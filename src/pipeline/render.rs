//! Document access: page count, native text layer and page rasterisation.
//!
//! The pipeline only talks to a [`DocumentBackend`]. The production backend is
//! [`PdfiumBackend`]; tests plug in in-memory fakes.
//!
//! All backend methods are blocking. pdfium is CPU-bound and not async-safe,
//! so callers run them inside `tokio::task::spawn_blocking`.
//!
//! Every call opens its own handle on the document path. Page workers share
//! nothing but the backend itself.

use crate::error::{DigestError, PageError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What one page yields before OCR and refinement.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Embedded text layer, untouched (possibly empty).
    pub native_text: String,
    /// The rendered page.
    pub image: DynamicImage,
}

/// Read-only access to a paged document.
///
/// Page numbers are 1-based. Implementations must be safe to call from
/// several blocking threads at once.
pub trait DocumentBackend: Send + Sync {
    /// Open the document and count its pages.
    fn page_count(&self, path: &Path) -> Result<usize, DigestError>;

    /// Raw text-layer content of `page`.
    fn native_text(&self, path: &Path, page: usize) -> Result<String, PageError>;

    /// Rasterise `page`.
    fn render_page(&self, path: &Path, page: usize) -> Result<DynamicImage, PageError>;

    /// Text layer and rendered image of `page` together.
    ///
    /// Backends that can serve both from one open handle should override this.
    fn load_page(&self, path: &Path, page: usize) -> Result<RawPage, PageError> {
        Ok(RawPage {
            native_text: self.native_text(path, page)?,
            image: self.render_page(path, page)?,
        })
    }
}

/// [`DocumentBackend`] backed by the pdfium C library.
///
/// Holds only the library location; every call binds pdfium on the
/// blocking thread it runs on.
pub struct PdfiumBackend {
    library: Option<PathBuf>,
    password: Option<String>,
    max_pixels: u32,
}

impl PdfiumBackend {
    /// Bind to pdfium once to check that it loads.
    ///
    /// Lookup order: `library` if given, then `PDFIUM_LIB_PATH`, then a
    /// library next to the working directory, then the system library.
    pub fn bind(
        library: Option<&Path>,
        password: Option<String>,
        max_pixels: u32,
    ) -> Result<Self, DigestError> {
        let library = library
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let backend = Self {
            library,
            password,
            max_pixels,
        };
        backend.pdfium().map_err(DigestError::PdfiumBindingFailed)?;
        Ok(backend)
    }

    fn pdfium(&self) -> Result<Pdfium, String> {
        let bindings = match self.library {
            Some(ref path) => Pdfium::bind_to_library(path)
                .map_err(|e| format!("{}: {:?}", path.display(), e))?,
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| format!("{:?}", e))?,
        };
        Ok(Pdfium::new(bindings))
    }

    fn pdfium_for_page(&self, page: usize) -> Result<Pdfium, PageError> {
        self.pdfium()
            .map_err(|detail| PageError::LoadFailed { page, detail })
    }

    /// 0-based pdfium index of 1-based `page`, range-checked.
    fn page_index(total: usize, page: usize) -> Result<u16, PageError> {
        if page == 0 || page > total {
            return Err(PageError::OutOfRange { page, total });
        }
        Ok((page - 1) as u16)
    }

    fn render(&self, pdf_page: &PdfPage<'_>, page: usize) -> Result<DynamicImage, PageError> {
        let render_config = PdfRenderConfig::new()
            .set_target_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32);

        let bitmap = pdf_page
            .render_with_config(&render_config)
            .map_err(|e| PageError::RenderFailed {
                page,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page,
            image.width(),
            image.height()
        );
        Ok(image)
    }

    /// Open the document, look up `page` and hand it to `f`.
    fn with_page<T>(
        &self,
        path: &Path,
        page: usize,
        f: impl FnOnce(&PdfPage<'_>) -> Result<T, PageError>,
    ) -> Result<T, PageError> {
        let pdfium = self.pdfium_for_page(page)?;
        let document = pdfium
            .load_pdf_from_file(path, self.password.as_deref())
            .map_err(|e| Self::load_failed(page, e))?;
        let index = Self::page_index(document.pages().len() as usize, page)?;
        let pdf_page = document
            .pages()
            .get(index)
            .map_err(|e| Self::load_failed(page, e))?;
        f(&pdf_page)
    }

    fn load_failed(page: usize, e: PdfiumError) -> PageError {
        PageError::LoadFailed {
            page,
            detail: format!("{:?}", e),
        }
    }
}

impl DocumentBackend for PdfiumBackend {
    fn page_count(&self, path: &Path) -> Result<usize, DigestError> {
        let pdfium = self.pdfium().map_err(DigestError::PdfiumBindingFailed)?;
        let document = pdfium
            .load_pdf_from_file(path, self.password.as_deref())
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    if self.password.is_some() {
                        DigestError::WrongPassword {
                            path: path.to_path_buf(),
                        }
                    } else {
                        DigestError::PasswordRequired {
                            path: path.to_path_buf(),
                        }
                    }
                } else {
                    DigestError::CorruptPdf {
                        path: path.to_path_buf(),
                        detail: err_str,
                    }
                }
            })?;

        let total = document.pages().len() as usize;
        info!("PDF loaded: {} pages", total);
        Ok(total)
    }

    fn native_text(&self, path: &Path, page: usize) -> Result<String, PageError> {
        self.with_page(path, page, |pdf_page| {
            pdf_page
                .text()
                .map(|text| text.all())
                .map_err(|e| Self::load_failed(page, e))
        })
    }

    fn render_page(&self, path: &Path, page: usize) -> Result<DynamicImage, PageError> {
        self.with_page(path, page, |pdf_page| self.render(pdf_page, page))
    }

    fn load_page(&self, path: &Path, page: usize) -> Result<RawPage, PageError> {
        self.with_page(path, page, |pdf_page| {
            let native_text = pdf_page
                .text()
                .map_err(|e| Self::load_failed(page, e))?
                .all();
            let image = self.render(pdf_page, page)?;
            Ok(RawPage { native_text, image })
        })
    }
}
