//! Input validation: make sure a path names a readable PDF before pdfium sees it.
//!
//! pdfium reports a missing or non-PDF file as an opaque load failure. Checking
//! existence, read permission and the `%PDF` magic bytes up front turns those
//! into specific [`DigestError`] variants.

use crate::error::DigestError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate `path` and return it as an owned [`PathBuf`].
pub fn validate_pdf_path(path: &Path) -> Result<PathBuf, DigestError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(DigestError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            // Files shorter than four bytes cannot be PDFs either.
            if f.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
                return Err(DigestError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DigestError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(DigestError::FileNotFound { path });
        }
    }

    debug!("Validated PDF input: {}", path.display());
    Ok(path)
}
