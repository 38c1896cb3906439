//! Image encoding for the OCR engine.
//!
//! Rendered pages and binarised chart images are written to a temporary PNG
//! file whose path is passed to tesseract. PNG is lossless; JPEG artefacts
//! around glyph edges hurt recognition.

use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} PNG bytes",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}
