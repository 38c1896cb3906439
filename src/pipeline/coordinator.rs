//! Fan-out of page extraction and reassembly in page order.
//!
//! Pages are dispatched through `buffer_unordered`, so at most `concurrency`
//! pages are in flight and results arrive in completion order. Each result is
//! dropped into a slot indexed by its page number; reading the slots front to
//! back gives page order without any sorting.

use crate::error::PageError;
use crate::output::PageRecord;
use crate::pipeline::page::PageExtractor;
use crate::progress::DocumentProgress;
use chrono::Local;
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Extract pages `1..=page_count` with at most `concurrency` in flight.
///
/// Returns exactly `page_count` records, ordered by page number.
pub async fn extract_pages(
    extractor: Arc<PageExtractor>,
    page_count: usize,
    concurrency: usize,
    progress: &DocumentProgress,
) -> Vec<PageRecord> {
    progress.set_pages_total(page_count);

    let mut slots: Vec<Option<PageRecord>> = vec![None; page_count];

    let mut completed = stream::iter(1..=page_count)
        .map(|page| {
            let extractor = Arc::clone(&extractor);
            async move { extractor.extract(page).await }
        })
        .buffer_unordered(concurrency.max(1));

    while let Some(record) = completed.next().await {
        let page = record.page;
        progress.page_completed(page);
        match slots.get_mut(page.wrapping_sub(1)) {
            Some(slot) => *slot = Some(record),
            None => warn!("Discarding record for unexpected page {}", page),
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.unwrap_or_else(|| {
                PageRecord::failed(
                    i + 1,
                    PageError::TaskFailed {
                        page: i + 1,
                        detail: "no result collected".into(),
                    },
                )
            })
        })
        .collect()
}

/// Join page texts with newlines, in the order given.
pub fn concatenate(pages: &[PageRecord]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Persist `text` as `<dir>/extracted_<YYYYmmdd_HHMMSS>.txt`.
///
/// Never overwrites: if the name is taken, `_1`, `_2`, ... is appended. The
/// file appears fully written or not at all (temp file, then rename).
pub async fn write_artifact(dir: &Path, text: &str) -> std::io::Result<PathBuf> {
    let dir = dir.to_path_buf();
    let text = text.to_string();
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

    let path = tokio::task::spawn_blocking(move || write_artifact_blocking(&dir, &stamp, &text))
        .await
        .map_err(std::io::Error::other)??;

    info!("Extracted text saved to {}", path.display());
    Ok(path)
}

fn write_artifact_blocking(dir: &Path, stamp: &str, text: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.flush()?;

    let mut attempt = 0usize;
    loop {
        let name = if attempt == 0 {
            format!("extracted_{stamp}.txt")
        } else {
            format!("extracted_{stamp}_{attempt}.txt")
        };
        let target = dir.join(name);
        match tmp.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!("{} exists, trying next suffix", target.display());
                tmp = e.file;
                attempt += 1;
            }
            Err(e) => return Err(e.error),
        }
    }
}
