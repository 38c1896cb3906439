//! Document-scoped progress tracking.
//!
//! Every call to [`crate::process::process_document_tracked`] receives a
//! [`DocumentProgress`] handle and threads it through each stage. The handle
//! is cheap to clone (an `Arc` around atomics), so the coordinator, the page
//! workers, and the summary worker all update the same record without locks.
//!
//! Status readers never touch the live state: they call
//! [`DocumentProgress::snapshot`] (or [`ProgressRegistry::snapshot`]) and get a
//! plain, serialisable [`ProgressSnapshot`].
//!
//! Callers that prefer push notifications implement
//! [`ProcessingProgressCallback`]; the handle forwards stage changes and
//! per-page / per-chunk completions to it.
//!
//! # Example
//!
//! ```rust
//! use pdf_digest::{DocumentProgress, ProcessingStage};
//!
//! let progress = DocumentProgress::new("report.pdf", None);
//! progress.advance(ProcessingStage::ExtractingIndex);
//! assert_eq!(progress.snapshot().stage, ProcessingStage::ExtractingIndex);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// Coarse pipeline stage. Ordered: a document only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    Queued = 0,
    ExtractingIndex = 1,
    ExtractingPages = 2,
    Summarizing = 3,
    Complete = 4,
    Failed = 5,
}

impl ProcessingStage {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Queued,
            1 => Self::ExtractingIndex,
            2 => Self::ExtractingPages,
            3 => Self::Summarizing,
            4 => Self::Complete,
            _ => Self::Failed,
        }
    }

    /// Human-readable label used in logs and the CLI.
    pub fn label(self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::ExtractingIndex => "Extracting index",
            Self::ExtractingPages => "Extracting pages",
            Self::Summarizing => "Summarizing content",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }
}

/// Called by the pipeline as a document moves through its stages.
///
/// All methods have no-op defaults. `on_page_complete` may be called
/// concurrently from several page workers; implementations must be
/// `Send + Sync` and synchronise their own state.
pub trait ProcessingProgressCallback: Send + Sync {
    /// The document entered `stage`.
    fn on_stage(&self, document_id: &str, stage: ProcessingStage) {
        let _ = (document_id, stage);
    }

    /// A page finished extraction (in completion order, not page order).
    ///
    /// * `page`: 1-indexed page that just finished
    /// * `done`: pages finished so far, including this one
    /// * `total`: pages in the document
    fn on_page_complete(&self, page: usize, done: usize, total: usize) {
        let _ = (page, done, total);
    }

    /// A summary chunk came back from the generation endpoint.
    fn on_chunk_complete(&self, chunk: usize, done: usize, total: usize) {
        let _ = (chunk, done, total);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ProcessingProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ProcessingConfig`].
pub type ProgressCallback = Arc<dyn ProcessingProgressCallback>;

/// Point-in-time copy of a document's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub document_id: String,
    pub stage: ProcessingStage,
    pub pages_done: usize,
    pub pages_total: usize,
    pub chunks_done: usize,
    pub chunks_total: usize,
}

impl ProgressSnapshot {
    /// Page-extraction progress in percent (0 when the page count is unknown).
    pub fn page_percent(&self) -> u8 {
        if self.pages_total == 0 {
            return 0;
        }
        ((self.pages_done * 100) / self.pages_total).min(100) as u8
    }
}

struct ProgressState {
    document_id: String,
    stage: AtomicU8,
    pages_done: AtomicUsize,
    pages_total: AtomicUsize,
    chunks_done: AtomicUsize,
    chunks_total: AtomicUsize,
    callback: Option<ProgressCallback>,
}

/// Thread-safe progress handle for one document.
#[derive(Clone)]
pub struct DocumentProgress {
    inner: Arc<ProgressState>,
}

impl std::fmt::Debug for DocumentProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentProgress")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl DocumentProgress {
    pub fn new(document_id: impl Into<String>, callback: Option<ProgressCallback>) -> Self {
        Self {
            inner: Arc::new(ProgressState {
                document_id: document_id.into(),
                stage: AtomicU8::new(ProcessingStage::Queued as u8),
                pages_done: AtomicUsize::new(0),
                pages_total: AtomicUsize::new(0),
                chunks_done: AtomicUsize::new(0),
                chunks_total: AtomicUsize::new(0),
                callback,
            }),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.inner.document_id
    }

    /// Move to `stage`. Moving backwards is ignored; returns whether the
    /// stage actually changed.
    pub fn advance(&self, stage: ProcessingStage) -> bool {
        let prev = self.inner.stage.fetch_max(stage as u8, Ordering::SeqCst);
        let changed = prev < stage as u8;
        if changed {
            if let Some(ref cb) = self.inner.callback {
                cb.on_stage(&self.inner.document_id, stage);
            }
        }
        changed
    }

    pub fn stage(&self) -> ProcessingStage {
        ProcessingStage::from_u8(self.inner.stage.load(Ordering::SeqCst))
    }

    pub(crate) fn set_pages_total(&self, total: usize) {
        self.inner.pages_total.store(total, Ordering::SeqCst);
    }

    pub(crate) fn page_completed(&self, page: usize) {
        let done = self.inner.pages_done.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(ref cb) = self.inner.callback {
            cb.on_page_complete(page, done, self.inner.pages_total.load(Ordering::SeqCst));
        }
    }

    pub(crate) fn set_chunks_total(&self, total: usize) {
        self.inner.chunks_total.store(total, Ordering::SeqCst);
    }

    pub(crate) fn chunk_completed(&self, chunk: usize) {
        let done = self.inner.chunks_done.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(ref cb) = self.inner.callback {
            cb.on_chunk_complete(chunk, done, self.inner.chunks_total.load(Ordering::SeqCst));
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            document_id: self.inner.document_id.clone(),
            stage: self.stage(),
            pages_done: self.inner.pages_done.load(Ordering::SeqCst),
            pages_total: self.inner.pages_total.load(Ordering::SeqCst),
            chunks_done: self.inner.chunks_done.load(Ordering::SeqCst),
            chunks_total: self.inner.chunks_total.load(Ordering::SeqCst),
        }
    }
}

/// Lookup table from document id to progress handle, for status endpoints.
///
/// The registry only hands out snapshots to readers; writers hold the
/// [`DocumentProgress`] returned by [`ProgressRegistry::track`].
#[derive(Default)]
pub struct ProgressRegistry {
    documents: RwLock<HashMap<String, DocumentProgress>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `document_id` and return its handle. Re-registering an id
    /// replaces the previous handle.
    pub fn track(
        &self,
        document_id: impl Into<String>,
        callback: Option<ProgressCallback>,
    ) -> DocumentProgress {
        let document_id = document_id.into();
        let handle = DocumentProgress::new(document_id.clone(), callback);
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        documents.insert(document_id, handle.clone());
        handle
    }

    pub fn snapshot(&self, document_id: &str) -> Option<ProgressSnapshot> {
        self.documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(document_id)
            .map(DocumentProgress::snapshot)
    }

    pub fn forget(&self, document_id: &str) -> bool {
        self.documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(document_id)
            .is_some()
    }
}
