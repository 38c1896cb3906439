//! Chunked summarisation.
//!
//! The document text is cut into fixed-size word chunks and every chunk is
//! summarised by the generation endpoint. The endpoint is single-flight: one
//! worker task owns the client and drains an ordered queue of chunks, so at
//! most one request is outstanding and summaries come back in chunk order.
//!
//! Each chunk moves `Pending → Requested → Received → Cleaned`. A failed or
//! empty generation still reaches `Cleaned`, carrying
//! [`NO_SUMMARY_PLACEHOLDER`] instead of text.

use crate::pipeline::llm::{GenerateRequest, GenerationClient};
use crate::pipeline::postprocess::clean_summary;
use crate::progress::DocumentProgress;
use crate::prompts::chunk_summary_prompt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Stands in for a chunk whose generation produced nothing usable.
pub const NO_SUMMARY_PLACEHOLDER: &str = "⚠️ No summary generated.";

/// Split `text` on whitespace into chunks of at most `size` words.
///
/// Words inside a chunk are joined by single spaces. Joining the chunks with
/// spaces reproduces `text.split_whitespace()` exactly.
pub fn chunk_words(text: &str, size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(size.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Lifecycle of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkState {
    Pending,
    Requested,
    Received,
    Cleaned,
}

/// Outcome for one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSummary {
    /// 1-based position in the document.
    pub index: usize,
    pub words: usize,
    pub state: ChunkState,
    /// Cleaned summary, or the placeholder.
    pub text: String,
    /// `true` when `text` is the placeholder.
    pub degraded: bool,
}

impl ChunkSummary {
    fn pending(index: usize, words: usize) -> Self {
        Self {
            index,
            words,
            state: ChunkState::Pending,
            text: String::new(),
            degraded: false,
        }
    }

    fn advance(&mut self, next: ChunkState) {
        debug_assert!(next > self.state, "chunk {} moved backwards", self.index);
        self.state = next;
    }
}

/// Summary text plus the per-chunk record it was assembled from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub text: String,
    pub chunks: Vec<ChunkSummary>,
}

impl SummaryOutput {
    pub fn degraded_chunks(&self) -> usize {
        self.chunks.iter().filter(|c| c.degraded).count()
    }
}

/// Drives the chunk queue through a [`GenerationClient`].
#[derive(Clone)]
pub struct SummaryGenerator {
    client: Arc<dyn GenerationClient>,
    model: String,
    max_tokens: usize,
    chunk_words: usize,
}

impl SummaryGenerator {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        model: impl Into<String>,
        max_tokens: usize,
        chunk_words: usize,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
            chunk_words: chunk_words.max(1),
        }
    }

    /// Summarise `text`. Never fails; empty input gives an empty summary.
    pub async fn summarize(&self, text: &str, progress: &DocumentProgress) -> SummaryOutput {
        let chunks = chunk_words(text, self.chunk_words);
        let total = chunks.len();
        progress.set_chunks_total(total);
        if total == 0 {
            info!("No text to summarise");
            return SummaryOutput::default();
        }
        info!("Summarising {} chunk(s) of up to {} words", total, self.chunk_words);

        let (tx, rx) = mpsc::unbounded_channel();
        for (i, chunk) in chunks.into_iter().enumerate() {
            // The receiver is alive until the worker below finishes.
            let _ = tx.send((i + 1, chunk));
        }
        drop(tx);

        let worker = tokio::spawn(run_worker(self.clone(), rx, progress.clone()));
        let summaries = match worker.await {
            Ok(summaries) => summaries,
            Err(e) => {
                warn!("Summary worker failed: {}", e);
                (1..=total)
                    .map(|index| ChunkSummary {
                        state: ChunkState::Cleaned,
                        text: NO_SUMMARY_PLACEHOLDER.to_string(),
                        degraded: true,
                        ..ChunkSummary::pending(index, 0)
                    })
                    .collect()
            }
        };

        let joined = summaries
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        SummaryOutput {
            text: clean_summary(&joined),
            chunks: summaries,
        }
    }

    async fn summarize_chunk(&self, index: usize, chunk: String) -> ChunkSummary {
        let mut summary = ChunkSummary::pending(index, chunk.split(' ').count());
        let request = GenerateRequest::new(&self.model, chunk_summary_prompt(&chunk), self.max_tokens);

        summary.advance(ChunkState::Requested);
        debug!("Chunk {}: requesting summary ({} words)", index, summary.words);
        let generated = match self.client.generate(&request).await {
            Ok(resp) => resp.response,
            Err(e) => {
                warn!("Chunk {}: generation failed: {}", index, e);
                None
            }
        };

        summary.advance(ChunkState::Received);
        let cleaned = generated.map(|t| clean_summary(&t)).filter(|t| !t.is_empty());
        match cleaned {
            Some(text) => summary.text = text,
            None => {
                warn!("Chunk {}: no summary generated, using placeholder", index);
                summary.text = NO_SUMMARY_PLACEHOLDER.to_string();
                summary.degraded = true;
            }
        }

        summary.advance(ChunkState::Cleaned);
        summary
    }
}

/// Single consumer of the chunk queue.
async fn run_worker(
    generator: SummaryGenerator,
    mut queue: mpsc::UnboundedReceiver<(usize, String)>,
    progress: DocumentProgress,
) -> Vec<ChunkSummary> {
    let mut done = Vec::new();
    while let Some((index, chunk)) = queue.recv().await {
        let summary = generator.summarize_chunk(index, chunk).await;
        progress.chunk_completed(index);
        done.push(summary);
    }
    done
}
