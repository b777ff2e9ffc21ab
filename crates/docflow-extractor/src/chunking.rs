//! Tiered chunking that respects logical document boundaries
//!
//! Three tiers are tried in order, selecting the first whose chunks each
//! individually respect the per-chunk token ceiling:
//!
//! 1. **Whole**: small files become a single chunk
//! 2. **DocumentBoundary**: one chunk per detected document
//! 3. **PageSplit**: fixed-size page windows inside each document
//!
//! A chunk never crosses a detected document boundary, and chunk content
//! is always concatenated page text joined with a blank line, never a
//! byte-level slice of the original file.

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::estimator::TokenEstimator;
use docflow_domain::{ChunkInfo, ChunkTier, DetectedDocument, Page};
use std::sync::Arc;

/// Separator used when joining page texts into chunk content
const PAGE_JOIN: &str = "\n\n";

/// Produces ordered chunks for one file under the tiering policy
pub struct ChunkingStrategy {
    estimator: Arc<TokenEstimator>,
    whole_tier_tokens: usize,
    document_tier_tokens: usize,
    chunk_token_ceiling: usize,
    page_window: usize,
}

impl ChunkingStrategy {
    /// Create a strategy from configuration
    pub fn new(estimator: Arc<TokenEstimator>, config: &ExtractorConfig) -> Self {
        Self {
            estimator,
            whole_tier_tokens: config.whole_tier_tokens,
            document_tier_tokens: config.document_tier_tokens,
            chunk_token_ceiling: config.chunk_token_ceiling,
            page_window: config.page_window,
        }
    }

    /// Chunk one file's pages given its total token estimate and
    /// detected documents
    ///
    /// `file_stem` seeds the chunk ids so they stay unique per session.
    pub async fn chunk_file(
        &self,
        file_stem: &str,
        pages: &[Page],
        total_tokens: usize,
        documents: &[DetectedDocument],
    ) -> Result<Vec<ChunkInfo>, ExtractorError> {
        if pages.is_empty() {
            return Err(ExtractorError::InvalidInput(
                "cannot chunk an empty page list".to_string(),
            ));
        }
        if documents.is_empty() {
            return Err(ExtractorError::InvalidInput(
                "cannot chunk without detected documents".to_string(),
            ));
        }

        // Tier 1: whole file as one chunk
        if total_tokens <= self.whole_tier_tokens && total_tokens <= self.chunk_token_ceiling {
            tracing::debug!("{}: whole tier ({} tokens)", file_stem, total_tokens);
            let chunk = self.build_chunk(
                file_stem,
                0,
                join_pages(pages),
                pages[0].page_number,
                pages[pages.len() - 1].page_number,
                None,
                ChunkTier::Whole,
            );
            return Ok(finalize(vec![chunk]));
        }

        // Tier 2: one chunk per detected document, each re-estimated
        if total_tokens <= self.document_tier_tokens {
            if let Some(chunks) = self.try_document_tier(file_stem, pages, documents).await? {
                tracing::debug!(
                    "{}: document-boundary tier ({} chunks)",
                    file_stem,
                    chunks.len()
                );
                return Ok(finalize(chunks));
            }
        }

        // Tier 3: page windows inside each document
        let chunks = self.page_split_tier(file_stem, pages, documents);
        tracing::debug!("{}: page-split tier ({} chunks)", file_stem, chunks.len());
        Ok(finalize(chunks))
    }

    /// Attempt the document-boundary tier; `None` means a document blew
    /// the per-chunk ceiling and the caller must fall through
    async fn try_document_tier(
        &self,
        file_stem: &str,
        pages: &[Page],
        documents: &[DetectedDocument],
    ) -> Result<Option<Vec<ChunkInfo>>, ExtractorError> {
        let mut chunks = Vec::with_capacity(documents.len());

        for (doc_index, doc) in documents.iter().enumerate() {
            let doc_pages = pages_in_range(pages, doc.start_page, doc.end_page);
            let content = join_pages(&doc_pages);

            let estimate = self.estimator.estimate(&content).await?;
            if estimate.tokens > self.chunk_token_ceiling {
                tracing::debug!(
                    "{}: document {} estimated at {} tokens, over the {} ceiling",
                    file_stem,
                    doc_index,
                    estimate.tokens,
                    self.chunk_token_ceiling
                );
                return Ok(None);
            }

            chunks.push(self.build_chunk(
                file_stem,
                chunks.len(),
                content,
                doc.start_page,
                doc.end_page,
                Some(doc_index),
                ChunkTier::DocumentBoundary,
            ));
        }

        Ok(Some(chunks))
    }

    /// Split every document independently into fixed-size page windows
    fn page_split_tier(
        &self,
        file_stem: &str,
        pages: &[Page],
        documents: &[DetectedDocument],
    ) -> Vec<ChunkInfo> {
        let mut chunks = Vec::new();

        for (doc_index, doc) in documents.iter().enumerate() {
            let doc_pages = pages_in_range(pages, doc.start_page, doc.end_page);

            for window in doc_pages.chunks(self.page_window) {
                let chunk = self.build_chunk(
                    file_stem,
                    chunks.len(),
                    join_pages(window),
                    window[0].page_number,
                    window[window.len() - 1].page_number,
                    Some(doc_index),
                    ChunkTier::PageSplit,
                );
                chunks.push(chunk);
            }
        }

        chunks
    }

    #[allow(clippy::too_many_arguments)]
    fn build_chunk(
        &self,
        file_stem: &str,
        index: usize,
        content: String,
        start_page: u32,
        end_page: u32,
        document_index: Option<usize>,
        tier: ChunkTier,
    ) -> ChunkInfo {
        ChunkInfo {
            chunk_id: format!("{}-chunk-{}", file_stem, index),
            content,
            start_page,
            end_page,
            chunk_index: index,
            total_chunks: 0, // patched by finalize once all chunks are known
            document_index,
            tier,
        }
    }
}

/// Patch the shared total count after all chunks for the file are known
fn finalize(mut chunks: Vec<ChunkInfo>) -> Vec<ChunkInfo> {
    let total = chunks.len();
    for chunk in &mut chunks {
        chunk.total_chunks = total;
    }
    chunks
}

/// Pages with a page number in `[start, end]`, cloned in order
fn pages_in_range(pages: &[Page], start: u32, end: u32) -> Vec<Page> {
    pages
        .iter()
        .filter(|p| p.page_number >= start && p.page_number <= end)
        .cloned()
        .collect()
}

/// Join page texts with the blank-line separator
fn join_pages(pages: &[Page]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PAGE_JOIN)
}
