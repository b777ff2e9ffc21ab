//! Chunk and merged-result types
//!
//! A chunk is one unit of text submitted to the extraction provider in a
//! single call. Chunk content is always concatenated page text, never a
//! byte-level slice of the original document.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chunking tier chosen for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkTier {
    /// Entire file as a single chunk
    Whole,
    /// One chunk per detected document
    DocumentBoundary,
    /// Fixed-size page windows within each document
    PageSplit,
}

impl ChunkTier {
    /// String representation matching the wire format
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkTier::Whole => "whole",
            ChunkTier::DocumentBoundary => "document_boundary",
            ChunkTier::PageSplit => "page_split",
        }
    }
}

impl fmt::Display for ChunkTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of content submitted to the provider, produced once per
/// extraction attempt and immutable thereafter
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkInfo {
    /// Stable identifier, unique within the session
    pub chunk_id: String,

    /// Concatenated page text (pages joined with a blank line)
    pub content: String,

    /// First page covered (1-indexed, inclusive)
    pub start_page: u32,

    /// Last page covered (1-indexed, inclusive)
    pub end_page: u32,

    /// Global 0-indexed position within the file's chunk list
    pub chunk_index: usize,

    /// Total number of chunks for the file, shared by all chunks
    pub total_chunks: usize,

    /// Index of the detected document this chunk belongs to, when the
    /// tier is document-aware
    pub document_index: Option<usize>,

    /// Tier that produced this chunk
    pub tier: ChunkTier,
}

/// Outcome of extracting one chunk, consumed only by the result merger
#[derive(Debug, Clone)]
pub struct ChunkResult {
    /// Identifier of the chunk this outcome belongs to
    pub chunk_id: String,

    /// 0-indexed chunk position
    pub chunk_index: usize,

    /// First page covered
    pub start_page: u32,

    /// Last page covered
    pub end_page: u32,

    /// Detected-document index, if any
    pub document_index: Option<usize>,

    /// Raw extracted payload as returned by the provider
    pub payload: serde_json::Value,

    /// Whether extraction succeeded
    pub success: bool,

    /// Error description when extraction failed
    pub error: Option<String>,

    /// Tokens consumed by this chunk's provider call
    pub tokens_used: usize,

    /// Whether the token estimate came from cache
    pub cache_hit: bool,

    /// Provider-reported confidence, if any
    pub confidence: Option<f64>,
}

/// One normalized extracted item, tagged with its originating chunk's metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedItem {
    /// Normalized payload (always structured JSON)
    pub data: serde_json::Value,

    /// First page of the originating chunk
    pub start_page: u32,

    /// Last page of the originating chunk
    pub end_page: u32,

    /// Detected-document index of the originating chunk
    pub document_index: Option<usize>,

    /// Tokens the originating chunk consumed
    pub tokens_used: usize,

    /// Whether the originating chunk's estimate was cached
    pub cache_hit: bool,

    /// Provider confidence for the originating chunk
    pub confidence: Option<f64>,
}

/// Aggregate statistics for one merge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeMetadata {
    /// Total chunks merged (successful + failed)
    pub total_chunks: usize,

    /// Chunks that succeeded
    pub successful_chunks: usize,

    /// Chunks that failed
    pub failed_chunks: usize,

    /// Tokens summed across all chunks, successful and failed
    pub total_tokens: usize,

    /// Percentage of chunks whose token estimate was a cache hit
    pub cache_hit_rate: f64,

    /// Tier the chunks were produced under
    pub tier: ChunkTier,

    /// Human-readable warnings (failed chunks, deduplication notes)
    pub warnings: Vec<String>,
}

/// Combined, failure-annotated output of all chunks belonging to one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedResult {
    /// True iff zero chunks failed
    pub success: bool,

    /// Ordered items, one per successful chunk
    pub items: Vec<MergedItem>,

    /// Aggregate statistics
    pub metadata: MergeMetadata,

    /// Error strings from failed chunks
    pub errors: Vec<String>,
}
