//! Docflow Domain Layer
//!
//! Core data model and trait interfaces for the batch document-extraction
//! pipeline. This crate defines the concepts every other layer depends on
//! and the seams where external collaborators plug in.
//!
//! ## Key Concepts
//!
//! - **Session**: one batch-extraction run's full state, keyed by a unique id
//! - **DetectedDocument**: a contiguous page range believed to be one logical document
//! - **Chunk**: one unit of text submitted to the extraction provider per call
//! - **MergedResult**: the failure-annotated, combined output of all chunks
//! - **SessionEvent**: a tagged progress message streamed to subscribers
//!
//! ## Architecture
//!
//! Infrastructure implementations live in other crates:
//! - `docflow-provider` implements [`DocumentParser`] and [`ExtractionProvider`]
//! - `docflow-extractor` implements detection, chunking, and merging
//! - `docflow-session` owns session state and the event bus
//! - `docflow-engine` orchestrates the pipeline

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod document;
pub mod event;
pub mod session;
pub mod traits;

// Re-exports for convenience
pub use chunk::{ChunkInfo, ChunkResult, ChunkTier, MergeMetadata, MergedItem, MergedResult};
pub use document::{DetectedDocument, Page};
pub use event::{EventType, SessionEvent};
pub use session::{
    CustomColumn, FieldSpec, FileOutcome, ResultRow, Session, SessionFile, SessionId,
    SessionStatus, TemplateSnapshot,
};
pub use traits::{
    DocumentParser, ExtractionProvider, ExtractionRequest, ExtractionResponse, ParserError,
    ProviderError,
};
