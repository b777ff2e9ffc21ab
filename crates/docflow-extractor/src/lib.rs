//! Docflow Extractor
//!
//! The extraction stages that turn parsed pages into merged, structured
//! results: document detection, token estimation, tiered chunking, and
//! result merging.
//!
//! # Architecture
//!
//! ```text
//! Pages → DocumentDetector → TokenEstimator → ChunkingStrategy → provider calls
//!                                                                     ↓
//!                                        MergedResult ← ResultMerger ←┘
//! ```
//!
//! # Key Features
//!
//! - **Multi-Document Detection**: Heuristic page scoring splits scanned
//!   batches into logical documents
//! - **Tiered Chunking**: Whole-file, document-boundary, and page-split
//!   tiers, never crossing a detected document boundary
//! - **Cached Token Estimation**: Digest-keyed TTL cache in front of the
//!   provider's token counter
//! - **Failure-Tolerant Merging**: Failed chunks become warnings, not
//!   lost batches
//!
//! # Example Usage
//!
//! ```no_run
//! use docflow_extractor::{ChunkingStrategy, DocumentDetector, ExtractorConfig, TokenEstimator};
//! use docflow_provider::MockProvider;
//! use docflow_domain::Page;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExtractorConfig::default();
//! let provider = Arc::new(MockProvider::new());
//! let estimator = Arc::new(TokenEstimator::new(provider, config.token_cache_ttl()));
//! let detector = DocumentDetector::new(config.split_threshold)?;
//! let chunker = ChunkingStrategy::new(estimator.clone(), &config);
//!
//! let pages = vec![Page::new(1, "Invoice INV-1001 ..."), Page::new(2, "line items")];
//! let documents = detector.detect(&pages)?;
//! let total = estimator.estimate("Invoice INV-1001 ...\n\nline items").await?;
//! let chunks = chunker.chunk_file("file0", &pages, total.tokens, &documents).await?;
//!
//! println!("{} documents, {} chunks", documents.len(), chunks.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod chunking;
mod config;
mod detector;
mod error;
mod estimator;
mod merger;

pub use chunking::ChunkingStrategy;
pub use config::ExtractorConfig;
pub use detector::DocumentDetector;
pub use error::ExtractorError;
pub use estimator::{TokenEstimate, TokenEstimator};
pub use merger::ResultMerger;
