//! Docflow Engine
//!
//! Orchestration for batch document extraction: the rate-aware batch
//! processor, the sliding-window token rate limiter, and the status and
//! results query surface.
//!
//! # Architecture
//!
//! ```text
//! Session ──▶ BatchProcessor ──▶ DocumentParser ──▶ DocumentDetector
//!                  │                                      │
//!                  │          ChunkingStrategy ◀──────────┘
//!                  │                  │
//!                  ▼                  ▼
//!          RateLimitManager ──▶ ExtractionProvider ──▶ ResultMerger
//! ```
//!
//! # Key Features
//!
//! - **Rate-Aware Scheduling**: A sliding-window limiter admits every
//!   provider call against an effective quota held below the hard limit
//! - **Exponential Backoff**: Provider rate-limit errors retry the same
//!   chunk with doubling delays before going fatal
//! - **Partial-Failure Tolerance**: Parse and chunk failures stay scoped
//!   to their file; the batch always runs to the end
//! - **Live Observability**: Progress events on the session bus plus a
//!   status query with limiter statistics
//!
//! # Example Usage
//!
//! ```no_run
//! use docflow_engine::{BatchProcessor, EngineConfig, RateLimitManager, SessionQuery};
//! use docflow_extractor::ExtractorConfig;
//! use docflow_provider::{MockProvider, PlainTextParser};
//! use docflow_session::{SessionConfig, SessionEventEmitter, SessionStore};
//! use docflow_domain::{SessionFile, TemplateSnapshot};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session_config = SessionConfig::default();
//! let store = Arc::new(SessionStore::new(session_config.session_ttl()));
//! let emitter = Arc::new(SessionEventEmitter::new(session_config.replay_buffer_size));
//! let rate_limiter = Arc::new(RateLimitManager::new(&EngineConfig::default()));
//!
//! let processor = BatchProcessor::new(
//!     store.clone(),
//!     emitter.clone(),
//!     rate_limiter.clone(),
//!     Arc::new(PlainTextParser),
//!     Arc::new(MockProvider::new()),
//!     &ExtractorConfig::default(),
//! )?;
//!
//! let template = TemplateSnapshot { fields: Vec::new(), prompt: "Extract".to_string() };
//! let files = vec![SessionFile { name: "batch.txt".to_string(), bytes: b"Invoice #1".to_vec() }];
//! let id = store.create_session(template, files, Vec::new());
//!
//! processor.process(id).await?;
//!
//! let query = SessionQuery::new(store, rate_limiter);
//! let results = query.session_results(id)?;
//! println!("{} rows extracted", results.total_rows);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod processor;
mod query;
mod rate_limit;

pub use config::EngineConfig;
pub use error::EngineError;
pub use processor::BatchProcessor;
pub use query::{FileProgress, FileResults, SessionQuery, SessionResultsReport, SessionStatusReport};
pub use rate_limit::{RateLimitManager, RateLimitStats};
