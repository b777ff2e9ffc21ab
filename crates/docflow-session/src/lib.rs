//! Docflow Session
//!
//! Session lifecycle for batch extraction runs: the in-memory session
//! store, the TTL sweeper evicting finished runs, and the per-session
//! progress event bus.
//!
//! # Key Features
//!
//! - **Exclusive Ownership**: All session mutation flows through the
//!   store, keeping lifecycle invariants in one place
//! - **Monotonic Progress**: Progress updates never move backwards
//! - **Replay Buffers**: Subscribers attaching mid-run receive the
//!   events they missed
//! - **TTL Eviction**: Terminal sessions and their event channels are
//!   swept after a configurable idle period
//!
//! # Example Usage
//!
//! ```no_run
//! use docflow_session::{SessionConfig, SessionEventEmitter, SessionStore};
//! use docflow_domain::{EventType, TemplateSnapshot};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let config = SessionConfig::default();
//! let store = Arc::new(SessionStore::new(config.session_ttl()));
//! let emitter = Arc::new(SessionEventEmitter::new(config.replay_buffer_size));
//!
//! let template = TemplateSnapshot { fields: Vec::new(), prompt: "Extract".to_string() };
//! let id = store.create_session(template, Vec::new(), Vec::new());
//! let mut progress = emitter.subscribe(id, EventType::ExtractionProgress);
//!
//! while let Some(event) = progress.recv().await {
//!     println!("{}", event.data);
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod emitter;
mod error;
mod store;
mod sweeper;

pub use config::SessionConfig;
pub use emitter::SessionEventEmitter;
pub use error::SessionError;
pub use store::SessionStore;
pub use sweeper::SessionSweeper;
