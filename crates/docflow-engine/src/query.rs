//! Status and results query surface
//!
//! Read-only views over the session store plus live limiter stats.
//! Results are withheld until the session reaches a terminal state; the
//! status query is always available.

use crate::error::EngineError;
use crate::rate_limit::{RateLimitManager, RateLimitStats};
use docflow_domain::{MergeMetadata, ResultRow, SessionId, SessionStatus};
use docflow_session::{SessionError, SessionStore};
use serde::Serialize;
use std::sync::Arc;

/// Per-file counters in a status report
#[derive(Debug, Clone, Serialize)]
pub struct FileProgress {
    /// Files queued in the session
    pub total: usize,

    /// Files that finished their pipeline stages (including failures)
    pub processed: usize,

    /// True when any processed file failed or had failed chunks
    pub has_errors: bool,
}

/// Snapshot answering "how is my batch doing?"
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusReport {
    /// Session id
    pub session_id: SessionId,

    /// Lifecycle status
    pub status: SessionStatus,

    /// Progress, 0-100
    pub progress: u8,

    /// Per-file counters
    pub files: FileProgress,

    /// Linear projection from elapsed time and progress; absent before
    /// any progress or after completion
    pub estimated_time_remaining_secs: Option<u64>,

    /// Live rate-limiter snapshot
    pub rate_limit: RateLimitStats,

    /// Error message when the session failed
    pub error: Option<String>,
}

/// One source file's share of the final results
#[derive(Debug, Clone, Serialize)]
pub struct FileResults {
    /// Source file name
    pub file_name: String,

    /// False if the file failed to parse or any chunk failed
    pub success: bool,

    /// File-scoped error, if any
    pub error: Option<String>,

    /// Extracted rows, custom columns applied
    pub rows: Vec<ResultRow>,

    /// Merge aggregates; absent when the file never reached extraction
    pub metadata: Option<MergeMetadata>,
}

/// Final results of a terminal session, grouped by source file
#[derive(Debug, Clone, Serialize)]
pub struct SessionResultsReport {
    /// Session id
    pub session_id: SessionId,

    /// Terminal status the session ended in
    pub status: SessionStatus,

    /// Per-file results in processing order
    pub files: Vec<FileResults>,

    /// Rows across all files
    pub total_rows: usize,
}

/// Read-only query surface over sessions and the rate limiter
pub struct SessionQuery {
    store: Arc<SessionStore>,
    rate_limiter: Arc<RateLimitManager>,
}

impl SessionQuery {
    /// Create a query surface over shared collaborators
    pub fn new(store: Arc<SessionStore>, rate_limiter: Arc<RateLimitManager>) -> Self {
        Self {
            store,
            rate_limiter,
        }
    }

    /// Point-in-time status of a session
    pub async fn session_status(&self, id: SessionId) -> Result<SessionStatusReport, EngineError> {
        let session = self
            .store
            .get_session(id)
            .ok_or(SessionError::NotFound(id))?;

        let has_errors = session.file_outcomes.iter().any(|f| !f.success);
        let estimated_time_remaining_secs = estimate_remaining(
            session.status,
            session.progress,
            session.created_at.elapsed().as_secs(),
        );

        Ok(SessionStatusReport {
            session_id: id,
            status: session.status,
            progress: session.progress,
            files: FileProgress {
                total: session.files.len(),
                processed: session.file_outcomes.len(),
                has_errors,
            },
            estimated_time_remaining_secs,
            rate_limit: self.rate_limiter.stats().await,
            error: session.error_message,
        })
    }

    /// Final results, available only once the session is terminal
    pub fn session_results(&self, id: SessionId) -> Result<SessionResultsReport, EngineError> {
        let session = self
            .store
            .get_session(id)
            .ok_or(SessionError::NotFound(id))?;

        if !session.status.is_terminal() {
            return Err(EngineError::ResultsNotReady(id));
        }

        let files: Vec<FileResults> = session
            .file_outcomes
            .into_iter()
            .map(|outcome| FileResults {
                file_name: outcome.file_name,
                success: outcome.success,
                error: outcome.error,
                rows: outcome.rows,
                metadata: outcome.metadata,
            })
            .collect();
        let total_rows = files.iter().map(|f| f.rows.len()).sum();

        Ok(SessionResultsReport {
            session_id: id,
            status: session.status,
            files,
            total_rows,
        })
    }
}

/// Linear projection of remaining seconds from progress so far
fn estimate_remaining(status: SessionStatus, progress: u8, elapsed_secs: u64) -> Option<u64> {
    if status.is_terminal() || progress == 0 {
        return None;
    }
    let remaining = 100u64.saturating_sub(progress as u64);
    Some(elapsed_secs * remaining / progress as u64)
}
