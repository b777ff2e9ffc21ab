//! Session module - one batch-extraction run's full state

use crate::chunk::MergeMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;

/// Unique identifier for a batch session, based on UUIDv7
///
/// UUIDv7 provides chronological sortability and coordination-free
/// generation, so session ids double as a creation-ordered key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Generate a new UUIDv7-based SessionId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse a SessionId from its string form
    pub fn parse(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid session id: {}", e))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created, not yet picked up by the processor
    Pending,
    /// Pipeline is running
    Processing,
    /// Pipeline ran to natural completion (possibly with per-chunk failures)
    Completed,
    /// An unexpected error escaped the pipeline
    Failed,
}

impl SessionStatus {
    /// String representation matching the wire format
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Processing => "processing",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }

    /// True once the session has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One field the template asks the provider to extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Column name in the output rows
    pub name: String,

    /// Natural-language description handed to the provider
    pub description: String,
}

/// Immutable copy of the template taken at session creation
///
/// Sessions never observe later edits to the template they were created
/// from; the snapshot is the contract for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSnapshot {
    /// Ordered list of fields to extract
    pub fields: Vec<FieldSpec>,

    /// Extraction prompt sent alongside every chunk
    pub prompt: String,
}

/// A static name/value pair appended to every output row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomColumn {
    /// Column name
    pub name: String,

    /// Constant value for all rows
    pub value: String,
}

/// One input file queued in a session
#[derive(Debug, Clone)]
pub struct SessionFile {
    /// Original file name (used for grouping results)
    pub name: String,

    /// Raw document bytes, handed to the Document Parser
    pub bytes: Vec<u8>,
}

/// One extracted output row: field name to extracted value
pub type ResultRow = serde_json::Map<String, serde_json::Value>;

/// Per-file outcome recorded once the file finishes its pipeline stages
///
/// Used by the results query to group rows by source file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    /// Source file name
    pub file_name: String,

    /// False if the file failed to parse or any of its chunks failed
    pub success: bool,

    /// File-scoped error (parse failure), if any
    pub error: Option<String>,

    /// Rows extracted from this file, custom columns already applied
    pub rows: Vec<ResultRow>,

    /// Merge aggregates; absent when the file never reached extraction
    pub metadata: Option<MergeMetadata>,
}

/// One batch-extraction run's full state
///
/// Owned exclusively by the session store; mutated only through its
/// operations. Progress is monotonically non-decreasing.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Template snapshot taken at creation
    pub template: TemplateSnapshot,

    /// Input files queued for this run
    pub files: Vec<SessionFile>,

    /// Static columns appended to every output row
    pub custom_columns: Vec<CustomColumn>,

    /// Lifecycle status
    pub status: SessionStatus,

    /// Progress, 0-100
    pub progress: u8,

    /// Accumulated result rows across all files (append-only)
    pub rows: Vec<ResultRow>,

    /// Per-file outcomes, in processing order
    pub file_outcomes: Vec<FileOutcome>,

    /// When the session was created
    pub created_at: Instant,

    /// When the session reached a terminal state
    pub completed_at: Option<Instant>,

    /// Error message when status is Failed
    pub error_message: Option<String>,
}

impl Session {
    /// Create a fresh pending session
    pub fn new(
        template: TemplateSnapshot,
        files: Vec<SessionFile>,
        custom_columns: Vec<CustomColumn>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            template,
            files,
            custom_columns,
            status: SessionStatus::Pending,
            progress: 0,
            rows: Vec::new(),
            file_outcomes: Vec::new(),
            created_at: Instant::now(),
            completed_at: None,
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> TemplateSnapshot {
        TemplateSnapshot {
            fields: vec![FieldSpec {
                name: "vendor".to_string(),
                description: "Vendor name".to_string(),
            }],
            prompt: "Extract the fields".to_string(),
        }
    }

    #[test]
    fn test_session_id_roundtrip() {
        let id = SessionId::new();
        let parsed = SessionId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_session_id_invalid() {
        assert!(SessionId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_session_ids_sort_by_creation() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert!(a <= b);
    }

    #[tokio::test]
    async fn test_new_session_defaults() {
        let session = Session::new(template(), Vec::new(), Vec::new());
        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(session.progress, 0);
        assert!(session.rows.is_empty());
        assert!(session.completed_at.is_none());
        assert!(session.error_message.is_none());
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(SessionStatus::Pending.as_str(), "pending");
        assert_eq!(SessionStatus::Processing.as_str(), "processing");
        assert_eq!(SessionStatus::Completed.as_str(), "completed");
        assert_eq!(SessionStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!SessionStatus::Pending.is_terminal());
        assert!(!SessionStatus::Processing.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
    }
}
