//! Progress-event catalog for the session event bus

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Tag identifying the kind of a session event
///
/// Serializes to the snake_case wire tags of the progress stream protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Pipeline picked up the session; payload carries the file count
    SessionStarted,
    /// A file is being handed to the document parser
    FileParsing,
    /// A file parsed successfully; payload carries the page count
    FileParsed,
    /// A file failed to parse and was skipped
    FileParsingFailed,
    /// Document detection finished for a file
    DocumentDetected,
    /// A chunk is about to be extracted
    ExtractionStarted,
    /// Overall progress advanced
    ExtractionProgress,
    /// A chunk extracted successfully
    ExtractionCompleted,
    /// A chunk failed extraction (siblings unaffected)
    ExtractionFailed,
    /// The rate limiter delayed a chunk to stay under the quota
    RateLimitWait,
    /// The whole session completed
    SessionCompleted,
    /// An unexpected error failed the whole session
    SessionFailed,
}

impl EventType {
    /// Wire tag for this event type
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SessionStarted => "session_started",
            EventType::FileParsing => "file_parsing",
            EventType::FileParsed => "file_parsed",
            EventType::FileParsingFailed => "file_parsing_failed",
            EventType::DocumentDetected => "document_detected",
            EventType::ExtractionStarted => "extraction_started",
            EventType::ExtractionProgress => "extraction_progress",
            EventType::ExtractionCompleted => "extraction_completed",
            EventType::ExtractionFailed => "extraction_failed",
            EventType::RateLimitWait => "rate_limit_wait",
            EventType::SessionCompleted => "session_completed",
            EventType::SessionFailed => "session_failed",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One tagged progress message
///
/// Events are append-only: emitted once, delivered to subscribers, and
/// buffered per session for late-attaching subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Event tag
    pub event: EventType,

    /// Milliseconds since the Unix epoch at emission time
    pub timestamp: u64,

    /// Event-specific payload
    pub data: serde_json::Value,
}

impl SessionEvent {
    /// Build an event stamped with the current wall-clock time
    pub fn now(event: EventType, data: serde_json::Value) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            event,
            timestamp,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_wire_tags() {
        assert_eq!(EventType::SessionStarted.as_str(), "session_started");
        assert_eq!(EventType::RateLimitWait.as_str(), "rate_limit_wait");
        assert_eq!(EventType::FileParsingFailed.as_str(), "file_parsing_failed");
    }

    #[test]
    fn test_event_serde_matches_wire_tag() {
        let event = SessionEvent::now(EventType::ExtractionProgress, json!({"progress": 40}));
        let serialized = serde_json::to_value(&event).unwrap();
        assert_eq!(serialized["event"], "extraction_progress");
        assert_eq!(serialized["data"]["progress"], 40);
        assert!(serialized["timestamp"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_all_tags_roundtrip() {
        for tag in [
            EventType::SessionStarted,
            EventType::FileParsing,
            EventType::FileParsed,
            EventType::FileParsingFailed,
            EventType::DocumentDetected,
            EventType::ExtractionStarted,
            EventType::ExtractionProgress,
            EventType::ExtractionCompleted,
            EventType::ExtractionFailed,
            EventType::RateLimitWait,
            EventType::SessionCompleted,
            EventType::SessionFailed,
        ] {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag.as_str()));
            let back: EventType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, tag);
        }
    }
}
