//! Error types for the orchestration engine

use docflow_domain::{ProviderError, SessionId};
use docflow_extractor::ExtractorError;
use docflow_session::SessionError;
use thiserror::Error;

/// Errors that can occur while orchestrating a batch run
#[derive(Error, Debug)]
pub enum EngineError {
    /// Provider rate limiting persisted past the maximum backoff
    /// attempts; fatal for the affected chunk only
    #[error("Rate limit exceeded after maximum backoff attempts")]
    RateLimitExceeded,

    /// Session store error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Extraction stage error
    #[error("Extractor error: {0}")]
    Extractor(#[from] ExtractorError),

    /// Provider error that is not recoverable at this layer
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Results were requested before the session reached a terminal state
    #[error("Results not ready for session {0}")]
    ResultsNotReady(SessionId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
