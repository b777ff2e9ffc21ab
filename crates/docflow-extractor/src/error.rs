//! Error types for the extraction stages

use docflow_domain::ProviderError;
use thiserror::Error;

/// Errors that can occur during detection, chunking, and merging
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Malformed page or session input; fatal to the enclosing operation only
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Document detection failed (callers recover via single-document fallback)
    #[error("Detection failed: {0}")]
    Detection(String),

    /// No chunking tier could produce valid chunks
    #[error("Chunking failed: {0}")]
    Chunking(String),

    /// Error from the extraction provider, propagated uninterpreted
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
