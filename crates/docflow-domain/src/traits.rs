//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between the orchestration pipeline
//! and infrastructure. Implementations live in `docflow-provider`; tests
//! supply mocks.

use crate::document::Page;
use crate::session::{FieldSpec, ResultRow};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from the Document Parser collaborator
///
/// Always file-scoped: the batch continues with the remaining files.
#[derive(Error, Debug, Clone)]
pub enum ParserError {
    /// The file format is not supported by this parser
    #[error("Unsupported format: {0}")]
    Unsupported(String),

    /// The file bytes could not be decoded into pages
    #[error("Corrupt document: {0}")]
    Corrupt(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors from the Extraction Provider collaborator
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The provider's rate limit was hit; retryable with backoff
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Network or API communication error
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider answered with something we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Response body failed to deserialize
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ProviderError {
    /// True when the error should be retried after backoff
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimited)
    }
}

/// Request handed to the provider for one chunk
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Chunk text content
    pub content: String,

    /// Fields to extract, in output order
    pub fields: Vec<FieldSpec>,

    /// Extraction prompt from the session's template snapshot
    pub prompt: String,
}

/// Structured rows returned by the provider for one chunk
#[derive(Debug, Clone)]
pub struct ExtractionResponse {
    /// Extracted rows, one map per output row
    pub rows: Vec<ResultRow>,

    /// Tokens the call consumed
    pub tokens_used: usize,

    /// Provider-reported confidence, if any
    pub confidence: Option<f64>,
}

/// Converts raw document bytes into ordered page text
///
/// Implemented by the infrastructure layer. The pipeline treats any
/// failure as file-scoped and recoverable.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Parse a file into its ordered pages
    async fn parse(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<Page>, ParserError>;
}

/// The field-extraction model, with its token-counting capability
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Count tokens for a content blob
    async fn count_tokens(&self, content: &str) -> Result<usize, ProviderError>;

    /// Extract structured rows from chunk text
    async fn extract(&self, request: &ExtractionRequest)
        -> Result<ExtractionResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_classification() {
        assert!(ProviderError::RateLimited.is_rate_limit());
        assert!(!ProviderError::Http("503".to_string()).is_rate_limit());
        assert!(!ProviderError::InvalidResponse("junk".to_string()).is_rate_limit());
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::Http("connection refused".to_string());
        assert_eq!(err.to_string(), "HTTP error: connection refused");

        let err = ParserError::Corrupt("truncated xref table".to_string());
        assert_eq!(err.to_string(), "Corrupt document: truncated xref table");
    }
}
