//! Docflow Provider Layer
//!
//! Pluggable implementations of the collaborator traits from
//! `docflow-domain`.
//!
//! # Providers
//!
//! - [`MockProvider`]: deterministic extraction provider for testing,
//!   with scripted responses and error injection
//! - [`HttpProvider`]: JSON-over-HTTP extraction provider that maps
//!   HTTP 429 onto the distinguished rate-limit error
//! - [`PlainTextParser`]: document parser for plain-text inputs, with
//!   form-feed page separation
//!
//! # Examples
//!
//! ```
//! use docflow_provider::MockProvider;
//! use docflow_domain::ExtractionProvider;
//!
//! # async fn example() {
//! let provider = MockProvider::new();
//! let tokens = provider.count_tokens("some content").await.unwrap();
//! assert!(tokens > 0);
//! # }
//! ```

#![warn(missing_docs)]

pub mod http;
pub mod parser;

use async_trait::async_trait;
use docflow_domain::{
    ExtractionProvider, ExtractionRequest, ExtractionResponse, ProviderError, ResultRow,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub use http::HttpProvider;
pub use parser::PlainTextParser;

/// Approximate characters per token used by the mock's counter
const MOCK_CHARS_PER_TOKEN: usize = 4;

/// Deterministic extraction provider for testing
///
/// Returns pre-configured responses without any network calls. Scripted
/// outcomes (including rate-limit errors) are consumed in FIFO order
/// before the default response kicks in.
///
/// # Examples
///
/// ```
/// use docflow_provider::MockProvider;
/// use docflow_domain::{ExtractionProvider, ExtractionRequest, ProviderError};
///
/// # async fn example() {
/// let provider = MockProvider::new();
/// provider.push_outcome(Err(ProviderError::RateLimited));
///
/// let request = ExtractionRequest {
///     content: "Invoice #123".to_string(),
///     fields: Vec::new(),
///     prompt: "Extract".to_string(),
/// };
///
/// // First call consumes the scripted error, second falls back to default
/// assert!(provider.extract(&request).await.is_err());
/// assert!(provider.extract(&request).await.is_ok());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_rows: Vec<ResultRow>,
    scripted: Arc<Mutex<VecDeque<Result<ExtractionResponse, ProviderError>>>>,
    extract_calls: Arc<Mutex<usize>>,
    count_calls: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a provider that returns a single generic row per chunk
    pub fn new() -> Self {
        let mut row = ResultRow::new();
        row.insert(
            "value".to_string(),
            serde_json::Value::String("mock".to_string()),
        );
        Self::with_rows(vec![row])
    }

    /// Create a provider that returns the given rows for every chunk
    pub fn with_rows(rows: Vec<ResultRow>) -> Self {
        Self {
            default_rows: rows,
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            extract_calls: Arc::new(Mutex::new(0)),
            count_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Queue a scripted outcome, consumed before the default response
    pub fn push_outcome(&self, outcome: Result<ExtractionResponse, ProviderError>) {
        self.scripted.lock().unwrap().push_back(outcome);
    }

    /// Queue `n` consecutive rate-limit errors
    pub fn push_rate_limits(&self, n: usize) {
        for _ in 0..n {
            self.push_outcome(Err(ProviderError::RateLimited));
        }
    }

    /// Number of extract calls made so far
    pub fn extract_call_count(&self) -> usize {
        *self.extract_calls.lock().unwrap()
    }

    /// Number of count_tokens calls made so far
    pub fn count_call_count(&self) -> usize {
        *self.count_calls.lock().unwrap()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionProvider for MockProvider {
    async fn count_tokens(&self, content: &str) -> Result<usize, ProviderError> {
        *self.count_calls.lock().unwrap() += 1;
        // 1 token per 4 characters, never zero for non-empty content
        Ok((content.len() / MOCK_CHARS_PER_TOKEN).max(1))
    }

    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResponse, ProviderError> {
        *self.extract_calls.lock().unwrap() += 1;

        if let Some(outcome) = self.scripted.lock().unwrap().pop_front() {
            return outcome;
        }

        Ok(ExtractionResponse {
            rows: self.default_rows.clone(),
            tokens_used: (request.content.len() / MOCK_CHARS_PER_TOKEN).max(1),
            confidence: Some(0.9),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ExtractionRequest {
        ExtractionRequest {
            content: "Invoice #12345 from Acme Corp".to_string(),
            fields: Vec::new(),
            prompt: "Extract the fields".to_string(),
        }
    }

    #[tokio::test]
    async fn test_default_rows() {
        let provider = MockProvider::new();
        let response = provider.extract(&request()).await.unwrap();
        assert_eq!(response.rows.len(), 1);
        assert_eq!(response.rows[0]["value"], "mock");
    }

    #[tokio::test]
    async fn test_token_counting() {
        let provider = MockProvider::new();
        assert_eq!(provider.count_tokens("12345678").await.unwrap(), 2);
        // Non-empty content never counts as zero tokens
        assert_eq!(provider.count_tokens("ab").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_scripted_outcomes_fifo() {
        let provider = MockProvider::new();
        provider.push_rate_limits(2);

        assert!(matches!(
            provider.extract(&request()).await,
            Err(ProviderError::RateLimited)
        ));
        assert!(matches!(
            provider.extract(&request()).await,
            Err(ProviderError::RateLimited)
        ));
        assert!(provider.extract(&request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_call_counts_shared_across_clones() {
        let provider = MockProvider::new();
        let clone = provider.clone();

        provider.extract(&request()).await.unwrap();
        provider.count_tokens("abc").await.unwrap();

        assert_eq!(clone.extract_call_count(), 1);
        assert_eq!(clone.count_call_count(), 1);
    }
}
