//! HTTP Extraction Provider
//!
//! JSON-over-HTTP implementation of [`ExtractionProvider`] for hosted
//! extraction APIs.
//!
//! Unlike a generic HTTP client, this provider performs no internal
//! retries: a 429 surfaces as [`ProviderError::RateLimited`] so the
//! engine's rate limiter owns the backoff policy.

use async_trait::async_trait;
use docflow_domain::{
    ExtractionProvider, ExtractionRequest, ExtractionResponse, FieldSpec, ProviderError,
    ResultRow,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout for provider requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// JSON-over-HTTP extraction provider
///
/// Expects two endpoints under the configured base URL:
/// `POST /v1/count_tokens` and `POST /v1/extract`.
pub struct HttpProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct CountTokensRequest<'a> {
    model: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CountTokensResponse {
    tokens: usize,
}

#[derive(Serialize)]
struct ExtractBody<'a> {
    model: &'a str,
    content: &'a str,
    fields: &'a [FieldSpec],
    prompt: &'a str,
}

#[derive(Deserialize)]
struct ExtractReply {
    rows: Vec<ResultRow>,
    tokens_used: usize,
    confidence: Option<f64>,
}

impl HttpProvider {
    /// Create a new provider against the given base URL and model
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider with a custom request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            client,
        }
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.endpoint, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Http(format!("HTTP {}: {}", status, text)));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl ExtractionProvider for HttpProvider {
    async fn count_tokens(&self, content: &str) -> Result<usize, ProviderError> {
        let body = CountTokensRequest {
            model: &self.model,
            content,
        };
        let reply: CountTokensResponse = self.post_json("/v1/count_tokens", &body).await?;
        Ok(reply.tokens)
    }

    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResponse, ProviderError> {
        let body = ExtractBody {
            model: &self.model,
            content: &request.content,
            fields: &request.fields,
            prompt: &request.prompt,
        };
        let reply: ExtractReply = self.post_json("/v1/extract", &body).await?;

        if reply.rows.is_empty() && reply.tokens_used == 0 {
            return Err(ProviderError::InvalidResponse(
                "empty reply with zero token usage".to_string(),
            ));
        }

        Ok(ExtractionResponse {
            rows: reply.rows,
            tokens_used: reply.tokens_used,
            confidence: reply.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = HttpProvider::new("http://localhost:8080", "extractor-v1");
        assert_eq!(provider.endpoint, "http://localhost:8080");
        assert_eq!(provider.model, "extractor-v1");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_maps_to_http_error() {
        let provider = HttpProvider::with_timeout(
            "http://127.0.0.1:1",
            "extractor-v1",
            Duration::from_millis(200),
        );

        let result = provider.count_tokens("test").await;
        assert!(matches!(result, Err(ProviderError::Http(_))));
    }
}
