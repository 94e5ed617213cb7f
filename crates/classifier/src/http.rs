//! HTTP client for an emotion analysis service.
//!
//! Wraps the provider's REST endpoint using [`reqwest`]. Every transport
//! or protocol failure maps onto [`ProviderError`], which the classifier
//! resolves via the local fallback.

use std::time::Duration;

use async_trait::async_trait;

use crate::provider::{AnalyzeOptions, EmotionProvider, ProviderError, RawEmotionAnalysis};

/// Default per-request deadline for the provider call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP provider client for a single analysis service instance.
pub struct HttpEmotionProvider {
    client: reqwest::Client,
    api_url: String,
    request_timeout: Duration,
}

impl HttpEmotionProvider {
    /// Create a new provider client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8480`.
    pub fn new(api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Create a provider client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across services).
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self {
            client,
            api_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request deadline.
    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Base HTTP API URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or a [`ProviderError::Api`] containing the
    /// status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    fn map_transport_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Request(e.to_string())
        }
    }
}

#[async_trait]
impl EmotionProvider for HttpEmotionProvider {
    /// Submit text for emotion analysis.
    ///
    /// Sends a `POST /v1/classify/emotion` request with the text and
    /// options, and deserializes the raw classification from the body.
    async fn analyze(
        &self,
        text: &str,
        options: &AnalyzeOptions,
    ) -> Result<RawEmotionAnalysis, ProviderError> {
        let body = serde_json::json!({
            "text": text,
            "options": options,
        });

        let response = self
            .client
            .post(format!("{}/v1/classify/emotion", self.api_url))
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let response = Self::ensure_success(response).await?;

        response
            .json::<RawEmotionAnalysis>()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}
