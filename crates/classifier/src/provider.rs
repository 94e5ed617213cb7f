//! Emotion analysis provider capability.
//!
//! The provider is a black box: text in, raw classification out. Every
//! failure mode is represented in [`ProviderError`] and treated uniformly
//! by the classifier as "unavailable".

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Options forwarded with each analyze call.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeOptions {
    /// Ask the provider to score therapeutic value.
    pub include_therapeutic_value: bool,
    /// Ask the provider to report the substrings that drove the label.
    pub detect_triggers: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            include_therapeutic_value: true,
            detect_triggers: true,
        }
    }
}

/// Unvalidated classification as returned by a provider. Field values are
/// checked by the classifier before use; anything out of contract routes
/// to the local fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEmotionAnalysis {
    pub primary: String,
    #[serde(default)]
    pub secondary: Option<String>,
    pub confidence: f64,
    pub intensity: String,
    #[serde(default)]
    pub therapeutic_value: Option<f64>,
    #[serde(default)]
    pub triggers: Vec<String>,
}

/// Errors from the provider layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The request itself failed (network, DNS, TLS, etc.).
    #[error("Request failed: {0}")]
    Request(String),

    /// The provider returned a non-2xx status code.
    #[error("Provider error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The call exceeded the configured deadline.
    #[error("Request timed out")]
    Timeout,

    /// The response parsed but violated the classification contract.
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

/// Capability of an external emotion analysis provider.
#[async_trait]
pub trait EmotionProvider: Send + Sync {
    async fn analyze(
        &self,
        text: &str,
        options: &AnalyzeOptions,
    ) -> Result<RawEmotionAnalysis, ProviderError>;
}

#[async_trait]
impl<T: EmotionProvider + ?Sized> EmotionProvider for Arc<T> {
    async fn analyze(
        &self,
        text: &str,
        options: &AnalyzeOptions,
    ) -> Result<RawEmotionAnalysis, ProviderError> {
        (**self).analyze(text, options).await
    }
}
