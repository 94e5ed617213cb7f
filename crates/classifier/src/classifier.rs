//! Two-stage classification pipeline: provider first, deterministic local
//! analyzer on any failure.
//!
//! The fallback is not exception plumbing; [`Classified::source`] tags
//! which path produced each result, and the fallback branch always runs
//! the same pure function from `guardian-core`, so offline behavior is a
//! first-class, testable case.

use std::time::Duration;

use serde::Serialize;

use guardian_core::emotion::{self, AnalyzerConfig, EmotionClassification, EmotionLabel, Intensity};

use crate::provider::{AnalyzeOptions, EmotionProvider, ProviderError, RawEmotionAnalysis};

/// Texts per concurrent group in [`Classifier::batch_classify`]. Bounds
/// simultaneous outbound provider calls.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Cap on reported trigger substrings, shared with the local analyzer.
const MAX_TRIGGERS: usize = 5;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Classifier tuning. Defaults are the production values.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Concurrent provider calls per batch group.
    pub batch_size: usize,
    /// Deadline for a single provider call, enforced here regardless of
    /// the provider implementation's own timeout handling.
    pub provider_timeout: Duration,
    /// Scoring constants for the local fallback analyzer.
    pub analyzer: AnalyzerConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            provider_timeout: Duration::from_secs(10),
            analyzer: AnalyzerConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Result tagging
// ---------------------------------------------------------------------------

/// Which path produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Provider,
    Fallback,
}

/// A classification plus the path that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Classified {
    pub classification: EmotionClassification,
    pub source: ClassificationSource,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Emotion classifier over a provider capability.
pub struct Classifier<P> {
    provider: P,
    config: ClassifierConfig,
}

impl<P: EmotionProvider> Classifier<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, ClassifierConfig::default())
    }

    pub fn with_config(provider: P, config: ClassifierConfig) -> Self {
        Self { provider, config }
    }

    /// Classify one text. Infallible: any provider failure resolves to
    /// the deterministic local analyzer.
    pub async fn classify(&self, text: &str) -> Classified {
        match self.provider_classify(text).await {
            Ok(classification) => Classified {
                classification,
                source: ClassificationSource::Provider,
            },
            Err(error) => {
                tracing::warn!(%error, "emotion provider unavailable, using local analyzer");
                Classified {
                    classification: emotion::analyze(text, &self.config.analyzer),
                    source: ClassificationSource::Fallback,
                }
            }
        }
    }

    /// Classify many texts, preserving input order in the output.
    ///
    /// Inputs are processed in groups of `batch_size`: concurrent within
    /// a group, sequential across groups, so at most `batch_size`
    /// provider calls are in flight at once.
    pub async fn batch_classify(&self, texts: &[String]) -> Vec<Classified> {
        let group_size = self.config.batch_size.max(1);
        let mut results = Vec::with_capacity(texts.len());
        for group in texts.chunks(group_size) {
            tracing::debug!(group_len = group.len(), "classifying batch group");
            let group_results =
                futures::future::join_all(group.iter().map(|text| self.classify(text))).await;
            results.extend(group_results);
        }
        results
    }

    async fn provider_classify(&self, text: &str) -> Result<EmotionClassification, ProviderError> {
        let options = AnalyzeOptions::default();
        let raw = tokio::time::timeout(
            self.config.provider_timeout,
            self.provider.analyze(text, &options),
        )
        .await
        .map_err(|_| ProviderError::Timeout)??;
        validate_raw(raw)
    }
}

// ---------------------------------------------------------------------------
// Raw response validation
// ---------------------------------------------------------------------------

/// Check a raw provider response against the classification contract.
/// Out-of-contract values are malformed, which routes the call to the
/// fallback; a secondary equal to the primary is dropped rather than
/// rejected, and triggers beyond the cap are truncated.
fn validate_raw(raw: RawEmotionAnalysis) -> Result<EmotionClassification, ProviderError> {
    let primary = EmotionLabel::parse(&raw.primary)
        .map_err(|e| ProviderError::Malformed(e.to_string()))?;

    let secondary = match raw.secondary.as_deref() {
        Some(s) => {
            let label =
                EmotionLabel::parse(s).map_err(|e| ProviderError::Malformed(e.to_string()))?;
            (label != primary).then_some(label)
        }
        None => None,
    };

    if !(0.0..=1.0).contains(&raw.confidence) {
        return Err(ProviderError::Malformed(format!(
            "confidence {} outside [0, 1]",
            raw.confidence
        )));
    }

    let intensity =
        Intensity::parse(&raw.intensity).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    let therapeutic_value = match raw.therapeutic_value {
        Some(v) if (0.0..=100.0).contains(&v) => v.round() as u8,
        Some(v) => {
            return Err(ProviderError::Malformed(format!(
                "therapeutic value {v} outside [0, 100]"
            )))
        }
        None => {
            return Err(ProviderError::Malformed(
                "therapeutic value missing from response".to_string(),
            ))
        }
    };

    let mut triggers = raw.triggers;
    triggers.truncate(MAX_TRIGGERS);

    Ok(EmotionClassification {
        primary,
        secondary,
        confidence: raw.confidence,
        intensity,
        therapeutic_value,
        triggers,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
