//! Integration tests for the classification pipeline.
//!
//! Drives [`Classifier`] with a scripted provider to verify the tagged
//! provider/fallback branches, deterministic offline behavior, and the
//! ordering and concurrency bounds of batch classification.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use guardian_classifier::classifier::{
    ClassificationSource, Classifier, ClassifierConfig, DEFAULT_BATCH_SIZE,
};
use guardian_classifier::provider::{
    AnalyzeOptions, EmotionProvider, ProviderError, RawEmotionAnalysis,
};
use guardian_core::emotion::EmotionLabel;

// ---------------------------------------------------------------------------
// Scripted provider
// ---------------------------------------------------------------------------

type RespondFn = dyn Fn(&str) -> Result<RawEmotionAnalysis, ProviderError> + Send + Sync;

/// Test double with a programmable response and concurrency accounting.
struct ScriptedProvider {
    respond: Box<RespondFn>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    fn new(respond: impl Fn(&str) -> Result<RawEmotionAnalysis, ProviderError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    fn with_delay(
        delay: Duration,
        respond: impl Fn(&str) -> Result<RawEmotionAnalysis, ProviderError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl EmotionProvider for ScriptedProvider {
    async fn analyze(
        &self,
        text: &str,
        _options: &AnalyzeOptions,
    ) -> Result<RawEmotionAnalysis, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = (self.respond)(text);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn joyful_raw(therapeutic_value: f64) -> RawEmotionAnalysis {
    RawEmotionAnalysis {
        primary: "joy".to_string(),
        secondary: Some("hope".to_string()),
        confidence: 0.8,
        intensity: "medium".to_string(),
        therapeutic_value: Some(therapeutic_value),
        triggers: vec!["celebrate".to_string()],
    }
}

fn quick_config() -> ClassifierConfig {
    ClassifierConfig {
        provider_timeout: Duration::from_millis(50),
        ..ClassifierConfig::default()
    }
}

/// Capture tracing output (fallback downgrades log a warning) in test
/// runs instead of polluting stderr.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

// ---------------------------------------------------------------------------
// Test: provider path
// ---------------------------------------------------------------------------

/// A healthy provider response is validated, mapped, and tagged as
/// provider-sourced.
#[tokio::test]
async fn healthy_provider_response_is_used() {
    let provider = ScriptedProvider::new(|_| Ok(joyful_raw(60.0)));
    let classifier = Classifier::new(provider.clone());

    let result = classifier.classify("we celebrated all night").await;

    assert_eq!(result.source, ClassificationSource::Provider);
    assert_eq!(result.classification.primary, EmotionLabel::Joy);
    assert_eq!(result.classification.secondary, Some(EmotionLabel::Hope));
    assert_eq!(result.classification.therapeutic_value, 60);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Test: fallback routing
// ---------------------------------------------------------------------------

/// A provider error routes to the local analyzer and tags the result.
#[tokio::test]
async fn provider_error_falls_back_to_local_analyzer() {
    init_tracing();
    let provider = ScriptedProvider::new(|_| {
        Err(ProviderError::Api {
            status: 503,
            body: "overloaded".to_string(),
        })
    });
    let classifier = Classifier::new(provider);

    let result = classifier.classify("I am grateful and thankful").await;

    assert_eq!(result.source, ClassificationSource::Fallback);
    assert_eq!(result.classification.primary, EmotionLabel::Gratitude);
}

/// A malformed provider response is treated exactly like an outage.
#[tokio::test]
async fn malformed_provider_response_falls_back() {
    let provider = ScriptedProvider::new(|_| {
        let mut raw = joyful_raw(60.0);
        raw.primary = "euphoria".to_string();
        Ok(raw)
    });
    let classifier = Classifier::new(provider);

    let result = classifier.classify("I am grateful and thankful").await;

    assert_eq!(result.source, ClassificationSource::Fallback);
    assert_eq!(result.classification.primary, EmotionLabel::Gratitude);
}

/// A provider that exceeds the deadline routes to the fallback.
#[tokio::test]
async fn slow_provider_times_out_to_fallback() {
    let provider =
        ScriptedProvider::with_delay(Duration::from_millis(500), |_| Ok(joyful_raw(60.0)));
    let classifier = Classifier::with_config(provider, quick_config());

    let result = classifier.classify("I am grateful and thankful").await;

    assert_eq!(result.source, ClassificationSource::Fallback);
}

/// With the provider down, identical input yields identical output.
#[tokio::test]
async fn fallback_is_deterministic() {
    let provider = ScriptedProvider::new(|_| Err(ProviderError::Request("refused".to_string())));
    let classifier = Classifier::new(provider);

    let text = "I remember the funeral; grief and loss, but gratitude for the years";
    let first = classifier.classify(text).await;
    let second = classifier.classify(text).await;

    assert_eq!(first.source, ClassificationSource::Fallback);
    assert_eq!(first.classification.primary, second.classification.primary);
    assert_eq!(
        first.classification.intensity,
        second.classification.intensity
    );
    assert_eq!(
        first.classification.therapeutic_value,
        second.classification.therapeutic_value
    );
}

// ---------------------------------------------------------------------------
// Test: batch classification
// ---------------------------------------------------------------------------

/// Results come back in input order even though groups run concurrently.
#[tokio::test]
async fn batch_preserves_input_order() {
    // The scripted provider echoes the trailing index of each text back
    // through the therapeutic value, so order mixups are observable.
    let provider = ScriptedProvider::with_delay(Duration::from_millis(5), |text| {
        let index: f64 = text
            .rsplit(' ')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0.0);
        Ok(joyful_raw(index))
    });
    let classifier = Classifier::new(provider);

    let texts: Vec<String> = (0..25).map(|i| format!("capsule {i}")).collect();
    let results = classifier.batch_classify(&texts).await;

    assert_eq!(results.len(), 25);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(
            result.classification.therapeutic_value, i as u8,
            "result at position {i} came from the wrong input"
        );
    }
}

/// No more than one group's worth of provider calls is in flight at once.
#[tokio::test]
async fn batch_bounds_concurrent_provider_calls() {
    let provider =
        ScriptedProvider::with_delay(Duration::from_millis(20), |_| Ok(joyful_raw(50.0)));
    let classifier = Classifier::new(provider.clone());

    let texts: Vec<String> = (0..25).map(|i| format!("capsule {i}")).collect();
    let results = classifier.batch_classify(&texts).await;

    assert_eq!(results.len(), 25);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 25);
    assert!(
        provider.max_in_flight.load(Ordering::SeqCst) <= DEFAULT_BATCH_SIZE,
        "more than {DEFAULT_BATCH_SIZE} provider calls were in flight"
    );
}

/// Failures inside a batch fall back per item without disturbing others.
#[tokio::test]
async fn batch_mixes_provider_and_fallback_results() {
    let provider = ScriptedProvider::new(|text| {
        if text.ends_with('3') {
            Err(ProviderError::Request("refused".to_string()))
        } else {
            Ok(joyful_raw(50.0))
        }
    });
    let classifier = Classifier::new(provider);

    let texts: Vec<String> = (0..5).map(|i| format!("capsule {i}")).collect();
    let results = classifier.batch_classify(&texts).await;

    assert_eq!(results[3].source, ClassificationSource::Fallback);
    for (i, result) in results.iter().enumerate() {
        if i != 3 {
            assert_eq!(result.source, ClassificationSource::Provider);
        }
    }
}

/// An empty input produces an empty output without touching the provider.
#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let provider = ScriptedProvider::new(|_| Ok(joyful_raw(50.0)));
    let classifier = Classifier::new(provider.clone());

    let results = classifier.batch_classify(&[]).await;

    assert!(results.is_empty());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}
