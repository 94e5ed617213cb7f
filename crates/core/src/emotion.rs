//! Emotion classification types and the deterministic local analyzer.
//!
//! The analyzer is a fixed keyword/pattern matcher over a closed label
//! set. It backs the classifier's fallback path and must behave
//! identically whether or not the AI provider is reachable, so the whole
//! pipeline stays testable offline. Scoring constants live in
//! [`AnalyzerConfig`]; the pattern and base-value tables are fixed.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Closed set of emotion labels.
///
/// Declaration order is the tie-break order: when two labels score
/// equally, the earlier one wins. `Neutral` is the all-zero default and
/// has no patterns of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Grief,
    Joy,
    Nostalgia,
    Hope,
    Fear,
    Anger,
    Love,
    Gratitude,
    Neutral,
}

impl EmotionLabel {
    /// All labels in tie-break order.
    pub const ALL: [EmotionLabel; 9] = [
        Self::Grief,
        Self::Joy,
        Self::Nostalgia,
        Self::Hope,
        Self::Fear,
        Self::Anger,
        Self::Love,
        Self::Gratitude,
        Self::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grief => "grief",
            Self::Joy => "joy",
            Self::Nostalgia => "nostalgia",
            Self::Hope => "hope",
            Self::Fear => "fear",
            Self::Anger => "anger",
            Self::Love => "love",
            Self::Gratitude => "gratitude",
            Self::Neutral => "neutral",
        }
    }

    /// Parse an external label string (lowercase, as serialized).
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == needle)
            .ok_or_else(|| CoreError::Validation(format!("Unknown emotion label '{s}'")))
    }

    /// Per-label base therapeutic value, before intensity and length
    /// adjustments.
    pub fn base_therapeutic_value(&self) -> i32 {
        match self {
            Self::Grief => 70,
            Self::Joy => 60,
            Self::Nostalgia => 65,
            Self::Hope => 75,
            Self::Fear => 40,
            Self::Anger => 35,
            Self::Love => 75,
            Self::Gratitude => 80,
            Self::Neutral => 25,
        }
    }
}

/// Emotional intensity bucket, derived from match density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(CoreError::Validation(format!("Unknown intensity '{s}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification result
// ---------------------------------------------------------------------------

/// Ephemeral classification of one piece of submitted text. Produced
/// fresh per call; persistence is an external collaborator's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionClassification {
    pub primary: EmotionLabel,
    /// Runner-up label, always distinct from `primary`.
    pub secondary: Option<EmotionLabel>,
    /// In `[0, 1]`. The local analyzer bounds this to `[0.3, 0.9]`.
    pub confidence: f64,
    pub intensity: Intensity,
    /// In `[0, 100]`.
    pub therapeutic_value: u8,
    /// Matched substrings that drove the primary label, at most
    /// [`AnalyzerConfig::max_triggers`].
    pub triggers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Analyzer configuration
// ---------------------------------------------------------------------------

/// Named scoring constants for the local analyzer. Defaults are the
/// production values; tests and deployments may inject alternates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Confidence contributed per pattern match on the primary label.
    pub confidence_per_match: f64,
    /// Confidence with zero matches; the fallback never claims less.
    pub confidence_floor: f64,
    /// The fallback never claims more than this.
    pub confidence_ceiling: f64,
    /// Match density (matches per word) above which intensity is High.
    pub high_density: f64,
    /// Match density above which intensity is Medium.
    pub medium_density: f64,
    pub high_intensity_adjust: i32,
    pub medium_intensity_adjust: i32,
    pub low_intensity_adjust: i32,
    /// Character count above which content earns `long_content_adjust`.
    pub long_content_chars: usize,
    /// Character count below which content earns `short_content_adjust`.
    pub short_content_chars: usize,
    pub long_content_adjust: i32,
    pub short_content_adjust: i32,
    /// Cap on reported trigger substrings.
    pub max_triggers: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            confidence_per_match: 0.2,
            confidence_floor: 0.3,
            confidence_ceiling: 0.9,
            high_density: 0.1,
            medium_density: 0.05,
            high_intensity_adjust: 10,
            medium_intensity_adjust: 5,
            low_intensity_adjust: -5,
            long_content_chars: 1000,
            short_content_chars: 100,
            long_content_adjust: 5,
            short_content_adjust: -10,
            max_triggers: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Pattern table
// ---------------------------------------------------------------------------

/// Keyword patterns per label, compiled once. Order matches
/// [`EmotionLabel::ALL`]; `Neutral` carries no patterns.
static EMOTION_PATTERNS: LazyLock<Vec<(EmotionLabel, Vec<Regex>)>> = LazyLock::new(|| {
    fn compile(words: &[&str]) -> Vec<Regex> {
        words
            .iter()
            .map(|w| Regex::new(&format!(r"(?i)\b(?:{w})\b")).expect("valid emotion pattern"))
            .collect()
    }
    vec![
        (
            EmotionLabel::Grief,
            compile(&[
                "grie(?:f|ve|ving)",
                "mourn(?:ing)?",
                "loss",
                "passed away",
                "funeral",
                "heartbroken",
            ]),
        ),
        (
            EmotionLabel::Joy,
            compile(&[
                "joy(?:ful)?",
                "happ(?:y|iness)",
                "delight(?:ed)?",
                "celebrat(?:e|ed|ion)",
                "laugh(?:ed|ing|ter)?",
            ]),
        ),
        (
            EmotionLabel::Nostalgia,
            compile(&[
                "remember",
                "memor(?:y|ies)",
                "childhood",
                "back then",
                "those days",
                "used to",
            ]),
        ),
        (
            EmotionLabel::Hope,
            compile(&[
                "hope(?:ful)?",
                "dream(?:s)?",
                "someday",
                "future",
                "believe",
            ]),
        ),
        (
            EmotionLabel::Fear,
            compile(&[
                "afraid",
                "fear(?:ful)?",
                "scared",
                "terrif(?:ied|ying)",
                "anxi(?:ous|ety)",
                "worr(?:y|ied)",
            ]),
        ),
        (
            EmotionLabel::Anger,
            compile(&[
                "anger",
                "angry",
                "furious",
                "rage",
                "betray(?:ed|al)",
                "outrage(?:d)?",
            ]),
        ),
        (
            EmotionLabel::Love,
            compile(&["love(?:d)?", "adore", "cherish(?:ed)?", "devotion", "darling"]),
        ),
        (
            EmotionLabel::Gratitude,
            compile(&[
                "grateful",
                "gratitude",
                "thankful",
                "thank you",
                "blessed",
                "appreciate(?:d)?",
            ]),
        ),
    ]
});

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Deterministically classify `text` with the local pattern matcher.
///
/// Score per label = count of matched occurrences across its patterns.
/// Primary is the highest score (earlier label wins ties, `Neutral` when
/// all are zero); secondary is the displaced running primary when a
/// strictly higher-scoring label appears later in the scan. Intensity,
/// confidence, and therapeutic value derive from the primary label's
/// match count per the config.
pub fn analyze(text: &str, config: &AnalyzerConfig) -> EmotionClassification {
    let word_count = text.split_whitespace().count().max(1);

    let mut primary = EmotionLabel::Neutral;
    let mut secondary = None;
    let mut best_score = 0usize;
    let mut best_matches: Vec<String> = Vec::new();

    for (label, patterns) in EMOTION_PATTERNS.iter() {
        let mut score = 0usize;
        let mut matches: Vec<String> = Vec::new();
        for pattern in patterns {
            for found in pattern.find_iter(text) {
                score += 1;
                matches.push(found.as_str().to_string());
            }
        }
        if score > best_score {
            if best_score > 0 {
                secondary = Some(primary);
            }
            primary = *label;
            best_score = score;
            best_matches = matches;
        }
    }

    let mut triggers: Vec<String> = Vec::new();
    for m in best_matches {
        if !triggers.iter().any(|t| t.eq_ignore_ascii_case(&m)) {
            triggers.push(m);
        }
    }
    triggers.truncate(config.max_triggers);

    let density = best_score as f64 / word_count as f64;
    let intensity = if density > config.high_density {
        Intensity::High
    } else if density > config.medium_density {
        Intensity::Medium
    } else {
        Intensity::Low
    };

    let confidence = (best_score as f64 * config.confidence_per_match + config.confidence_floor)
        .min(config.confidence_ceiling);

    let mut therapeutic = primary.base_therapeutic_value()
        + match intensity {
            Intensity::High => config.high_intensity_adjust,
            Intensity::Medium => config.medium_intensity_adjust,
            Intensity::Low => config.low_intensity_adjust,
        };
    let char_count = text.chars().count();
    if char_count > config.long_content_chars {
        therapeutic += config.long_content_adjust;
    }
    if char_count < config.short_content_chars {
        therapeutic += config.short_content_adjust;
    }

    EmotionClassification {
        primary,
        secondary,
        confidence,
        intensity,
        therapeutic_value: therapeutic.clamp(0, 100) as u8,
        triggers,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
