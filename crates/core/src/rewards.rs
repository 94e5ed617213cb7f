//! Yield computation, tier feature gates, and tier recommendation.
//!
//! Yields are computed here and persisted by an external ledger writer.
//! The feature-gate table is a pure lookup that must stay in lockstep
//! with [`TierCatalog::builtin`]'s feature lists; a test below guards the
//! two against drifting apart.

use serde::{Deserialize, Serialize};

use crate::emotion::EmotionClassification;
use crate::error::CoreError;
use crate::tiers::{Tier, TierCatalog, TierId};
use crate::types::Gtt;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Flat GTT yield credited for a successful mint, before bonuses.
pub const BASE_MINT_YIELD: Gtt = 50.0;

/// Grief scores attached to capsules live in `[0, 10]`.
pub const GRIEF_SCORE_MIN: f64 = 0.0;
pub const GRIEF_SCORE_MAX: f64 = 10.0;

// ---------------------------------------------------------------------------
// Yield
// ---------------------------------------------------------------------------

/// Apply the tier's yield multiplier to a base amount.
pub fn yield_with_bonus(base_yield: Gtt, tier: &Tier) -> Gtt {
    base_yield * (1.0 + tier.yield_bonus)
}

/// Full yield for a classified submission: tier bonus applied to the
/// base, plus the emotional-resonance bonus (therapeutic value weighted
/// by classifier confidence, in GTT). Rounded to 2 decimals for the
/// ledger.
pub fn classified_yield(
    base_yield: Gtt,
    tier: &Tier,
    classification: &EmotionClassification,
) -> Gtt {
    let resonance = classification.therapeutic_value as f64 * classification.confidence;
    round2(yield_with_bonus(base_yield, tier) + resonance)
}

/// Validate a capsule grief score.
pub fn validate_grief_score(score: f64) -> Result<(), CoreError> {
    if !(GRIEF_SCORE_MIN..=GRIEF_SCORE_MAX).contains(&score) {
        return Err(CoreError::Validation(format!(
            "Grief score must be between {GRIEF_SCORE_MIN} and {GRIEF_SCORE_MAX}, got {score}"
        )));
    }
    Ok(())
}

fn round2(value: Gtt) -> Gtt {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Feature gates
// ---------------------------------------------------------------------------

/// Analytics surface available to a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsAccess {
    None,
    Basic,
    Advanced,
    Full,
}

/// Support channel granted to a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportLevel {
    Community,
    Email,
    Priority,
    Dedicated,
}

/// Capability gates for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRestrictions {
    pub analytics: AnalyticsAccess,
    pub marketplace_access: bool,
    pub api_access: bool,
    pub custom_branding: bool,
    pub support: SupportLevel,
}

/// Fixed feature-gate table per tier. A pure lookup; the source of truth
/// shared with the catalog's feature lists.
pub fn tier_restrictions(tier_id: TierId) -> TierRestrictions {
    match tier_id {
        TierId::Explorer => TierRestrictions {
            analytics: AnalyticsAccess::None,
            marketplace_access: false,
            api_access: false,
            custom_branding: false,
            support: SupportLevel::Community,
        },
        TierId::Seeker => TierRestrictions {
            analytics: AnalyticsAccess::Basic,
            marketplace_access: false,
            api_access: false,
            custom_branding: false,
            support: SupportLevel::Email,
        },
        TierId::Creator => TierRestrictions {
            analytics: AnalyticsAccess::Advanced,
            marketplace_access: true,
            api_access: false,
            custom_branding: false,
            support: SupportLevel::Priority,
        },
        TierId::Sovereign => TierRestrictions {
            analytics: AnalyticsAccess::Full,
            marketplace_access: true,
            api_access: true,
            custom_branding: true,
            support: SupportLevel::Dedicated,
        },
    }
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

/// Cheapest tier that satisfies the projected per-period usage without
/// being cheaper than the user's current tier. Falls back to the current
/// tier when nothing in the catalog qualifies.
pub fn recommended_tier<'a>(
    catalog: &'a TierCatalog,
    current: TierId,
    projected_usage: u32,
) -> &'a Tier {
    let current = catalog.tier_by_id(current);
    catalog
        .all()
        .iter()
        .find(|t| {
            t.capsule_limit >= projected_usage
                && t.price_usd_monthly >= current.price_usd_monthly
        })
        .unwrap_or(current)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
