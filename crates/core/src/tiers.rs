//! Subscription tier catalog: identifiers, per-tier limits, and ordered
//! lookup.
//!
//! The catalog is an explicitly constructed value passed by reference to
//! every consumer. It is loaded once at process start and never mutated;
//! alternate catalogs (e.g. a two-tier test catalog) are first-class.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Tier identifier
// ---------------------------------------------------------------------------

pub const TIER_EXPLORER: &str = "EXPLORER";
pub const TIER_SEEKER: &str = "SEEKER";
pub const TIER_CREATOR: &str = "CREATOR";
pub const TIER_SOVEREIGN: &str = "SOVEREIGN";

/// All valid tier slugs, in catalog order.
pub const VALID_TIER_IDS: &[&str] = &[TIER_EXPLORER, TIER_SEEKER, TIER_CREATOR, TIER_SOVEREIGN];

/// Closed set of subscription tier identifiers.
///
/// External string ids are converted exactly once, at the boundary, via
/// [`TierId::parse`]. Past that point an unknown tier is unrepresentable;
/// a catalog that does not *contain* a given id is handled separately by
/// the fail-closed lookup in [`TierCatalog::tier_by_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TierId {
    Explorer,
    Seeker,
    Creator,
    Sovereign,
}

impl TierId {
    /// Parse an external tier slug. Case-insensitive, surrounding
    /// whitespace ignored.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_uppercase().as_str() {
            TIER_EXPLORER => Ok(Self::Explorer),
            TIER_SEEKER => Ok(Self::Seeker),
            TIER_CREATOR => Ok(Self::Creator),
            TIER_SOVEREIGN => Ok(Self::Sovereign),
            _ => Err(CoreError::UnknownTier(format!(
                "'{s}'. Must be one of: {}",
                VALID_TIER_IDS.join(", ")
            ))),
        }
    }

    /// The external slug for this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explorer => TIER_EXPLORER,
            Self::Seeker => TIER_SEEKER,
            Self::Creator => TIER_CREATOR,
            Self::Sovereign => TIER_SOVEREIGN,
        }
    }
}

// ---------------------------------------------------------------------------
// Tier record
// ---------------------------------------------------------------------------

/// One subscription tier: price, quota, yield multiplier, and feature
/// flags. `color` and `badge` are presentation hints carried through to
/// clients; core logic never reads them.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Tier {
    pub id: TierId,
    pub name: String,
    #[validate(range(min = 0.0))]
    pub price_usd_monthly: f64,
    #[validate(range(min = 0.0))]
    pub price_usd_yearly: f64,
    /// Capsule mints allowed per billing period.
    pub capsule_limit: u32,
    /// Fractional yield multiplier: 0.25 means +25% on every yield credit.
    #[validate(range(min = 0.0))]
    pub yield_bonus: f64,
    pub storage_gb: u32,
    pub verification_votes: u32,
    pub features: Vec<String>,
    pub color: String,
    pub badge: String,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable, ordered tier catalog.
///
/// Order is ascending monthly price with catalog position breaking ties;
/// the constructor rejects anything else, so upgrade/downgrade checks and
/// recommendation logic can rely on it.
#[derive(Debug, Clone, Serialize)]
pub struct TierCatalog {
    tiers: Vec<Tier>,
}

impl TierCatalog {
    /// Build a catalog from an ordered tier list.
    ///
    /// Rules:
    /// - Must not be empty.
    /// - Tier ids must be unique.
    /// - Monthly prices must be non-decreasing in list order.
    /// - Each row must pass field validation (non-negative prices/bonus).
    pub fn new(tiers: Vec<Tier>) -> Result<Self, CoreError> {
        if tiers.is_empty() {
            return Err(CoreError::Validation(
                "Tier catalog must contain at least one tier".to_string(),
            ));
        }
        for tier in &tiers {
            tier.validate()
                .map_err(|e| CoreError::Validation(format!("Tier {}: {e}", tier.id.as_str())))?;
        }
        for pair in tiers.windows(2) {
            if pair[1].price_usd_monthly < pair[0].price_usd_monthly {
                return Err(CoreError::Validation(format!(
                    "Tier {} is priced below its predecessor {}",
                    pair[1].id.as_str(),
                    pair[0].id.as_str()
                )));
            }
        }
        for (i, tier) in tiers.iter().enumerate() {
            if tiers[..i].iter().any(|t| t.id == tier.id) {
                return Err(CoreError::Validation(format!(
                    "Duplicate tier id {}",
                    tier.id.as_str()
                )));
            }
        }

        tracing::debug!(tier_count = tiers.len(), "tier catalog constructed");
        Ok(Self { tiers })
    }

    /// All tiers in catalog order (ascending price).
    pub fn all(&self) -> &[Tier] {
        &self.tiers
    }

    /// The lowest-priced tier. The constructor rejects an empty catalog.
    pub fn lowest(&self) -> &Tier {
        &self.tiers[0]
    }

    /// The highest-priced tier.
    pub fn highest(&self) -> &Tier {
        &self.tiers[self.tiers.len() - 1]
    }

    /// Exact lookup, `None` when the catalog does not carry the id.
    pub fn get(&self, id: TierId) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.id == id)
    }

    /// Fail-closed lookup: returns the lowest-priced tier when `id` is not
    /// in this catalog (e.g. a retired tier still referenced by a user
    /// record). Never fails.
    pub fn tier_by_id(&self, id: TierId) -> &Tier {
        self.get(id).unwrap_or_else(|| self.lowest())
    }

    /// Whether this catalog carries the given id.
    pub fn is_valid_tier(&self, id: TierId) -> bool {
        self.get(id).is_some()
    }

    /// The tier immediately above `id` in price order, or `None` when `id`
    /// resolves to the highest tier. Unknown ids resolve fail-closed first.
    pub fn next_tier(&self, id: TierId) -> Option<&Tier> {
        let resolved = self.tier_by_id(id).id;
        let pos = self.tiers.iter().position(|t| t.id == resolved)?;
        self.tiers.get(pos + 1)
    }

    /// The production catalog, mirroring the platform's subscription plan
    /// table.
    pub fn builtin() -> Self {
        let tiers = vec![
            Tier {
                id: TierId::Explorer,
                name: "Explorer".to_string(),
                price_usd_monthly: 0.0,
                price_usd_yearly: 0.0,
                capsule_limit: 5,
                yield_bonus: 0.0,
                storage_gb: 1,
                verification_votes: 5,
                features: vec![
                    "5 capsule mints per month".to_string(),
                    "Basic verification access".to_string(),
                    "Community support".to_string(),
                    "Standard yield rate".to_string(),
                ],
                color: "#94A3B8".to_string(),
                badge: "compass".to_string(),
            },
            Tier {
                id: TierId::Seeker,
                name: "Seeker".to_string(),
                price_usd_monthly: 9.0,
                price_usd_yearly: 90.0,
                capsule_limit: 25,
                yield_bonus: 0.05,
                storage_gb: 5,
                verification_votes: 25,
                features: vec![
                    "25 capsule mints per month".to_string(),
                    "5% yield bonus".to_string(),
                    "Priority verification queue".to_string(),
                    "Basic analytics dashboard".to_string(),
                    "Email support".to_string(),
                ],
                color: "#60A5FA".to_string(),
                badge: "star".to_string(),
            },
            Tier {
                id: TierId::Creator,
                name: "Creator".to_string(),
                price_usd_monthly: 29.0,
                price_usd_yearly: 290.0,
                capsule_limit: 100,
                yield_bonus: 0.10,
                storage_gb: 25,
                verification_votes: 100,
                features: vec![
                    "100 capsule mints per month".to_string(),
                    "10% yield bonus".to_string(),
                    "Advanced analytics".to_string(),
                    "Custom verification seals".to_string(),
                    "Priority support".to_string(),
                    "Creator marketplace access".to_string(),
                ],
                color: "#A78BFA".to_string(),
                badge: "zap".to_string(),
            },
            Tier {
                id: TierId::Sovereign,
                name: "Sovereign".to_string(),
                price_usd_monthly: 99.0,
                price_usd_yearly: 990.0,
                capsule_limit: 500,
                yield_bonus: 0.25,
                storage_gb: 100,
                verification_votes: 500,
                features: vec![
                    "500 capsule mints per month".to_string(),
                    "25% yield bonus".to_string(),
                    "Full analytics suite".to_string(),
                    "Custom branding options".to_string(),
                    "Dedicated support".to_string(),
                    "Early feature access".to_string(),
                    "API access".to_string(),
                    "Bulk operations".to_string(),
                ],
                color: "#FBBF24".to_string(),
                badge: "crown".to_string(),
            },
        ];
        // The builtin table is well-formed by construction.
        Self { tiers }
    }

    /// Load a catalog from a JSON document (an array of tier rows), applying
    /// the same validation as [`TierCatalog::new`].
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let tiers: Vec<Tier> = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Malformed tier catalog JSON: {e}")))?;
        Self::new(tiers)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
