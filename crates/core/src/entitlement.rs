//! Per-user entitlement and quota checks.
//!
//! Every function here is a total, side-effect-free computation over an
//! immutable [`UserEntitlementState`] snapshot and an injected
//! [`TierCatalog`]. Nothing mutates the snapshot and nothing reads the
//! wall clock; callers pass `today` in, and the check-then-increment pair
//! around a successful mint is the caller's transaction to manage.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::tiers::{TierCatalog, TierId};
use crate::types::{Gtt, UserId};

// ---------------------------------------------------------------------------
// Subscription status
// ---------------------------------------------------------------------------

/// Billing status as written by the subscription webhook. The engine only
/// reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    PastDue,
    Trialing,
}

impl SubscriptionStatus {
    /// Whether a paid tier's entitlements are currently usable.
    pub fn in_good_standing(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

// ---------------------------------------------------------------------------
// User snapshot
// ---------------------------------------------------------------------------

/// Per-user entitlement record, read as a snapshot.
///
/// Created at signup on the lowest-priced tier; mutated only by the
/// caller (mint commits) and the billing webhook (tier/status changes),
/// never by this module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntitlementState {
    pub user_id: UserId,
    pub tier_id: TierId,
    pub mints_this_period: u32,
    pub period_start: NaiveDate,
    pub gtt_balance: Gtt,
    pub total_yield_earned: Gtt,
    pub subscription_status: SubscriptionStatus,
}

impl UserEntitlementState {
    /// Fresh signup state: lowest-priced tier, zero counters, active.
    pub fn signup(user_id: UserId, catalog: &TierCatalog, today: NaiveDate) -> Self {
        Self {
            user_id,
            tier_id: catalog.lowest().id,
            mints_this_period: 0,
            period_start: today,
            gtt_balance: 0.0,
            total_yield_earned: 0.0,
            subscription_status: SubscriptionStatus::Active,
        }
    }
}

// ---------------------------------------------------------------------------
// Standing
// ---------------------------------------------------------------------------

/// Derived account standing at check time. `QuotaExceeded` is computed,
/// never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStanding {
    Active,
    /// Paid tier whose subscription has lapsed; quota checks always fail.
    Restricted,
    QuotaExceeded,
}

/// Compute the user's standing from the snapshot.
pub fn standing(catalog: &TierCatalog, user: &UserEntitlementState) -> AccountStanding {
    let tier = catalog.tier_by_id(user.tier_id);
    if tier.price_usd_monthly > 0.0 && !user.subscription_status.in_good_standing() {
        return AccountStanding::Restricted;
    }
    if user.mints_this_period >= tier.capsule_limit {
        return AccountStanding::QuotaExceeded;
    }
    AccountStanding::Active
}

// ---------------------------------------------------------------------------
// Quota checks
// ---------------------------------------------------------------------------

/// Whether the user may mint right now.
pub fn can_mint(catalog: &TierCatalog, user: &UserEntitlementState) -> bool {
    standing(catalog, user) == AccountStanding::Active
}

/// Mints left in the current period, floored at zero.
pub fn remaining_mints(catalog: &TierCatalog, user: &UserEntitlementState) -> u32 {
    let tier = catalog.tier_by_id(user.tier_id);
    tier.capsule_limit.saturating_sub(user.mints_this_period)
}

/// The date this user's quota period rolls over: one calendar month after
/// `period_start` (clamped at short month ends).
pub fn reset_date(user: &UserEntitlementState) -> NaiveDate {
    // checked_add_months only fails at the end of the representable
    // calendar, which no real period_start reaches.
    user.period_start
        .checked_add_months(Months::new(1))
        .unwrap_or(user.period_start)
}

/// Whole days until the quota period resets, floored at zero.
pub fn days_until_reset(user: &UserEntitlementState, today: NaiveDate) -> i64 {
    (reset_date(user) - today).num_days().max(0)
}

/// Quota consumption as a percentage, capped at 100. A zero-limit tier
/// reports zero.
pub fn mint_usage_percentage(catalog: &TierCatalog, user: &UserEntitlementState) -> f64 {
    let tier = catalog.tier_by_id(user.tier_id);
    if tier.capsule_limit == 0 {
        return 0.0;
    }
    (user.mints_this_period as f64 / tier.capsule_limit as f64 * 100.0).min(100.0)
}

/// Donating `amount` unused mints is allowed only while it cannot drive
/// remaining capacity negative.
pub fn can_donate(catalog: &TierCatalog, user: &UserEntitlementState, amount: u32) -> bool {
    remaining_mints(catalog, user) >= amount
}

// ---------------------------------------------------------------------------
// Upgrade signals
// ---------------------------------------------------------------------------

/// Usage thresholds driving the upgrade prompts, as percentages.
///
/// The constructor enforces `low <= medium <= high`, which is what keeps
/// [`upgrade_urgency`] monotonic in usage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct UrgencyThresholds {
    pub low_pct: f64,
    pub medium_pct: f64,
    pub high_pct: f64,
}

impl Default for UrgencyThresholds {
    fn default() -> Self {
        Self {
            low_pct: 60.0,
            medium_pct: 80.0,
            high_pct: 100.0,
        }
    }
}

impl UrgencyThresholds {
    pub fn new(low_pct: f64, medium_pct: f64, high_pct: f64) -> Result<Self, CoreError> {
        if low_pct < 0.0 || !(low_pct <= medium_pct && medium_pct <= high_pct) {
            return Err(CoreError::Validation(format!(
                "Urgency thresholds must satisfy 0 <= low <= medium <= high, \
                 got {low_pct}/{medium_pct}/{high_pct}"
            )));
        }
        Ok(Self {
            low_pct,
            medium_pct,
            high_pct,
        })
    }
}

/// How urgently the user should consider an upgrade. Ordered so that
/// higher usage never maps to a lower variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeUrgency {
    None,
    Low,
    Medium,
    High,
}

/// Urgency of an upgrade prompt. Always `None` on the highest tier.
pub fn upgrade_urgency(
    catalog: &TierCatalog,
    user: &UserEntitlementState,
    thresholds: &UrgencyThresholds,
) -> UpgradeUrgency {
    let tier = catalog.tier_by_id(user.tier_id);
    if tier.id == catalog.highest().id {
        return UpgradeUrgency::None;
    }
    let usage = mint_usage_percentage(catalog, user);
    if usage >= thresholds.high_pct {
        UpgradeUrgency::High
    } else if usage >= thresholds.medium_pct {
        UpgradeUrgency::Medium
    } else if usage >= thresholds.low_pct {
        UpgradeUrgency::Low
    } else {
        UpgradeUrgency::None
    }
}

/// UX hint: prompt an upgrade when a lowest-tier user passes the medium
/// threshold, or anyone hits full usage. Not an enforcement gate.
pub fn should_prompt_upgrade(
    catalog: &TierCatalog,
    user: &UserEntitlementState,
    thresholds: &UrgencyThresholds,
) -> bool {
    let usage = mint_usage_percentage(catalog, user);
    let on_lowest = catalog.tier_by_id(user.tier_id).id == catalog.lowest().id;
    (on_lowest && usage > thresholds.medium_pct) || usage >= thresholds.high_pct
}

/// Whether the upgrade path accepts a move from `current` to `target`:
/// lateral and upward only. Strictly cheaper targets are rejected here so
/// a downgrade can never slip through the upgrade flow.
pub fn can_upgrade_to_tier(catalog: &TierCatalog, current: TierId, target: TierId) -> bool {
    let current = catalog.tier_by_id(current);
    let target = catalog.tier_by_id(target);
    target.price_usd_monthly >= current.price_usd_monthly
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiers::Tier;
    use assert_matches::assert_matches;

    fn catalog() -> TierCatalog {
        TierCatalog::builtin()
    }

    fn free_tier_catalog(limit: u32) -> TierCatalog {
        TierCatalog::new(vec![
            Tier {
                id: TierId::Explorer,
                name: "Explorer".to_string(),
                price_usd_monthly: 0.0,
                price_usd_yearly: 0.0,
                capsule_limit: limit,
                yield_bonus: 0.0,
                storage_gb: 1,
                verification_votes: limit,
                features: vec![],
                color: String::new(),
                badge: String::new(),
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
                features: vec![],
                color: String::new(),
                badge: String::new(),
            },
        ])
        .expect("test catalog is well-formed")
    }

    fn user(tier_id: TierId, mints: u32, status: SubscriptionStatus) -> UserEntitlementState {
        UserEntitlementState {
            user_id: uuid::Uuid::nil(),
            tier_id,
            mints_this_period: mints,
            period_start: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            gtt_balance: 0.0,
            total_yield_earned: 0.0,
            subscription_status: status,
        }
    }

    // -- Signup --

    #[test]
    fn signup_starts_on_lowest_tier_with_zero_counters() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let state = UserEntitlementState::signup(uuid::Uuid::nil(), &catalog(), today);
        assert_eq!(state.tier_id, TierId::Explorer);
        assert_eq!(state.mints_this_period, 0);
        assert_eq!(state.period_start, today);
        assert_eq!(state.subscription_status, SubscriptionStatus::Active);
    }

    // -- Standing / can_mint --

    #[test]
    fn free_tier_mints_until_limit() {
        let c = catalog();
        assert!(can_mint(&c, &user(TierId::Explorer, 4, SubscriptionStatus::Active)));
        assert!(!can_mint(&c, &user(TierId::Explorer, 5, SubscriptionStatus::Active)));
        assert_matches!(
            standing(&c, &user(TierId::Explorer, 5, SubscriptionStatus::Active)),
            AccountStanding::QuotaExceeded
        );
    }

    #[test]
    fn lapsed_paid_subscription_is_restricted() {
        let c = catalog();
        for status in [SubscriptionStatus::Cancelled, SubscriptionStatus::PastDue] {
            let u = user(TierId::Creator, 0, status);
            assert_matches!(standing(&c, &u), AccountStanding::Restricted);
            assert!(!can_mint(&c, &u));
        }
    }

    #[test]
    fn trialing_paid_subscription_may_mint() {
        let c = catalog();
        assert!(can_mint(&c, &user(TierId::Creator, 0, SubscriptionStatus::Trialing)));
    }

    #[test]
    fn cancelled_free_tier_may_still_mint() {
        // The free tier has no subscription to lapse.
        let c = catalog();
        assert!(can_mint(&c, &user(TierId::Explorer, 0, SubscriptionStatus::Cancelled)));
    }

    // -- Remaining mints --

    #[test]
    fn remaining_mints_is_limit_minus_used() {
        let c = catalog();
        assert_eq!(
            remaining_mints(&c, &user(TierId::Seeker, 10, SubscriptionStatus::Active)),
            15
        );
    }

    #[test]
    fn remaining_mints_never_negative() {
        let c = catalog();
        // Overshoot can happen on a stale snapshot after a tier downgrade.
        assert_eq!(
            remaining_mints(&c, &user(TierId::Explorer, 40, SubscriptionStatus::Active)),
            0
        );
    }

    // -- Period reset --

    #[test]
    fn reset_is_one_calendar_month_out() {
        let u = user(TierId::Explorer, 0, SubscriptionStatus::Active);
        assert_eq!(
            reset_date(&u),
            NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
        );
        let today = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        assert_eq!(days_until_reset(&u, today), 26);
    }

    #[test]
    fn reset_clamps_at_short_month_end() {
        let mut u = user(TierId::Explorer, 0, SubscriptionStatus::Active);
        u.period_start = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(
            reset_date(&u),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }

    #[test]
    fn days_until_reset_floors_at_zero() {
        let u = user(TierId::Explorer, 0, SubscriptionStatus::Active);
        let past_reset = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        assert_eq!(days_until_reset(&u, past_reset), 0);
        assert_eq!(days_until_reset(&u, reset_date(&u)), 0);
    }

    // -- Usage percentage --

    #[test]
    fn usage_percentage_is_monotonic_and_capped() {
        let c = catalog();
        let mut previous = -1.0;
        for mints in [0, 1, 3, 5, 8, 50] {
            let pct = mint_usage_percentage(
                &c,
                &user(TierId::Explorer, mints, SubscriptionStatus::Active),
            );
            assert!(pct >= previous);
            assert!(pct <= 100.0);
            previous = pct;
        }
    }

    #[test]
    fn zero_limit_tier_reports_zero_usage() {
        let c = free_tier_catalog(0);
        let pct = mint_usage_percentage(&c, &user(TierId::Explorer, 3, SubscriptionStatus::Active));
        assert!((pct - 0.0).abs() < f64::EPSILON);
    }

    // -- Upgrade urgency ladder --

    #[test]
    fn urgency_ladder_matches_thresholds() {
        let c = catalog();
        let t = UrgencyThresholds::default();
        // Seeker: limit 25.
        let cases = [
            (25, UpgradeUrgency::High),   // 100%
            (22, UpgradeUrgency::Medium), // 88%
            (20, UpgradeUrgency::Medium), // 80%, boundary inclusive
            (17, UpgradeUrgency::Low),    // 68%
            (15, UpgradeUrgency::Low),    // 60%, boundary inclusive
            (3, UpgradeUrgency::None),    // 12%
        ];
        for (mints, expected) in cases {
            let u = user(TierId::Seeker, mints, SubscriptionStatus::Active);
            assert_eq!(upgrade_urgency(&c, &u, &t), expected, "mints={mints}");
        }
    }

    #[test]
    fn urgency_is_monotonic_in_usage() {
        let c = catalog();
        let t = UrgencyThresholds::default();
        let mut previous = UpgradeUrgency::None;
        for mints in 0..=25 {
            let u = user(TierId::Seeker, mints, SubscriptionStatus::Active);
            let urgency = upgrade_urgency(&c, &u, &t);
            assert!(urgency >= previous, "urgency regressed at mints={mints}");
            previous = urgency;
        }
    }

    #[test]
    fn highest_tier_never_urgent() {
        let c = catalog();
        let t = UrgencyThresholds::default();
        let u = user(TierId::Sovereign, 500, SubscriptionStatus::Active);
        assert_eq!(upgrade_urgency(&c, &u, &t), UpgradeUrgency::None);
    }

    #[test]
    fn invalid_thresholds_rejected() {
        assert_matches!(
            UrgencyThresholds::new(80.0, 60.0, 100.0),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            UrgencyThresholds::new(-1.0, 60.0, 100.0),
            Err(CoreError::Validation(_))
        );
        assert!(UrgencyThresholds::new(60.0, 80.0, 100.0).is_ok());
    }

    // -- Upgrade prompt --

    #[test]
    fn lowest_tier_prompts_past_medium_threshold() {
        let c = catalog();
        let t = UrgencyThresholds::default();
        // Explorer limit 5: 5/5 = 100%, 4/5 = 80% (not strictly above).
        assert!(should_prompt_upgrade(
            &c,
            &user(TierId::Explorer, 5, SubscriptionStatus::Active),
            &t
        ));
        assert!(!should_prompt_upgrade(
            &c,
            &user(TierId::Explorer, 4, SubscriptionStatus::Active),
            &t
        ));
    }

    #[test]
    fn paid_tier_prompts_only_at_full_usage() {
        let c = catalog();
        let t = UrgencyThresholds::default();
        assert!(!should_prompt_upgrade(
            &c,
            &user(TierId::Seeker, 22, SubscriptionStatus::Active),
            &t
        ));
        assert!(should_prompt_upgrade(
            &c,
            &user(TierId::Seeker, 25, SubscriptionStatus::Active),
            &t
        ));
    }

    // -- Upgrade path ordering --

    #[test]
    fn upgrade_allows_upward_and_lateral_only() {
        let c = catalog();
        let ids = [
            TierId::Explorer,
            TierId::Seeker,
            TierId::Creator,
            TierId::Sovereign,
        ];
        for (i, &a) in ids.iter().enumerate() {
            for (j, &b) in ids.iter().enumerate() {
                let allowed = can_upgrade_to_tier(&c, a, b);
                if i < j {
                    assert!(allowed, "{a:?} -> {b:?} should be allowed");
                } else if i > j {
                    assert!(!allowed, "{a:?} -> {b:?} should be rejected");
                } else {
                    // Lateral move (same price) is allowed.
                    assert!(allowed);
                }
            }
        }
    }

    // -- Donation --

    #[test]
    fn donation_cannot_exceed_remaining_quota() {
        let c = catalog();
        let u = user(TierId::Seeker, 20, SubscriptionStatus::Active);
        assert!(can_donate(&c, &u, 5));
        assert!(!can_donate(&c, &u, 6));
        assert!(can_donate(&c, &u, 0));
    }

    // -- End-to-end scenario --

    #[test]
    fn exhausted_free_tier_user_scenario() {
        let c = free_tier_catalog(3);
        let t = UrgencyThresholds::default();
        let u = user(TierId::Explorer, 3, SubscriptionStatus::Active);

        assert!(!can_mint(&c, &u));
        assert_eq!(remaining_mints(&c, &u), 0);
        assert!(should_prompt_upgrade(&c, &u, &t));
        assert_eq!(upgrade_urgency(&c, &u, &t), UpgradeUrgency::High);
    }
}
