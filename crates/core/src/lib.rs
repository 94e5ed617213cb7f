//! Core domain logic for the Guardian entitlement, quota, and yield engine.
//!
//! Pure types and functions only: the tier catalog, the capsule-type
//! registry with submission validation, per-user entitlement and quota
//! checks, yield computation and tier recommendation, and the
//! deterministic local emotion analyzer. No network or database
//! dependencies; callers pass in snapshots and configuration objects.

pub mod capsule_types;
pub mod emotion;
pub mod entitlement;
pub mod error;
pub mod rewards;
pub mod tiers;
pub mod types;
