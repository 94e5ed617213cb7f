//! Shared type aliases.

/// Platform user identifier.
pub type UserId = uuid::Uuid;

/// GTT token amount. Fees, balances, and yields are denominated in GTT.
pub type Gtt = f64;
