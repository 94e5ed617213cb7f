#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown capsule type: {0}")]
    UnknownCapsuleType(String),

    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
