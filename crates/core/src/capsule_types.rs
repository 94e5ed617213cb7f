//! Capsule-type registry: per-type fee configuration and submission
//! validation.
//!
//! Capsule types are a closed set; external strings cross the boundary
//! exactly once, through [`CapsuleType::parse`]. Fee and field rules are
//! configuration data held by an injected [`CapsuleTypeRegistry`],
//! independent of the tier catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::Gtt;

// ---------------------------------------------------------------------------
// Capsule type identifier
// ---------------------------------------------------------------------------

pub const CAPSULE_STANDARD: &str = "STANDARD";
pub const CAPSULE_LEGAL: &str = "LEGAL";
pub const CAPSULE_FINANCIAL: &str = "FINANCIAL";
pub const CAPSULE_MEDICAL: &str = "MEDICAL";
pub const CAPSULE_WHISTLEBLOWER: &str = "WHISTLEBLOWER";
pub const CAPSULE_LEGACY: &str = "LEGACY";

/// All valid capsule type slugs.
pub const VALID_CAPSULE_TYPES: &[&str] = &[
    CAPSULE_STANDARD,
    CAPSULE_LEGAL,
    CAPSULE_FINANCIAL,
    CAPSULE_MEDICAL,
    CAPSULE_WHISTLEBLOWER,
    CAPSULE_LEGACY,
];

/// Closed set of capsule content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapsuleType {
    Standard,
    Legal,
    Financial,
    Medical,
    Whistleblower,
    Legacy,
}

impl CapsuleType {
    /// Parse an external capsule type slug. Unrecognized slugs are a hard
    /// failure: a submission cannot proceed without a recognized type.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_uppercase().as_str() {
            CAPSULE_STANDARD => Ok(Self::Standard),
            CAPSULE_LEGAL => Ok(Self::Legal),
            CAPSULE_FINANCIAL => Ok(Self::Financial),
            CAPSULE_MEDICAL => Ok(Self::Medical),
            CAPSULE_WHISTLEBLOWER => Ok(Self::Whistleblower),
            CAPSULE_LEGACY => Ok(Self::Legacy),
            _ => Err(CoreError::UnknownCapsuleType(format!(
                "'{s}'. Must be one of: {}",
                VALID_CAPSULE_TYPES.join(", ")
            ))),
        }
    }

    /// The external slug for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => CAPSULE_STANDARD,
            Self::Legal => CAPSULE_LEGAL,
            Self::Financial => CAPSULE_FINANCIAL,
            Self::Medical => CAPSULE_MEDICAL,
            Self::Whistleblower => CAPSULE_WHISTLEBLOWER,
            Self::Legacy => CAPSULE_LEGACY,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-type configuration
// ---------------------------------------------------------------------------

/// Fee and field configuration for one capsule type.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CapsuleTypeConfig {
    pub capsule_type: CapsuleType,
    /// Flat minting fee in GTT.
    #[validate(range(min = 0.0))]
    pub base_fee: Gtt,
    /// Additional fee for premium handling (sealing, verification), in GTT.
    #[validate(range(min = 0.0))]
    pub premium_fee: Gtt,
    pub features: Vec<String>,
    /// Metadata keys that must be present (and non-blank) on submission.
    pub required_fields: Vec<String>,
    /// Metadata keys that are advisory; missing ones produce warnings only.
    pub recommended_fields: Vec<String>,
}

impl CapsuleTypeConfig {
    /// Total minting cost for this type, independent of tier.
    pub fn total_fee(&self) -> Gtt {
        self.base_fee + self.premium_fee
    }
}

// ---------------------------------------------------------------------------
// Validation result
// ---------------------------------------------------------------------------

/// Structured outcome of validating a submission against its type
/// configuration. Returned as a value so callers can render field-level
/// feedback; never raised as an error for a recognized type.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub total_cost: Gtt,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable capsule-type registry, loaded once at process start.
#[derive(Debug, Clone, Serialize)]
pub struct CapsuleTypeRegistry {
    configs: Vec<CapsuleTypeConfig>,
}

impl CapsuleTypeRegistry {
    /// Build a registry from a config list.
    ///
    /// Rules:
    /// - Must not be empty.
    /// - At most one config per capsule type.
    /// - Each row must pass field validation (non-negative fees).
    pub fn new(configs: Vec<CapsuleTypeConfig>) -> Result<Self, CoreError> {
        if configs.is_empty() {
            return Err(CoreError::Validation(
                "Capsule type registry must contain at least one config".to_string(),
            ));
        }
        for config in &configs {
            config.validate().map_err(|e| {
                CoreError::Validation(format!("Capsule type {}: {e}", config.capsule_type.as_str()))
            })?;
        }
        for (i, config) in configs.iter().enumerate() {
            if configs[..i].iter().any(|c| c.capsule_type == config.capsule_type) {
                return Err(CoreError::Validation(format!(
                    "Duplicate capsule type {}",
                    config.capsule_type.as_str()
                )));
            }
        }
        Ok(Self { configs })
    }

    /// All configs in registry order.
    pub fn all(&self) -> &[CapsuleTypeConfig] {
        &self.configs
    }

    /// Configuration for a capsule type. A registry may carry fewer types
    /// than the closed set (e.g. a regional deployment); a type it does not
    /// carry is a hard failure, same as an unrecognized slug.
    pub fn config(&self, capsule_type: CapsuleType) -> Result<&CapsuleTypeConfig, CoreError> {
        self.configs
            .iter()
            .find(|c| c.capsule_type == capsule_type)
            .ok_or_else(|| CoreError::UnknownCapsuleType(capsule_type.as_str().to_string()))
    }

    /// Total minting cost for a capsule type.
    pub fn total_fee(&self, capsule_type: CapsuleType) -> Result<Gtt, CoreError> {
        Ok(self.config(capsule_type)?.total_fee())
    }

    /// Validate submitted metadata against the type's field rules.
    ///
    /// One error per missing (or blank) required field; one warning per
    /// missing recommended field. Warnings never affect `is_valid`. Errors
    /// are only returned for a type this registry does not recognize.
    pub fn validate_submission(
        &self,
        capsule_type: CapsuleType,
        metadata: &HashMap<String, String>,
    ) -> Result<ValidationResult, CoreError> {
        let config = self.config(capsule_type)?;

        let errors: Vec<String> = config
            .required_fields
            .iter()
            .filter(|field| !has_value(metadata, field))
            .map(|field| format!("Missing required field '{field}'"))
            .collect();

        let warnings: Vec<String> = config
            .recommended_fields
            .iter()
            .filter(|field| !has_value(metadata, field))
            .map(|field| format!("Recommended field '{field}' is not set"))
            .collect();

        Ok(ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            total_cost: config.total_fee(),
        })
    }

    /// The production registry.
    pub fn builtin() -> Self {
        let configs = vec![
            CapsuleTypeConfig {
                capsule_type: CapsuleType::Standard,
                base_fee: 25.0,
                premium_fee: 0.0,
                features: vec![
                    "Text and media content".to_string(),
                    "Standard verification".to_string(),
                ],
                required_fields: vec![],
                recommended_fields: vec![],
            },
            CapsuleTypeConfig {
                capsule_type: CapsuleType::Legal,
                base_fee: 50.0,
                premium_fee: 25.0,
                features: vec![
                    "Sworn testimony support".to_string(),
                    "Veritas seal eligibility".to_string(),
                    "Court-evidence formatting".to_string(),
                ],
                required_fields: vec!["jurisdiction".to_string(), "document_type".to_string()],
                recommended_fields: vec!["notarization_ref".to_string()],
            },
            CapsuleTypeConfig {
                capsule_type: CapsuleType::Financial,
                base_fee: 50.0,
                premium_fee: 20.0,
                features: vec![
                    "Disclosure templates".to_string(),
                    "Filing cross-references".to_string(),
                ],
                required_fields: vec!["institution".to_string()],
                recommended_fields: vec!["reporting_period".to_string()],
            },
            CapsuleTypeConfig {
                capsule_type: CapsuleType::Medical,
                base_fee: 40.0,
                premium_fee: 20.0,
                features: vec![
                    "Record redaction".to_string(),
                    "Provider attestation".to_string(),
                ],
                required_fields: vec!["record_date".to_string()],
                recommended_fields: vec!["provider_name".to_string()],
            },
            CapsuleTypeConfig {
                capsule_type: CapsuleType::Whistleblower,
                base_fee: 30.0,
                premium_fee: 45.0,
                features: vec![
                    "Anonymous submission".to_string(),
                    "Source protection".to_string(),
                    "Leak verification".to_string(),
                ],
                required_fields: vec!["disclosure_scope".to_string()],
                recommended_fields: vec!["corroborating_sources".to_string()],
            },
            CapsuleTypeConfig {
                capsule_type: CapsuleType::Legacy,
                base_fee: 25.0,
                premium_fee: 10.0,
                features: vec![
                    "Time-locked release".to_string(),
                    "Beneficiary delivery".to_string(),
                ],
                required_fields: vec![],
                recommended_fields: vec!["beneficiary".to_string()],
            },
        ];
        // The builtin table is well-formed by construction.
        Self { configs }
    }

    /// Load a registry from a JSON document (an array of config rows),
    /// applying the same validation as [`CapsuleTypeRegistry::new`].
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let configs: Vec<CapsuleTypeConfig> = serde_json::from_str(json).map_err(|e| {
            CoreError::Validation(format!("Malformed capsule type registry JSON: {e}"))
        })?;
        Self::new(configs)
    }
}

/// A metadata key counts as present only when its value is non-blank.
fn has_value(metadata: &HashMap<String, String>, field: &str) -> bool {
    metadata.get(field).is_some_and(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
