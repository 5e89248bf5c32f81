//! # Scoring Rules
//!
//! Every constant the trust and verdict calculations use lives here so that
//! deployments can tune them from configuration and tests can assert against
//! named values.

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::models::Role;

/// Reviews scoring at or above this overall mean are a `keep`.
pub const DEFAULT_KEEP_THRESHOLD: f64 = 8.0;
/// Reviews scoring below this overall mean are a `stop`.
pub const DEFAULT_STOP_THRESHOLD: f64 = 4.0;

/// Hard bounds of a persisted trust score.
pub const TRUST_SCORE_MIN: i32 = 0;
pub const TRUST_SCORE_MAX: i32 = 100;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub trust: TrustRules,
    pub verdict: VerdictRules,
}

impl ScoringRules {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.trust.validate()?;
        self.verdict.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustRules {
    /// Score of a user with no activity and no bonuses.
    pub baseline: f64,
    /// Ceiling of the review-volume contribution.
    pub volume_max_points: f64,
    /// Review count at which the volume contribution reaches its ceiling.
    pub volume_saturation_reviews: u32,
    /// Maximum magnitude of the helpful-ratio contribution (it is signed).
    pub reception_max_points: f64,
    /// Votes needed before the helpful ratio counts at full strength.
    pub reception_saturation_votes: u32,
    pub verified_tester_bonus: f64,
    pub verified_tester_role_bonus: f64,
    pub vendor_role_bonus: f64,
    pub admin_role_bonus: f64,
}

impl Default for TrustRules {
    fn default() -> Self {
        Self {
            baseline: 30.0,
            volume_max_points: 25.0,
            volume_saturation_reviews: 50,
            reception_max_points: 25.0,
            reception_saturation_votes: 10,
            verified_tester_bonus: 15.0,
            verified_tester_role_bonus: 5.0,
            vendor_role_bonus: 5.0,
            admin_role_bonus: 10.0,
        }
    }
}

impl TrustRules {
    pub fn role_bonus(&self, role: Role) -> f64 {
        match role {
            Role::User => 0.0,
            Role::VerifiedTester => self.verified_tester_role_bonus,
            Role::Vendor => self.vendor_role_bonus,
            Role::Admin | Role::SuperAdmin => self.admin_role_bonus,
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        let points = [
            ("trust.baseline", self.baseline),
            ("trust.volume_max_points", self.volume_max_points),
            ("trust.reception_max_points", self.reception_max_points),
            ("trust.verified_tester_bonus", self.verified_tester_bonus),
            ("trust.verified_tester_role_bonus", self.verified_tester_role_bonus),
            ("trust.vendor_role_bonus", self.vendor_role_bonus),
            ("trust.admin_role_bonus", self.admin_role_bonus),
        ];
        for (name, value) in points {
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::invalid(format!("{name} must be a non-negative number")));
            }
        }
        if self.volume_saturation_reviews == 0 || self.reception_saturation_votes == 0 {
            return Err(DomainError::invalid("trust saturation points must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictRules {
    pub keep_threshold: f64,
    pub stop_threshold: f64,
    /// Weight of a review whose author has a trust score of 0.
    /// Weight grows linearly to 1.0 at trust 100.
    pub min_review_weight: f64,
    pub expert_review_multiplier: f64,
    pub trusted_role_multiplier: f64,
    /// No single review may weigh more than this.
    pub max_review_weight: f64,
    /// Review count at which the count component of confidence saturates.
    pub confidence_saturation_reviews: u32,
    /// How much a concentrated weight distribution reduces confidence, in [0, 1].
    pub concentration_penalty: f64,
}

impl Default for VerdictRules {
    fn default() -> Self {
        Self {
            keep_threshold: DEFAULT_KEEP_THRESHOLD,
            stop_threshold: DEFAULT_STOP_THRESHOLD,
            min_review_weight: 0.1,
            expert_review_multiplier: 1.5,
            trusted_role_multiplier: 1.25,
            max_review_weight: 2.0,
            confidence_saturation_reviews: 10,
            concentration_penalty: 0.5,
        }
    }
}

impl VerdictRules {
    fn validate(&self) -> Result<(), DomainError> {
        if !(self.stop_threshold <= self.keep_threshold) {
            return Err(DomainError::invalid(
                "verdict.stop_threshold must not exceed verdict.keep_threshold",
            ));
        }
        if !(self.min_review_weight > 0.0 && self.min_review_weight <= 1.0) {
            return Err(DomainError::invalid("verdict.min_review_weight must be in (0, 1]"));
        }
        let multipliers = [
            ("verdict.expert_review_multiplier", self.expert_review_multiplier),
            ("verdict.trusted_role_multiplier", self.trusted_role_multiplier),
            ("verdict.max_review_weight", self.max_review_weight),
        ];
        for (name, value) in multipliers {
            if !value.is_finite() || value <= 0.0 {
                return Err(DomainError::invalid(format!("{name} must be positive")));
            }
        }
        if self.confidence_saturation_reviews == 0 {
            return Err(DomainError::invalid(
                "verdict.confidence_saturation_reviews must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.concentration_penalty) {
            return Err(DomainError::invalid("verdict.concentration_penalty must be in [0, 1]"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ScoringRules::default().validate().is_ok());
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let mut rules = ScoringRules::default();
        rules.verdict.stop_threshold = 9.0;
        assert!(matches!(rules.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn zero_min_weight_is_rejected() {
        let mut rules = ScoringRules::default();
        rules.verdict.min_review_weight = 0.0;
        assert!(rules.validate().is_err());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let rules: ScoringRules =
            serde_json::from_str(r#"{ "verdict": { "keep_threshold": 7.5 } }"#).unwrap();
        assert_eq!(rules.verdict.keep_threshold, 7.5);
        assert_eq!(rules.verdict.stop_threshold, DEFAULT_STOP_THRESHOLD);
        assert_eq!(rules.trust, TrustRules::default());
    }
}
