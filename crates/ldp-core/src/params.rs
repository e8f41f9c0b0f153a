//! Oracle Parameter Validation
//!
//! Every oracle is built from a validated [`OracleParams`]. Rejecting bad
//! input here keeps the probability algebra in the oracles free of
//! division-by-zero and NaN cases.
//!
//! # Parameter Constraints
//!
//! ## Epsilon (ε)
//! - Must be finite and positive
//! - Smaller = more private, but noisier estimates
//! - Values > 10 are accepted but provide negligible privacy
//!
//! ## Domain size
//! - Number of distinct reportable values, must be at least 1
//!
//! ## User count
//! - Population size used to rescale estimates, must be at least 1

use serde::{Deserialize, Serialize};

use crate::{LdpError, Result};

/// Minimum allowed epsilon (below this the estimator variance explodes)
pub const MIN_EPSILON: f64 = 1e-10;

/// Epsilon above which a warning is logged
pub const MAX_RECOMMENDED_EPSILON: f64 = 10.0;

/// Validate epsilon parameter
pub fn validate_epsilon(epsilon: f64) -> Result<()> {
    if !epsilon.is_finite() {
        return Err(LdpError::Parameter(format!(
            "epsilon must be a finite number, got {}",
            epsilon
        )));
    }

    if epsilon <= 0.0 {
        return Err(LdpError::Parameter(format!(
            "epsilon must be positive, got {}",
            epsilon
        )));
    }

    if epsilon < MIN_EPSILON {
        return Err(LdpError::Parameter(format!(
            "epsilon too small (< {}): estimator denominator vanishes",
            MIN_EPSILON
        )));
    }

    if epsilon > MAX_RECOMMENDED_EPSILON {
        tracing::warn!(
            epsilon,
            "epsilon above {} provides negligible privacy",
            MAX_RECOMMENDED_EPSILON
        );
    }

    Ok(())
}

/// Validate the size of the reporting domain
pub fn validate_domain_size(domain_size: usize) -> Result<()> {
    if domain_size == 0 {
        return Err(LdpError::Parameter(
            "domain_size must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Validate the population size used for rescaling
pub fn validate_user_num(user_num: usize) -> Result<()> {
    if user_num == 0 {
        return Err(LdpError::Parameter("user_num must be positive".to_string()));
    }
    Ok(())
}

/// Fixed construction parameters of one oracle instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OracleParams {
    /// Number of distinct values in the reporting domain
    pub domain_size: usize,
    /// Privacy budget of every report
    pub epsilon: f64,
    /// Population size that final estimates are rescaled to
    pub user_num: usize,
}

impl OracleParams {
    /// Create validated parameters
    pub fn new(domain_size: usize, epsilon: f64, user_num: usize) -> Result<Self> {
        let params = OracleParams {
            domain_size,
            epsilon,
            user_num,
        };
        params.validate()?;
        Ok(params)
    }

    /// Re-check all constraints (fields are public and may have been edited)
    pub fn validate(&self) -> Result<()> {
        validate_domain_size(self.domain_size)?;
        validate_epsilon(self.epsilon)?;
        validate_user_num(self.user_num)?;
        Ok(())
    }
}

/// Privacy levels for epsilon recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivacyLevel {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl PrivacyLevel {
    /// Recommended per-report epsilon for this level
    pub fn epsilon(self) -> f64 {
        match self {
            PrivacyLevel::VeryHigh => 0.1,
            PrivacyLevel::High => 0.5,
            PrivacyLevel::Medium => 1.0,
            PrivacyLevel::Low => 3.0,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PrivacyLevel::VeryHigh => "Very high privacy: needs very large populations",
            PrivacyLevel::High => "High privacy: suitable for most population statistics",
            PrivacyLevel::Medium => "Medium privacy: balance of utility and privacy",
            PrivacyLevel::Low => "Lower privacy: small hash domains, low noise",
        }
    }
}
