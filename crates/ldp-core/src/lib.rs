//! LDP Core - Local Differential Privacy Frequency Oracles
//!
//! Pure Rust implementation of two ε-LDP frequency oracles and the
//! bias-corrected estimator they share.
//!
//! # Features
//!
//! - Optimized Unary Encoding (OUE) with aggregate Binomial perturbation
//! - Optimized Local Hashing (OLH) with per-user salted domain hashing
//! - Closed-form unbiased estimation of per-value counts and probabilities
//! - Parallel OLH matching pass via rayon (`parallel` feature)
//!
//! # Lifecycle
//!
//! One oracle instance serves one reporting group:
//!
//! 1. construct with `(domain_size, epsilon, user_num)`
//! 2. declare the group size with `set_group_user_num`
//! 3. call `perturb` once per user
//! 4. call `aggregate` exactly once
//!
//! # Example
//!
//! ```rust
//! use ldp_core::{FrequencyOracle, OracleConfig, OracleParams, OueOracle};
//!
//! let params = OracleParams::new(4, 1.0, 1000).unwrap();
//! let mut oracle = OueOracle::with_config(params, OracleConfig::default().with_seed(7)).unwrap();
//!
//! let values = [0usize, 1, 1, 3, 2, 1];
//! oracle.set_group_user_num(values.len()).unwrap();
//! oracle.perturb_all(&values).unwrap();
//!
//! let estimate = oracle.aggregate().unwrap();
//! println!("Estimated counts: {:?}", estimate.counts);
//! ```

pub mod config;
pub mod estimator;
pub mod hash;
pub mod olh;
pub mod oracle;
pub mod oue;
pub mod params;

// Re-export commonly used types for convenience
pub use config::OracleConfig;
pub use estimator::{BiasCorrection, FrequencyEstimate};
pub use hash::domain_hash;
pub use olh::OlhOracle;
pub use oracle::{build_oracle, FrequencyOracle, Protocol};
pub use oue::OueOracle;
pub use params::{OracleParams, PrivacyLevel};

/// Result type for oracle operations
pub type Result<T> = std::result::Result<T, LdpError>;

/// Errors that can occur while driving a frequency oracle
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LdpError {
    /// A reported value lies outside `[0, domain_size)`
    #[error("Value {value} outside domain [0, {domain_size})")]
    Domain { value: usize, domain_size: usize },

    /// The oracle lifecycle was violated (early, repeated or excess calls)
    #[error("Invalid oracle state: {0}")]
    State(String),

    /// Construction parameters are unusable
    #[error("Invalid parameter: {0}")]
    Parameter(String),
}
